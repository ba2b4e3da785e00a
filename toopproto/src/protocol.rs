//! Reply line parsing for the TOC protocol
//!
//! Every request gets exactly one reply line back from the TOCS, either
//! `OK key=value, key=value, ...` or `ERROR <CODE> <message>`. Values are not
//! escaped on the wire, so they can never contain `,` or `=`.

use std::collections::HashMap;
use std::str::FromStr;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use crate::error::{ToopError, ToopResult};

/// Keyword opening a successful reply
pub const OK_KEYWORD: &str = "OK";

/// Keyword opening a failed reply
pub const ERROR_KEYWORD: &str = "ERROR";

/// Separator between keyword/value pairs in an OK reply
pub const PAIR_SEPARATOR: char = ',';

/// Outcome of parsing one reply line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyOutcome {
    Ok(ReplyValues),
    Error {
        code: Option<String>,
        message: String,
    },
}

impl ReplyOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ReplyOutcome::Ok(_))
    }

    pub fn values(&self) -> Option<&ReplyValues> {
        match self {
            ReplyOutcome::Ok(values) => Some(values),
            ReplyOutcome::Error { .. } => None,
        }
    }
}

/// Keyword/value pairs from an OK reply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyValues {
    values: HashMap<String, String>,
}

impl ReplyValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later inserts of the same keyword replace earlier ones
    pub fn insert(&mut self, keyword: impl Into<String>, value: impl Into<String>) {
        self.values.insert(keyword.into(), value.into());
    }

    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.values.get(keyword).map(String::as_str)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.values.contains_key(keyword)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Get a value that the reply must contain
    pub fn require(&self, keyword: &str) -> ToopResult<&str> {
        self.get(keyword)
            .ok_or_else(|| ToopError::parse(format!("reply has no value for keyword {}", keyword)))
    }

    /// Get a value that must parse as an integer
    pub fn require_int(&self, keyword: &str) -> ToopResult<i32> {
        self.require_parsed(keyword, "integer")
    }

    /// Get a value that must parse as a double
    pub fn require_double(&self, keyword: &str) -> ToopResult<f64> {
        self.require_parsed(keyword, "double")
    }

    fn require_parsed<T: FromStr>(&self, keyword: &str, what: &str) -> ToopResult<T> {
        let value = self.require(keyword)?;
        value.trim().parse::<T>().map_err(|_| {
            ToopError::parse(format!(
                "value {} for keyword {} is not a valid {}",
                value, keyword, what
            ))
        })
    }

    /// Collect `<prefix>1`, `<prefix>2`, ... until the first missing index
    pub fn numbered(&self, prefix: &str) -> Vec<String> {
        (1..)
            .map(|index| self.get(&format!("{}{}", prefix, index)))
            .take_while(Option::is_some)
            .flatten()
            .map(str::to_string)
            .collect()
    }
}

impl FromIterator<(String, String)> for ReplyValues {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Return what follows `keyword` if the line opens with it as a whole word
fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix(' ')
    }
}

/// Parse one reply line, already stripped of its line terminator
pub fn parse_reply(line: &str) -> ToopResult<ReplyOutcome> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ToopError::MalformedReply("empty reply from TOCS".to_string()));
    }

    if let Some(rest) = strip_keyword(line, ERROR_KEYWORD) {
        return Ok(parse_error(rest));
    }

    if let Some(rest) = strip_keyword(line, OK_KEYWORD) {
        return Ok(ReplyOutcome::Ok(parse_values(rest)));
    }

    Err(ToopError::MalformedReply(format!(
        "reply is neither {} nor {}: {}",
        OK_KEYWORD, ERROR_KEYWORD, line
    )))
}

fn parse_error(rest: &str) -> ReplyOutcome {
    match rest.split_once(' ') {
        Some((code, message)) => ReplyOutcome::Error {
            code: Some(code.to_string()),
            message: message.to_string(),
        },
        None => ReplyOutcome::Error {
            code: None,
            message: rest.to_string(),
        },
    }
}

fn parse_values(rest: &str) -> ReplyValues {
    let mut values = ReplyValues::new();

    for token in rest.split(PAIR_SEPARATOR).map(str::trim) {
        if token.is_empty() {
            continue;
        }
        match token.split_once('=') {
            Some((keyword, value)) => {
                debug!("Reply keyword [{}] has value [{}]", keyword, value);
                values.insert(keyword, value);
            }
            None => warn!("Ignoring reply token [{}] with no keyword/value separator", token),
        }
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_values(line: &str) -> ReplyValues {
        match parse_reply(line).unwrap() {
            ReplyOutcome::Ok(values) => values,
            other => panic!("expected OK reply, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_ok_pairs() {
        let values = ok_values("OK sessionID=abc123, sessionLimit=3600, priority=2");
        assert_eq!(values.len(), 3);
        assert_eq!(values.get("sessionID"), Some("abc123"));
        assert_eq!(values.get("sessionLimit"), Some("3600"));
        assert_eq!(values.get("priority"), Some("2"));
    }

    #[test]
    fn test_parse_duplicate_keyword_last_wins() {
        let values = ok_values("OK alt=10.5, alt=20.25");
        assert_eq!(values.len(), 1);
        assert_eq!(values.get("alt"), Some("20.25"));
    }

    #[test]
    fn test_parse_empty_ok() {
        assert!(ok_values("OK ").is_empty());
        assert!(ok_values("OK").is_empty());
    }

    #[test]
    fn test_parse_ignores_tokens_without_equals() {
        let values = ok_values("OK done, file1=a.fits,, junk ,file2=b.fits");
        assert_eq!(values.len(), 2);
        assert_eq!(values.get("file1"), Some("a.fits"));
        assert_eq!(values.get("file2"), Some("b.fits"));
    }

    #[test]
    fn test_parse_value_split_at_first_equals() {
        let values = ok_values("OK expr=a=b");
        assert_eq!(values.get("expr"), Some("a=b"));
    }

    #[test]
    fn test_parse_error_with_code() {
        let outcome = parse_reply("ERROR ABORTED Code=607001, message=Overridden").unwrap();
        assert_eq!(
            outcome,
            ReplyOutcome::Error {
                code: Some("ABORTED".to_string()),
                message: "Code=607001, message=Overridden".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_error_message_only() {
        let outcome = parse_reply("ERROR TIMEOUT").unwrap();
        assert_eq!(
            outcome,
            ReplyOutcome::Error {
                code: None,
                message: "TIMEOUT".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_reply(""), Err(ToopError::MalformedReply(_))));
        assert!(matches!(parse_reply("   "), Err(ToopError::MalformedReply(_))));
        assert!(matches!(parse_reply("HELLO there"), Err(ToopError::MalformedReply(_))));
        assert!(matches!(parse_reply("OKAY fine=1"), Err(ToopError::MalformedReply(_))));
        assert!(matches!(parse_reply("ERRORS x y"), Err(ToopError::MalformedReply(_))));
    }

    #[test]
    fn test_numbered_values() {
        let values = ok_values("OK file1=a.fits, file2=b.fits, file4=d.fits");
        assert_eq!(values.numbered("file"), vec!["a.fits", "b.fits"]);

        let values = ok_values("OK seeing=1.2");
        assert!(values.numbered("file").is_empty());
    }

    #[test]
    fn test_typed_values() {
        let values = ok_values("OK counts=1234, seeing=1.25, bad=x1");
        assert_eq!(values.require_int("counts").unwrap(), 1234);
        assert_eq!(values.require_double("seeing").unwrap(), 1.25);
        assert!(matches!(values.require_int("bad"), Err(ToopError::Parse(_))));
        assert!(matches!(values.require_double("missing"), Err(ToopError::Parse(_))));
    }
}
