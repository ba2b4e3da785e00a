//! Session data shared by every command in a TOC session
//!
//! A flat property bag of dotted keys under the `toop` root, persisted as a
//! properties-style `key=value` text file. Commands read the TOCS address and
//! session identifiers from it and write back the values they are given.
//!
//! The file syntax is the usual properties file syntax: `#`/`!` comments, `=`,
//! `:` or whitespace between key and value, backslash escapes and lines
//! continued with a trailing backslash. `\uXXXX` escapes are not decoded.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use chrono::Local;
use log::{debug, info};
use crate::error::{ToopError, ToopResult};
use crate::types::is_token;

/// Root every session data key lives under
pub const ROOT_KEY: &str = "toop";

/// Well-known keys, relative to [`ROOT_KEY`]
pub mod keys {
    pub const TOCS_HOST: &str = "tocs_host";
    pub const TOCS_PORT: &str = "tocs_port";
    pub const SERVICE_ID: &str = "service_id";
    pub const SESSION_ID: &str = "session_id";
    pub const SESSION_LIMIT: &str = "session_limit";
    pub const TIME_REMAINING: &str = "time_remaining";
    pub const PRIORITY: &str = "priority";

    pub const INIT_ROTATOR_OPTION: &str = "init.rotator_option";
    pub const INIT_FOCUS_OPTION: &str = "init.focus_option";
    pub const INIT_AG_OPTION: &str = "init.ag_option";

    pub const EXPOSE_SEEING: &str = "expose.seeing";
    pub const EXPOSE_COUNTS: &str = "expose.counts";
    pub const EXPOSE_PHOTOMETRIC: &str = "expose.photometric";
    pub const EXPOSE_SKY_BRIGHTNESS: &str = "expose.sky_brightness";
    pub const EXPOSE_XPIX: &str = "expose.xpix";
    pub const EXPOSE_YPIX: &str = "expose.ypix";

    pub const POSITION_ALTITUDE: &str = "position.altitude";
    pub const POSITION_AZIMUTH: &str = "position.azimuth";
    pub const POSITION_TIME_TO_RISE: &str = "position.time_to_rise";
    pub const POSITION_TIME_TO_SET: &str = "position.time_to_set";
    pub const POSITION_MOON_DISTANCE: &str = "position.moon_distance";
    pub const POSITION_CATEGORY: &str = "position.category";
    pub const POSITION_STATE: &str = "position.state";

    pub const WHEN_TIME: &str = "when.time";
    pub const WHEN_CURRENT_SERVICE: &str = "when.current_service";

    pub const STATUS_VALUE: &str = "status.value";
}

/// Accumulated facts about a TOC session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    properties: BTreeMap<String, String>,
}

impl SessionData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load session data from a properties file
    pub fn load<P: AsRef<Path>>(path: P) -> ToopResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let data = Self::parse(&text)?;
        info!("Loaded {} session data entries from {}", data.len(), path.display());
        Ok(data)
    }

    /// Parse properties text, later lines replace earlier ones
    pub fn parse(text: &str) -> ToopResult<Self> {
        let mut properties = BTreeMap::new();
        let mut lines = text.lines().enumerate();

        while let Some((number, line)) = lines.next() {
            let line = line.trim_start();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let mut logical = line.to_string();
            while is_continued(&logical) {
                logical.pop();
                match lines.next() {
                    Some((_, next)) => logical.push_str(next.trim_start()),
                    None => break,
                }
            }

            let (key, value) = split_property(&logical).ok_or_else(|| {
                ToopError::session_data(format!("line {} has no key: {}", number + 1, logical))
            })?;
            properties.insert(key, value);
        }

        Ok(Self { properties })
    }

    /// Save session data to a properties file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> ToopResult<()> {
        let path = path.as_ref();
        fs::write(path, self.to_properties_string())?;
        info!("Saved {} session data entries to {}", self.len(), path.display());
        Ok(())
    }

    /// Render as properties text with a timestamped header
    pub fn to_properties_string(&self) -> String {
        let mut out = format!(
            "#SessionData:save:{}\n",
            Local::now().format("%a %b %d %H:%M:%S %Z %Y")
        );
        for (key, value) in &self.properties {
            out.push_str(&escape_key(key));
            out.push('=');
            out.push_str(&escape_value(value));
            out.push('\n');
        }
        out
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// All entries with their full dotted keys
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set `toop.<key>` to `value`
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let full_key = full_key(key);
        let value = value.into();
        debug!("Session data {} = {}", full_key, value);
        self.properties.insert(full_key, value);
    }

    /// Get the value of `toop.<key>`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(&full_key(key)).map(String::as_str)
    }

    /// Get the value of `toop.<key>`, failing if it was never set
    pub fn require(&self, key: &str) -> ToopResult<&str> {
        self.get(key).ok_or_else(|| {
            ToopError::session_data(format!("no value for {}", full_key(key)))
        })
    }

    /// Get a value that goes on the request line as one word
    fn require_token(&self, key: &str) -> ToopResult<&str> {
        let value = self.require(key)?;
        if !is_token(value) {
            return Err(ToopError::session_data(format!(
                "{} must be a single non-empty word: {:?}",
                full_key(key),
                value
            )));
        }
        Ok(value)
    }

    pub fn tocs_host(&self) -> ToopResult<&str> {
        self.require_token(keys::TOCS_HOST)
    }

    pub fn set_tocs_host(&mut self, host: impl Into<String>) {
        self.set(keys::TOCS_HOST, host);
    }

    pub fn tocs_port(&self) -> ToopResult<u16> {
        let value = self.require(keys::TOCS_PORT)?;
        value.trim().parse::<u16>().map_err(|_| {
            ToopError::session_data(format!("{} is not a valid TOCS port", value))
        })
    }

    pub fn set_tocs_port(&mut self, port: u16) {
        self.set(keys::TOCS_PORT, port.to_string());
    }

    pub fn service_id(&self) -> ToopResult<&str> {
        self.require_token(keys::SERVICE_ID)
    }

    pub fn set_service_id(&mut self, service_id: impl Into<String>) {
        self.set(keys::SERVICE_ID, service_id);
    }

    pub fn session_id(&self) -> ToopResult<&str> {
        self.require_token(keys::SESSION_ID)
    }

    pub fn set_session_id(&mut self, session_id: impl Into<String>) {
        self.set(keys::SESSION_ID, session_id);
    }

    pub fn init_rotator_option(&self) -> ToopResult<&str> {
        self.require_token(keys::INIT_ROTATOR_OPTION)
    }

    pub fn set_init_rotator_option(&mut self, option: impl Into<String>) {
        self.set(keys::INIT_ROTATOR_OPTION, option);
    }

    pub fn init_focus_option(&self) -> ToopResult<&str> {
        self.require_token(keys::INIT_FOCUS_OPTION)
    }

    pub fn set_init_focus_option(&mut self, option: impl Into<String>) {
        self.set(keys::INIT_FOCUS_OPTION, option);
    }

    pub fn init_ag_option(&self) -> ToopResult<&str> {
        self.require_token(keys::INIT_AG_OPTION)
    }

    pub fn set_init_ag_option(&mut self, option: impl Into<String>) {
        self.set(keys::INIT_AG_OPTION, option);
    }
}

fn full_key(key: &str) -> String {
    format!("{}.{}", ROOT_KEY, key)
}

/// A line ending in an odd number of backslashes continues on the next line
fn is_continued(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Split a logical line at the first unescaped `=`, `:` or whitespace
fn split_property(line: &str) -> Option<(String, String)> {
    let mut escaped = false;
    let mut key_end = line.len();
    for (index, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || c.is_whitespace() {
            key_end = index;
            break;
        }
    }

    let key = unescape(&line[..key_end]);
    if key.is_empty() {
        return None;
    }

    let rest = line[key_end..].trim_start();
    let rest = rest.strip_prefix(['=', ':']).unwrap_or(rest).trim_start();
    Some((key, unescape_value(rest)))
}

fn unescape_char(c: char) -> char {
    match c {
        't' => '\t',
        'n' => '\n',
        'r' => '\r',
        'f' => '\u{c}',
        other => other,
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(unescape_char(next));
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Unescape a value, dropping trailing whitespace that was not escaped
fn unescape_value(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut keep = 0;
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(unescape_char(next));
                keep = out.len();
            }
        } else {
            out.push(c);
            if !c.is_whitespace() {
                keep = out.len();
            }
        }
    }
    out.truncate(keep);
    out
}

fn escape_char(out: &mut String, c: char) {
    match c {
        '\\' | '=' | ':' | '#' | '!' => {
            out.push('\\');
            out.push(c);
        }
        '\t' => out.push_str("\\t"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\u{c}' => out.push_str("\\f"),
        other => out.push(other),
    }
}

fn escape_key(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == ' ' {
            out.push_str("\\ ");
        } else {
            escape_char(&mut out, c);
        }
    }
    out
}

/// Escape a value; spaces only need escaping where trimming would drop them
fn escape_value(s: &str) -> String {
    let first = s.find(|c: char| c != ' ').unwrap_or(s.len());
    let last = s.rfind(|c: char| c != ' ').map_or(0, |i| i + 1);
    let mut out = String::with_capacity(s.len());
    for (index, c) in s.char_indices() {
        if c == ' ' && (index < first || index >= last) {
            out.push_str("\\ ");
        } else {
            escape_char(&mut out, c);
        }
    }
    out
}
