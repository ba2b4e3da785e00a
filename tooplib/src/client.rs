//! Generic command execution
//!
//! One function runs any [`TocCommand`]: render the request line, exchange it
//! over a [`Connection`], parse the reply and extract the typed outputs.

use log::{error, info};
use toopproto::{
    parse_reply, CommandFailure, ReplyOutcome, SessionData, TocCommand, ToopError, ToopResult,
};
use crate::connection::Connection;

/// Outcome of one command exchange
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult<T> {
    /// The request line, when rendering succeeded
    pub request: Option<String>,
    /// The raw reply line, when one was received
    pub reply: Option<String>,
    outcome: Result<T, CommandFailure>,
}

impl<T> CommandResult<T> {
    pub fn is_successful(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn output(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    pub fn failure(&self) -> Option<&CommandFailure> {
        self.outcome.as_ref().err()
    }

    /// `code:message` of a failed command
    pub fn error_string(&self) -> Option<String> {
        self.failure().map(CommandFailure::error_string)
    }

    /// Turn a failure into `ToopError::Command` naming `command`
    pub fn into_result(self, command: &str) -> ToopResult<T> {
        self.outcome.map_err(|failure| ToopError::Command {
            command: command.to_string(),
            failure,
        })
    }
}

/// Run one command against the TOCS named in the session data
pub fn execute<C, K>(connection: &mut C, data: &mut SessionData, command: &K) -> CommandResult<K::Output>
where
    C: Connection + ?Sized,
    K: TocCommand,
{
    let mut result = CommandResult {
        request: None,
        reply: None,
        outcome: Err(CommandFailure::rejected("not run")),
    };

    let request = match command.render(data) {
        Ok(request) => request,
        Err(e) => {
            error!("{} rejected: {}", K::NAME, e);
            result.outcome = Err(CommandFailure::rejected(e.to_string()));
            return result;
        }
    };
    result.request = Some(request.clone());

    let address = data.tocs_host().map(str::to_string).and_then(|host| {
        data.tocs_port().map(|port| (host, port))
    });
    let (host, port) = match address {
        Ok(address) => address,
        Err(e) => {
            error!("{} rejected: {}", K::NAME, e);
            result.outcome = Err(CommandFailure::rejected(e.to_string()));
            return result;
        }
    };

    info!("{} -> {}:{}: {}", K::NAME, host, port, request);
    let reply = match connection.exchange(&host, port, &request) {
        Ok(reply) => reply,
        Err(e) => {
            error!("{} transport failure: {}", K::NAME, e);
            result.outcome = Err(CommandFailure::transport(e.to_string()));
            return result;
        }
    };
    info!("{} <- {}", K::NAME, reply);
    result.reply = Some(reply.clone());

    result.outcome = match parse_reply(&reply) {
        Ok(ReplyOutcome::Ok(values)) => command.extract(&values, data).map_err(|e| {
            error!("{} reply not understood: {}", K::NAME, e);
            CommandFailure::parse(e.to_string())
        }),
        Ok(ReplyOutcome::Error { code, message }) => {
            let failure = CommandFailure::protocol(code, message);
            error!("{} failed: {}", K::NAME, failure);
            Err(failure)
        }
        Err(e) => {
            error!("{} reply not understood: {}", K::NAME, e);
            Err(CommandFailure::parse(e.to_string()))
        }
    };

    if result.is_successful() {
        info!("{} succeeded", K::NAME);
    }
    result
}
