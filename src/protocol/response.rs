//! Response definitions
//!
//! Represents replies sent to clients.

use super::Value;

/// A reply unit written back for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A regular frame (`+...`, `$...`, `*...`)
    Value(Value),

    /// An error line (`-<message>`); the message carries its own prefix
    Error(String),
}

impl Response {
    /// `+OK`
    pub fn ok() -> Self {
        Response::Value(Value::ok())
    }

    /// Reply for a command name the server does not implement
    pub fn unknown_command(name: &str) -> Self {
        Response::Error(format!("ERR unknown command '{}'", name))
    }

    /// True for error replies
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }
}
