//! Command definitions
//!
//! Represents commands from clients, parsed out of a decoded request array.

use bytes::Bytes;

use super::Value;
use crate::error::{EmberError, Result};

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ping (health check); arguments are ignored
    Ping,

    /// Echo a message back as a bulk string
    Echo { message: Bytes },

    /// Get a value by key
    Get { key: Bytes },

    /// Set a key-value pair
    Set { key: Bytes, value: Bytes },

    /// A command name the server does not implement (lowercased)
    Unknown { name: String },
}

impl Command {
    /// Interpret a decoded top-level frame as a command
    ///
    /// The frame must be a non-empty array of strings. The command name is
    /// matched case-insensitively. Wrong argument counts are rejected, while
    /// unrecognized names yield `Command::Unknown`.
    pub fn from_value(value: Value) -> Result<Self> {
        let type_name = value.type_name();
        let elements = value.into_array().ok_or_else(|| {
            EmberError::InvalidCommand(format!("expected array, got {}", type_name))
        })?;

        let mut parts = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                Value::SimpleString(part) | Value::BulkString(part) => parts.push(part),
                Value::Array(_) => {
                    return Err(EmberError::InvalidCommand(
                        "command arguments must be strings, got array".to_string(),
                    ))
                }
            }
        }

        let mut parts = parts.into_iter();
        let name = parts
            .next()
            .ok_or_else(|| EmberError::InvalidCommand("empty command array".to_string()))?;
        let name = String::from_utf8_lossy(&name).to_lowercase();
        let args: Vec<Bytes> = parts.collect();

        match name.as_str() {
            "ping" => Ok(Command::Ping),
            "echo" => {
                let [message] = expect_args::<1>(&name, args)?;
                Ok(Command::Echo { message })
            }
            "get" => {
                let [key] = expect_args::<1>(&name, args)?;
                Ok(Command::Get { key })
            }
            "set" => {
                let [key, value] = expect_args::<2>(&name, args)?;
                Ok(Command::Set { key, value })
            }
            _ => Ok(Command::Unknown { name }),
        }
    }

    /// Build the request frame for this command (array of bulk strings)
    pub fn to_value(&self) -> Value {
        let mut parts = vec![Value::bulk(self.name().to_uppercase())];
        match self {
            Command::Ping | Command::Unknown { .. } => {}
            Command::Echo { message } => parts.push(Value::BulkString(message.clone())),
            Command::Get { key } => parts.push(Value::BulkString(key.clone())),
            Command::Set { key, value } => {
                parts.push(Value::BulkString(key.clone()));
                parts.push(Value::BulkString(value.clone()));
            }
        }
        Value::Array(parts)
    }

    /// Lowercase command name
    pub fn name(&self) -> &str {
        match self {
            Command::Ping => "ping",
            Command::Echo { .. } => "echo",
            Command::Get { .. } => "get",
            Command::Set { .. } => "set",
            Command::Unknown { name } => name,
        }
    }
}

fn expect_args<const N: usize>(name: &str, args: Vec<Bytes>) -> Result<[Bytes; N]> {
    <[Bytes; N]>::try_from(args).map_err(|args| {
        EmberError::InvalidCommand(format!(
            "'{}' expects {} argument(s), got {}",
            name,
            N,
            args.len()
        ))
    })
}
