//! Engine Module
//!
//! Executes parsed commands against the store.
//!
//! ## Responsibilities
//! - Route each command to the store or answer it directly
//! - Build the reply for every command, including unknown ones

use crate::protocol::{Command, Response, Value};
use crate::store::Store;

/// Command executor
///
/// One engine is created at startup and shared (via `Arc`) by every
/// connection worker. The store it owns does its own locking, so
/// `execute` only needs `&self`.
#[derive(Debug, Default)]
pub struct Engine {
    store: Store,
}

impl Engine {
    /// Create an engine over the given store
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Execute a command and return its reply
    pub fn execute(&self, command: Command) -> Response {
        match command {
            Command::Ping => Response::Value(Value::pong()),
            Command::Echo { message } => Response::Value(Value::BulkString(message)),
            Command::Get { key } => self.get(&key),
            Command::Set { key, value } => {
                self.store.set(key, value);
                Response::ok()
            }
            Command::Unknown { name } => Response::unknown_command(&name),
        }
    }

    /// GET replies with a simple string; a missing key reads as empty.
    fn get(&self, key: &[u8]) -> Response {
        let value = self.store.get(key).unwrap_or_default();
        Response::Value(Value::SimpleString(value))
    }

    /// Get the underlying store
    pub fn store(&self) -> &Store {
        &self.store
    }
}
