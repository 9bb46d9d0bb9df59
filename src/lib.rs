//! # EmberKV
//!
//! A small in-memory key-value server speaking a subset of RESP:
//! - Streaming codec for simple strings, bulk strings and nested arrays
//! - PING / ECHO / GET / SET command surface
//! - Thread-per-connection TCP server
//! - Lock-guarded shared store
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │              (one worker thread per client)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ bytes
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │               Decoder  →  Value  →  Command                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────▼────────────┐
//!          │         Engine          │──────┐
//!          └────────────┬────────────┘      │
//!                       │ Response          ▼
//!                       ▼            ┌─────────────┐
//!                    Encoder         │    Store    │
//!                       │            │  (RwLock)   │
//!                       ▼            └─────────────┘
//!                     bytes
//! ```
//!
//! ## Codec example
//!
//! ```
//! use emberkv::protocol::{decode, encode, Value};
//!
//! let value = decode(b"*2\r\n$5\r\nhello\r\n$4\r\nmanh\r\n").unwrap();
//! assert_eq!(
//!     value,
//!     Value::array(vec![Value::bulk("hello"), Value::bulk("manh")])
//! );
//! assert_eq!(&encode(&Value::bulk("hello"))[..], b"$5\r\nhello\r\n");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod store;
pub mod engine;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{EmberError, Result};
pub use config::Config;
pub use engine::Engine;
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of EmberKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
