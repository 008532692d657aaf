//! An async client for the NotLocalStorage remote key-value service
//!
//! NotLocalStorage exposes two operations over HTTP: `load` retrieves the
//! value stored under an index key, and `save` stores a value under one.
//! This crate turns each logical operation into exactly one request against
//! the service's templated endpoint and hands the response body back
//! verbatim. There is no local persistence, no caching and no retry logic.
//!
//! The service identifies callers by an API key and an application key that
//! travel as URL path segments, not as headers. That is the wire contract of
//! the service itself; it is not a secure transport pattern and should not
//! be reused for anything sensitive.
//!
//! # Features
//! - Async/await API using tokio
//! - Per-client configuration, no process-global mutable state
//! - Credential resolution from the environment (`NLS_API_KEY`, `NLS_APP_KEY`)
//! - Opaque binary payloads with JSON convenience helpers
//! - Built-in timeout support
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use nls_client::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), nls_client::Error> {
//!     let client = Client::new("your-api-key", "your-app-key")?;
//!
//!     // Store a value
//!     client.save("user-preferences", r#"{"theme":"dark"}"#).await?;
//!
//!     // Retrieve it
//!     let value = client.load("user-preferences").await?;
//!     println!("Loaded: {:?}", value);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod client;
pub mod error;

pub use client::{Client, ClientConfig, API_KEY_VAR, APP_KEY_VAR, DEFAULT_ENDPOINT};
pub use error::{Error, Result};
