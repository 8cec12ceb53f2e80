//! Curlish is a crate aiming at providing a simple, blocking way to issue
//! HTTP requests and read back fully parsed responses.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use curlish::{ClientBuilder, Error};
//!
//! # fn main() -> Result<(), Error> {
//! let mut client = ClientBuilder::new()
//!     .header("Content-Type", "application/json")
//!     .build()?;
//!
//! let response = client.post("https://httpbin.org/post", [("name", "curlish")])?;
//! println!("{} {}", response.status_code(), response.status_text());
//! println!("{}", response);
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! The curlish crate is organized into several modules:
//!
//! - [`client`] - The [`Client`] orchestrator, its builder and configuration
//! - [`content`] - Request payloads, body negotiation and query building
//! - [`cookie`] - `Set-Cookie` parsing and the cookie-jar file
//! - [`error`] - Centralized error handling with the `Error` enum
//! - [`response`] - Raw response parsing and the [`Response`] type
//! - [`store`] - The ordered key/value store behind headers and options
//! - [`transport`] - The transport traits, typed options and the reqwest transport

pub mod client;
pub mod content;
pub mod cookie;
pub mod error;
pub mod response;
pub mod store;
pub mod transport;

pub use client::{Client, ClientBuilder, ClientConfig, RequestSnapshot};
pub use content::{Fields, Payload, RequestBody};
pub use cookie::{Cookie, CookieJar};
pub use error::{Error, Result};
pub use response::{parse_response, Response, ResponseHeader};
pub use store::{HeaderStore, KeyValueStore};
pub use transport::{
    AuthScheme, Diagnostics, OptionKey, ProxyKind, ReqwestTransport, Session, Transport,
    TransportFailure, TransportOption,
};
