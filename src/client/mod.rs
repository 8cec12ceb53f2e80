//! The client: request orchestration, its builder and configuration.
//!
//! # Overview
//!
//! - `client` - the [`Client`] orchestrator with the verb methods
//! - `builder` - [`ClientBuilder`] for configuring a client up front
//! - `config` - [`ClientConfig`] and its defaults
//! - `snapshot` - [`RequestSnapshot`], the frozen record of the last call
//!
//! # Examples
//!
//! ```rust,no_run
//! use curlish::ClientBuilder;
//!
//! # fn example() -> curlish::Result<()> {
//! let mut client = ClientBuilder::new()
//!     .header("Content-Type", "application/json")
//!     .build()?;
//!
//! let response = client.post("https://httpbin.org/post", [("name", "curlish")])?;
//! println!("{}", response);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod client;
pub mod config;
pub mod snapshot;

pub use builder::ClientBuilder;
pub use client::Client;
pub use config::{ClientConfig, DEFAULT_USER_AGENT};
pub use snapshot::RequestSnapshot;
