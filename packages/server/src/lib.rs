//! OrgTree HTTP server
//!
//! REST surface over [`orgtree_core::NodeService`]. The binary in
//! `src/main.rs` resolves a [`ServerConfig`] from the environment and hands it
//! to [`http::start_server`].

pub mod config;
pub mod http;

pub use config::{ConfigError, ServerConfig};
