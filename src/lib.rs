//! Rusty Accounts - A user accounts REST service implemented in Rust
//!
//! This library provides JWT credential verification, a role/permission
//! graph, an authorization gate and the warp routes built on top of them.

pub mod auth;
pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod handlers;
pub mod security;
pub mod security_logger;
pub mod storage;

// Re-export main components
pub use config::ServerConfig;
pub use constants::*;
pub use error::{AccountsError, AuthError, Result};
