//! Account services and application wiring

pub mod account_service;
pub mod dto;
pub mod seed;
pub mod server;
pub mod validation;

// Re-export main components
pub use account_service::AccountService;
pub use server::AppState;
