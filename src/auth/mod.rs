//! Authentication and authorization module

pub mod authenticator;
pub mod gate;
pub mod password;
pub mod role;
pub mod token;
pub mod user;

// Re-export main components
pub use authenticator::Authenticator;
pub use gate::{authorize, Decision, Denial, Requirement};
pub use role::{Permission, Role};
pub use token::{verify, Claims, TokenManager};
pub use user::User;
