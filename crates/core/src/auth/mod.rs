//! Operator authentication.

mod session;

pub use session::{hash_password, AuthConfig, AuthError, AuthService, Session};
