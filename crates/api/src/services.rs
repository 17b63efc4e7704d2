//! Service abstractions.
//!
//! Each service is abstracted behind a trait to enable mocking in tests.
//!
//! ## Services
//!
//! - **auth** - Bearer token verification (tokens are issued outside this service)
//!
//! ## Usage in Handlers
//!
//! Handlers normally go through the `AuthUser` extractor instead:
//!
//! ```ignore
//! let identity = state.auth.verify_token(token).await?;
//! ```

mod auth;

pub use auth::{AuthService, PgTokenAuthService};

#[cfg(test)]
pub use auth::{Identity, MockAuthService};
