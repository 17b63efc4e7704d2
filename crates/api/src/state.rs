use std::sync::Arc;

use crate::{
    config::Config,
    quota::{PolicyProvider, RateLimiter},
    repos::Repos,
    services::AuthService,
};

#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Database repositories.
    pub repos: Repos,
    /// Creation quota admission (ledger + policy).
    pub limiter: RateLimiter,
    /// Quota policy, shared with the limiter.
    pub policy: Arc<dyn PolicyProvider>,
    /// Bearer token verification.
    pub auth: Arc<dyn AuthService>,
}
