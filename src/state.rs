use std::sync::Arc;

use crate::config::Config;
use crate::db::SubmissionStore;
use crate::rate_limit::RateLimiter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub store: Arc<dyn SubmissionStore>,
    pub config: Config,
    pub limiter: RateLimiter,
}
