use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::jwt::JwtConfig;
use crate::interview::lifecycle::InterviewLifecycle;
use crate::interview::report_builder::ReportBuilder;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt: JwtConfig,
    pub lifecycle: Arc<InterviewLifecycle>,
    /// Holds the per-interview build locks, so it must be shared, not rebuilt per request.
    pub reports: Arc<ReportBuilder>,
}
