use std::sync::Arc;

use sqlx::SqlitePool;

use crate::audit::AuditStorage;
use crate::auth::JwtService;
use crate::auth::rate_limit::RateLimiter;
use crate::core::{Config, Result};
use crate::db::DbService;
use crate::payroll::PayrollPolicy;

/// Server state - shared references to every service
///
/// Cloning is cheap: the pool and services are reference counted.
///
/// | Field | Meaning |
/// |-------|---------|
/// | config | immutable configuration |
/// | pool | SQLite connection pool |
/// | jwt_service | token issue/validation |
/// | audit | hash-chained audit log |
/// | rate_limiter | login attempts per IP |
/// | payroll_policy | tax rate and default salary structure |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub jwt_service: Arc<JwtService>,
    pub audit: AuditStorage,
    pub rate_limiter: RateLimiter,
    pub payroll_policy: Arc<PayrollPolicy>,
}

impl ServerState {
    /// Build state around an existing pool (migrations already applied)
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let audit = AuditStorage::new(pool.clone());
        let payroll_policy = Arc::new(PayrollPolicy::from_config(&config));

        Self {
            config,
            pool,
            jwt_service,
            audit,
            rate_limiter: RateLimiter::new(),
            payroll_policy,
        }
    }

    /// Open the database, apply migrations and wire the services
    pub async fn initialize(config: &Config) -> Result<Self> {
        let db = DbService::new(&config.database_url).await?;
        Ok(Self::new(config.clone(), db.pool))
    }

    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// Today's date in the business timezone
    pub fn today(&self) -> chrono::NaiveDate {
        chrono::Utc::now()
            .with_timezone(&self.config.timezone)
            .date_naive()
    }
}
