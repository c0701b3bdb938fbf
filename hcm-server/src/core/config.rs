use chrono::NaiveTime;
use chrono_tz::Tz;

use crate::auth::JwtConfig;
use crate::core::{Result, ServerError};

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | HTTP_PORT | 3000 | HTTP listen port |
/// | DATABASE_URL | sqlite:hcm.db | SQLite database URL |
/// | ENVIRONMENT | development | development / staging / production |
/// | TIMEZONE | Asia/Kolkata | business timezone for dates and lateness |
/// | LATE_THRESHOLD | 09:15 | check-ins after this are late |
/// | STANDARD_WORK_HOURS | 8 | hours beyond this count as overtime |
/// | PAYROLL_TAX_RATE | 0.11 | flat tax on taxable income |
/// | PAYROLL_CURRENCY | INR | default payroll currency |
/// | PAYROLL_COUNTRY | India | default payroll country |
/// | CORS_ORIGINS | (permissive) | comma separated allowed origins |
/// | RESET_TOKEN_MINUTES | 60 | password reset token lifetime |
/// | LOGIN_RATE_LIMIT | 5 | login attempts per IP per minute |
///
/// JWT settings (`JWT_SECRET`, `JWT_EXPIRATION_MINUTES`, `JWT_ISSUER`,
/// `JWT_AUDIENCE`) are read by [`JwtConfig::from_env`].
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub database_url: String,
    /// development | staging | production
    pub environment: String,
    pub timezone: Tz,
    pub late_threshold: NaiveTime,
    pub standard_work_hours: f64,
    pub payroll_tax_rate: f64,
    pub payroll_currency: String,
    pub payroll_country: String,
    /// `None` means any origin
    pub cors_origins: Option<Vec<String>>,
    pub jwt: JwtConfig,
    pub reset_token_minutes: i64,
    pub login_rate_limit: u32,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to defaults. Malformed timezone or
    /// threshold values and a missing `JWT_SECRET` outside development
    /// are configuration errors.
    pub fn from_env() -> Result<Self> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let timezone: Tz = std::env::var("TIMEZONE")
            .unwrap_or_else(|_| "Asia/Kolkata".into())
            .parse()
            .map_err(|e| ServerError::Config(format!("Invalid TIMEZONE: {e}")))?;

        let late_threshold = parse_hhmm(
            &std::env::var("LATE_THRESHOLD").unwrap_or_else(|_| "09:15".into()),
        )
        .ok_or_else(|| ServerError::Config("LATE_THRESHOLD must be HH:MM".into()))?;

        let payroll_tax_rate: f64 = std::env::var("PAYROLL_TAX_RATE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.11);
        if !(0.0..=1.0).contains(&payroll_tax_rate) {
            return Err(ServerError::Config(
                "PAYROLL_TAX_RATE must be between 0 and 1".into(),
            ));
        }

        let cors_origins = std::env::var("CORS_ORIGINS")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            });

        let jwt = JwtConfig::from_env(environment == "development")
            .map_err(|e| ServerError::Config(e.to_string()))?;

        Ok(Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_url: std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:hcm.db".into()),
            environment,
            timezone,
            late_threshold,
            standard_work_hours: std::env::var("STANDARD_WORK_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8.0),
            payroll_tax_rate,
            payroll_currency: std::env::var("PAYROLL_CURRENCY").unwrap_or_else(|_| "INR".into()),
            payroll_country: std::env::var("PAYROLL_COUNTRY").unwrap_or_else(|_| "India".into()),
            cors_origins,
            jwt,
            reset_token_minutes: std::env::var("RESET_TOKEN_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            login_rate_limit: std::env::var("LOGIN_RATE_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
        })
    }

    /// In-memory configuration for tests; independent of the process environment
    pub fn for_tests() -> Self {
        Self {
            http_port: 0,
            database_url: "sqlite::memory:".into(),
            environment: "test".into(),
            timezone: chrono_tz::Asia::Kolkata,
            late_threshold: NaiveTime::from_hms_opt(9, 15, 0).unwrap_or(NaiveTime::MIN),
            standard_work_hours: 8.0,
            payroll_tax_rate: 0.11,
            payroll_currency: "INR".into(),
            payroll_country: "India".into(),
            cors_origins: None,
            jwt: JwtConfig {
                secret: "test-secret-key-that-is-at-least-32-characters".into(),
                expiration_minutes: 60,
                issuer: "hcm-server".into(),
                audience: "hcm-clients".into(),
            },
            reset_token_minutes: 60,
            login_rate_limit: 1000,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

/// Parse `HH:MM` into a time of day
pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(parse_hhmm("09:15"), NaiveTime::from_hms_opt(9, 15, 0));
        assert_eq!(parse_hhmm(" 18:00 "), NaiveTime::from_hms_opt(18, 0, 0));
        assert!(parse_hhmm("9.15").is_none());
        assert!(parse_hhmm("25:00").is_none());
    }

    #[test]
    fn test_for_tests_config() {
        let config = Config::for_tests();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert!(config.jwt.secret.len() >= 32);
        assert!(!config.is_production());
        assert_eq!(config.payroll_tax_rate, 0.11);
    }
}
