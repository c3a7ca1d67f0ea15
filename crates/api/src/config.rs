use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long background jobs get to finish after a shutdown signal.
    pub shutdown_timeout_secs: u64,
    /// JWT session token configuration.
    pub jwt: JwtConfig,
    /// Billing background job settings.
    pub billing: BillingConfig,
}

/// Settings for the periodic billing jobs.
#[derive(Debug, Clone, Copy)]
pub struct BillingConfig {
    /// Days after `period_end` before a pending period becomes overdue.
    pub overdue_after_days: i64,
    /// Seconds between background billing passes.
    pub job_interval_secs: u64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            overdue_after_days: tally_core::billing::DEFAULT_OVERDUE_AFTER_DAYS,
            job_interval_secs: 3600,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                    |
    /// |-----------------------------|----------------------------|
    /// | `HOST`                      | `0.0.0.0`                  |
    /// | `PORT`                      | `3000`                     |
    /// | `CORS_ORIGINS`              | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`     | `30`                       |
    /// | `OVERDUE_AFTER_DAYS`        | `30`                       |
    /// | `BILLING_JOB_INTERVAL_SECS` | `3600`                     |
    ///
    /// JWT settings are documented on [`JwtConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = env_parse("PORT", 3000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_parse("REQUEST_TIMEOUT_SECS", 30);
        let shutdown_timeout_secs: u64 = env_parse("SHUTDOWN_TIMEOUT_SECS", 30);

        let defaults = BillingConfig::default();
        let billing = BillingConfig {
            overdue_after_days: env_parse("OVERDUE_AFTER_DAYS", defaults.overdue_after_days),
            job_interval_secs: env_parse("BILLING_JOB_INTERVAL_SECS", defaults.job_interval_secs),
        };
        assert!(
            billing.overdue_after_days >= 0,
            "OVERDUE_AFTER_DAYS must not be negative"
        );
        assert!(
            tally_core::billing::overdue_cutoff(
                chrono::Utc::now().date_naive(),
                billing.overdue_after_days
            )
            .is_ok(),
            "OVERDUE_AFTER_DAYS is out of range"
        );
        assert!(
            billing.job_interval_secs > 0,
            "BILLING_JOB_INTERVAL_SECS must be positive"
        );

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt,
            billing,
        }
    }
}

/// Read and parse an env var, falling back to `default` when unset.
///
/// # Panics
///
/// Panics if the variable is set but does not parse.
fn env_parse<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{name} must be a valid value: {e}")),
        Err(_) => default,
    }
}
