//! Gateway configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use sqlgate_core::LegacyWherePolicy;

/// sqlgate HTTP gateway command line arguments.
#[derive(Debug, Parser)]
#[command(name = "sqlgate-gateway")]
#[command(about = "Role-based secure CRUD gateway over MySQL")]
pub struct Args {
    /// Address to listen on for HTTP requests.
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    pub listen: String,

    /// MySQL connection URL.
    #[arg(
        short,
        long,
        env = "DATABASE_URL",
        default_value = "mysql://root@127.0.0.1:3306/app"
    )]
    pub database_url: String,

    /// Minimum number of pooled connections to maintain.
    #[arg(long, default_value_t = 1)]
    pub pool_min_connections: u32,

    /// Maximum number of pooled connections to allow.
    #[arg(long, default_value_t = 10)]
    pub pool_max_connections: u32,

    /// Timeout (ms) when acquiring a pooled connection.
    #[arg(long, default_value_t = 30_000)]
    pub pool_acquire_timeout_ms: u64,

    /// Idle timeout (ms) after which pooled connections can be closed.
    #[arg(long, default_value_t = 300_000)]
    pub pool_idle_timeout_ms: u64,

    /// Per-request timeout (ms) enforced at the gateway.
    #[arg(long, default_value_t = 30_000)]
    pub request_timeout_ms: u64,

    /// JSON policy document. The built-in policy is used when unset.
    #[arg(long, env = "SQLGATE_POLICY_FILE")]
    pub policy_file: Option<PathBuf>,

    /// Handling of raw `where` query parameters (`reject` or `passthrough`).
    #[arg(long, default_value = "reject")]
    pub legacy_where: LegacyWherePolicy,

    /// Include database error details in error responses.
    #[arg(long, env = "SQLGATE_EXPOSE_ERRORS")]
    pub expose_error_details: bool,
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address to listen on for HTTP requests.
    pub listen_addr: String,
    /// MySQL connection URL.
    pub database_url: String,
    /// Minimum number of pooled connections to maintain.
    pub pool_min_connections: u32,
    /// Maximum number of pooled connections to allow.
    pub pool_max_connections: u32,
    /// Timeout when acquiring a pooled connection.
    pub pool_acquire_timeout: Duration,
    /// Idle timeout after which pooled connections can be closed.
    pub pool_idle_timeout: Duration,
    /// Per-request timeout enforced at the gateway.
    pub request_timeout: Duration,
    /// JSON policy document, if any.
    pub policy_file: Option<PathBuf>,
    /// Handling of raw `where` query parameters.
    pub legacy_where: LegacyWherePolicy,
    /// Include database error details in error responses.
    pub expose_error_details: bool,
}

impl From<&Args> for GatewayConfig {
    fn from(args: &Args) -> Self {
        Self {
            listen_addr: args.listen.clone(),
            database_url: args.database_url.clone(),
            pool_min_connections: args.pool_min_connections,
            pool_max_connections: args.pool_max_connections,
            pool_acquire_timeout: Duration::from_millis(args.pool_acquire_timeout_ms),
            pool_idle_timeout: Duration::from_millis(args.pool_idle_timeout_ms),
            request_timeout: Duration::from_millis(args.request_timeout_ms),
            policy_file: args.policy_file.clone(),
            legacy_where: args.legacy_where,
            expose_error_details: args.expose_error_details,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            database_url: "mysql://root@127.0.0.1:3306/app".to_string(),
            pool_min_connections: 1,
            pool_max_connections: 10,
            pool_acquire_timeout: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(300),
            request_timeout: Duration::from_secs(30),
            policy_file: None,
            legacy_where: LegacyWherePolicy::Reject,
            expose_error_details: false,
        }
    }
}

impl GatewayConfig {
    /// Set the raw `where` handling.
    pub fn with_legacy_where(mut self, policy: LegacyWherePolicy) -> Self {
        self.legacy_where = policy;
        self
    }

    /// Include database error details in error responses.
    pub fn with_error_details(mut self, expose: bool) -> Self {
        self.expose_error_details = expose;
        self
    }
}
