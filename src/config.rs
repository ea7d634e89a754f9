use std::env;

/// Fallback key used when running locally without `API_KEY` set.
pub const LOCAL_API_KEY: &str = "local-dev-api-key";

/// Listen address used when `BIND_ADDR` is not set.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// AppConfig
///
/// Holds the application's configuration. Loaded once at startup and never mutated,
/// it is pulled into handlers and extractors through `FromRef` on the shared `AppState`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` selects the in-memory article store (local only).
    pub db_url: Option<String>,
    // Static secret compared against the `api_key` query parameter on mutating requests.
    pub api_key: String,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
    // Runtime environment marker. Controls log format and which secrets are mandatory.
    pub env: Env,
}

/// Env
///
/// Runtime context. Production demands every secret explicitly; Local falls back
/// to development defaults.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Non-panicking configuration for tests: in-memory store, fixed API key.
    fn default() -> Self {
        Self {
            db_url: None,
            api_key: "test-api-key".to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables, failing fast on anything
    /// production cannot run without.
    ///
    /// # Panics
    /// Panics in `Env::Production` when `API_KEY` or the database URL is missing.
    pub fn load() -> Self {
        let env = resolve_env();

        let api_key = match env {
            Env::Production => non_empty_var("API_KEY")
                .expect("FATAL: API_KEY must be set in production."),
            Env::Local => non_empty_var("API_KEY").unwrap_or_else(|| LOCAL_API_KEY.to_string()),
        };

        let db_url = match env {
            Env::Production => Some(
                non_empty_var("PROD_DATABASE_URL")
                    .or_else(|| non_empty_var("DATABASE_URL"))
                    .expect("FATAL: PROD_DATABASE_URL or DATABASE_URL required in prod"),
            ),
            Env::Local => non_empty_var("DEV_DATABASE_URL").or_else(|| non_empty_var("DATABASE_URL")),
        };

        let bind_addr = non_empty_var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        Self {
            db_url,
            api_key,
            bind_addr,
            env,
        }
    }
}

/// `APP_ENV=production` or the legacy `PROD=true` flag select production.
fn resolve_env() -> Env {
    let app_env = env::var("APP_ENV").unwrap_or_default();
    let prod_flag = env::var("PROD").unwrap_or_default();

    if app_env.eq_ignore_ascii_case("production") || prod_flag.eq_ignore_ascii_case("true") {
        Env::Production
    } else {
        Env::Local
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
