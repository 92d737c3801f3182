use std::sync::Arc;

use crystaltides_auth::{IdentityVerifier, JwtIdentityVerifier};
use crystaltides_config::{
    AuthConfig, CorsConfig, IntegrationsConfig, RateLimitConfig, ServerConfig,
};
use crystaltides_db::{CommandLogSource, Database, MySqlCommandLogs, init_mysql_pool, init_pg_pool};
use tracing::{info, warn};

use crate::middleware::rate_limit::RateLimiters;
use crate::utils::discord::DiscordNotifier;
use crate::utils::translate::Translator;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub command_logs: Option<Arc<dyn CommandLogSource>>,
    pub auth_config: AuthConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub integrations: IntegrationsConfig,
    pub server_config: ServerConfig,
    pub discord: DiscordNotifier,
    pub translator: Translator,
    pub rate_limiters: RateLimiters,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("db", &self.db)
            .field("command_logs", &self.command_logs.is_some())
            .field("cors_config", &self.cors_config)
            .field("rate_limit_config", &self.rate_limit_config)
            .field("server_config", &self.server_config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// State with default configuration and no command log source.
    pub fn new(db: Database, auth_config: AuthConfig) -> Self {
        let integrations = IntegrationsConfig::default();
        let rate_limit_config = RateLimitConfig::default();
        let client = reqwest::Client::new();

        Self {
            db,
            verifier: Arc::new(JwtIdentityVerifier::new(&auth_config)),
            command_logs: None,
            auth_config,
            cors_config: CorsConfig::default(),
            rate_limiters: RateLimiters::from_config(&rate_limit_config),
            rate_limit_config,
            discord: DiscordNotifier::new(client.clone(), &integrations),
            translator: Translator::new(client, &integrations),
            integrations,
            server_config: ServerConfig::default(),
        }
    }

    #[must_use]
    pub fn with_rate_limits(mut self, config: RateLimitConfig) -> Self {
        self.rate_limiters = RateLimiters::from_config(&config);
        self.rate_limit_config = config;
        self
    }

    #[must_use]
    pub fn with_integrations(mut self, config: IntegrationsConfig) -> Self {
        let client = reqwest::Client::new();
        self.discord = DiscordNotifier::new(client.clone(), &config);
        self.translator = Translator::new(client, &config);
        self.integrations = config;
        self
    }

    #[must_use]
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.cors_config = config;
        self
    }

    #[must_use]
    pub fn with_server(mut self, config: ServerConfig) -> Self {
        self.server_config = config;
        self
    }

    #[must_use]
    pub fn with_verifier(mut self, verifier: Arc<dyn IdentityVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    #[must_use]
    pub fn with_command_logs(mut self, source: Arc<dyn CommandLogSource>) -> Self {
        self.command_logs = Some(source);
        self
    }
}

/// Builds the state from the environment and connects to Postgres.
pub async fn init_app_state() -> anyhow::Result<AppState> {
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let pool = init_pg_pool(&database_url).await?;
    info!("Connected to Postgres");

    let auth_config = AuthConfig::from_env();
    if !auth_config.is_configured() {
        warn!("SUPABASE_JWT_SECRET is not set; every authenticated route will answer 403");
    }
    if !auth_config.admin_tokens_enabled() {
        warn!("ADMIN_JWT_SECRET is not set; two-factor step-up tokens cannot be issued");
    }

    let integrations = IntegrationsConfig::from_env();
    if integrations.kofi_verification_token.is_none() {
        warn!("KOFI_VERIFICATION_TOKEN is not set; Ko-fi events will be accepted unverified");
    }

    let mut state = AppState::new(Database::postgres(pool), auth_config)
        .with_rate_limits(RateLimitConfig::from_env())
        .with_integrations(integrations)
        .with_cors(CorsConfig::from_env())
        .with_server(ServerConfig::from_env());

    match std::env::var("COREPROTECT_DATABASE_URL") {
        Ok(url) if !url.is_empty() => {
            let pool = init_mysql_pool(&url)?;
            state = state.with_command_logs(Arc::new(MySqlCommandLogs::new(pool)));
            info!("CoreProtect command log source configured");
        }
        _ => warn!("COREPROTECT_DATABASE_URL is not set; command log routes will answer 503"),
    }

    Ok(state)
}
