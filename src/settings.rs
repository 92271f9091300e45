use crate::utils::crypto::generate_secret;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScoutSettings {
    pub application: ApplicationSettings,
    pub reddit: RedditSettings,
    pub storage: StorageSettings,
    pub workflow: WorkflowSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Public origin of the front end; the OAuth redirect URI is built from it
    pub redirect_base_url: String,
    pub cors_origins: String,
    /// Upper bound for `/auth/reddit/wait`
    pub auth_wait_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditSettings {
    // Direct values (can be overridden by environment variables)
    pub client_id: Option<String>,
    pub client_secret: Option<String>,

    // Environment variable names for overrides
    pub client_id_env: Option<String>,
    pub client_secret_env: Option<String>,

    /// Identity provider base, hosting `/authorize` and `/access_token`
    pub auth_base_url: String,
    /// Resource API base for bearer-authenticated calls
    pub api_base_url: String,
    pub callback_path: String,
    pub user_agent: String,
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Encrypted token file; empty keeps tokens in memory only
    pub token_file: String,
    pub storage_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WorkflowSettings {
    pub search_webhook_url: Option<String>,
    pub poster_webhook_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            redirect_base_url: "http://localhost:5173".to_string(),
            cors_origins: "http://localhost:5173".to_string(),
            auth_wait_timeout_seconds: 300,
        }
    }
}

impl Default for RedditSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            client_id_env: Some("REDDIT_CLIENT_ID".to_string()),
            client_secret_env: Some("REDDIT_CLIENT_SECRET".to_string()),
            auth_base_url: "https://www.reddit.com/api/v1".to_string(),
            api_base_url: "https://oauth.reddit.com".to_string(),
            callback_path: "/auth/reddit/callback".to_string(),
            user_agent: "SignalScout/1.0".to_string(),
            scopes: vec![
                "submit".to_string(),
                "read".to_string(),
                "identity".to_string(),
            ],
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            token_file: "data/reddit_tokens.enc".to_string(),
            storage_secret: String::new(), // Will be generated if empty
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ScoutSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// This also loads the `.env` file and initializes the logger at the
    /// configured level.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read or parsed
    /// - The storage secret file cannot be read or written
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_env_file();

        let (mut settings, sources) = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);
        Self::initialize_logging(&settings.logging);
        for source in &sources {
            log::info!("{source}");
        }

        settings.ensure_storage_secret()?;
        Ok(settings)
    }

    /// Initialize `env_logger` with `logging.level` as the filter
    ///
    /// `RUST_LOG` already overrides `logging.level` in [`Self::apply_env_overrides`].
    fn initialize_logging(logging: &LoggingSettings) {
        let initialized = env_logger::Builder::new()
            .parse_filters(&logging.level)
            .try_init();
        if initialized.is_err() {
            log::debug!("Logger already initialized");
        }
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `SCOUT_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// Returns the settings and a note per file considered; the logger is not
    /// running yet, so the caller logs them.
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or parsed
    fn load_base_settings() -> Result<(Self, Vec<String>), Box<dyn std::error::Error>> {
        let mut settings = Self::default();
        let mut sources = Vec::new();

        let default_config_path = std::path::PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_toml(&fs::read_to_string(&default_config_path)?)?;
            sources.push(format!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            ));
        }

        if let Ok(secrets_dir) = std::env::var("SCOUT_SECRETS_DIR") {
            let secrets_path = std::path::Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::from_toml(&fs::read_to_string(&secrets_path)?)?;
                sources.push(format!("✓ Overriding settings from {}", secrets_path.display()));
            } else {
                sources.push(format!(
                    "ℹ SCOUT_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                ));
            }
        }

        Ok((settings, sources))
    }

    /// Parse settings from TOML; missing sections and fields keep their defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed
    pub fn from_toml(content: &str) -> Result<Self, basic_toml::Error> {
        basic_toml::from_str(content)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_reddit_env_overrides(&mut settings.reddit);
        Self::apply_storage_env_overrides(&mut settings.storage);
        Self::apply_workflow_env_overrides(&mut settings.workflow);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
        if let Ok(redirect_base_url) = std::env::var("REDIRECT_BASE_URL") {
            app_settings.redirect_base_url = redirect_base_url;
        }
        if let Ok(cors_origins) = std::env::var("CORS_ORIGINS") {
            app_settings.cors_origins = cors_origins;
        }
        if let Ok(timeout) = std::env::var("AUTH_WAIT_TIMEOUT_SECONDS") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                app_settings.auth_wait_timeout_seconds = seconds;
            }
        }
    }

    fn apply_reddit_env_overrides(reddit_settings: &mut RedditSettings) {
        if let Ok(user_agent) = std::env::var("REDDIT_USER_AGENT") {
            reddit_settings.user_agent = user_agent;
        }
    }

    fn apply_storage_env_overrides(storage_settings: &mut StorageSettings) {
        if let Ok(token_file) = std::env::var("TOKEN_FILE") {
            storage_settings.token_file = token_file;
        }
        if let Ok(secret) = std::env::var("STORAGE_SECRET") {
            if !secret.is_empty() {
                storage_settings.storage_secret = secret;
            }
        }
    }

    fn apply_workflow_env_overrides(workflow_settings: &mut WorkflowSettings) {
        if let Ok(url) = std::env::var("N8N_SEARCH_WEBHOOK_URL") {
            workflow_settings.search_webhook_url = Some(url).filter(|u| !u.is_empty());
        }
        if let Ok(url) = std::env::var("N8N_POSTER_WEBHOOK_URL") {
            workflow_settings.poster_webhook_url = Some(url).filter(|u| !u.is_empty());
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Provide a storage secret when none was configured
    ///
    /// With a token file, the generated secret is kept in
    /// [`Self::storage_secret_path`] and read back on later starts, so stored
    /// tokens stay readable across restarts.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret file cannot be read or written
    pub fn ensure_storage_secret(&mut self) -> std::io::Result<()> {
        if !self.storage.storage_secret.is_empty() {
            return Ok(());
        }

        let Some(secret_path) = self.storage_secret_path() else {
            self.storage.storage_secret = generate_secret();
            return Ok(());
        };

        if secret_path.exists() {
            let secret = fs::read_to_string(&secret_path)?.trim().to_string();
            if !secret.is_empty() {
                log::info!("✓ Using storage secret from {}", secret_path.display());
                self.storage.storage_secret = secret;
                return Ok(());
            }
        }

        let secret = generate_secret();
        Self::write_secret_file(&secret_path, &secret)?;
        log::warn!("⚠️  Generated storage secret at {}", secret_path.display());
        log::warn!("🔒 Set STORAGE_SECRET or storage.storage_secret in Settings.toml to manage it yourself");
        self.storage.storage_secret = secret;
        Ok(())
    }

    /// Where a generated storage secret lives: next to the token file
    #[must_use]
    pub fn storage_secret_path(&self) -> Option<PathBuf> {
        let token_file = self.storage.token_file.trim();
        if token_file.is_empty() {
            None
        } else {
            Some(PathBuf::from(format!("{token_file}.key")))
        }
    }

    fn write_secret_file(path: &Path, secret: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, secret)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Get CORS origins as a vector of strings
    #[must_use]
    pub fn get_cors_origins(&self) -> Vec<String> {
        self.application
            .cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// The exact redirect URI registered with Reddit
    #[must_use]
    pub fn get_redirect_uri(&self) -> String {
        format!(
            "{}{}",
            self.application.redirect_base_url.trim_end_matches('/'),
            self.reddit.callback_path
        )
    }

    /// Origin of the front end, the only target the callback page posts to
    #[must_use]
    pub fn get_frontend_origin(&self) -> String {
        url::Url::parse(&self.application.redirect_base_url).map_or_else(
            |_| self.application.redirect_base_url.clone(),
            |url| url.origin().ascii_serialization(),
        )
    }
}

impl RedditSettings {
    /// Get the client ID, checking environment variable first, then falling back to direct value
    #[must_use]
    pub fn get_client_id(&self) -> Option<String> {
        Self::resolve(self.client_id_env.as_deref(), self.client_id.as_ref())
    }

    /// Get the client secret, checking environment variable first, then falling back to direct value
    #[must_use]
    pub fn get_client_secret(&self) -> Option<String> {
        Self::resolve(self.client_secret_env.as_deref(), self.client_secret.as_ref())
    }

    fn resolve(env_var: Option<&str>, direct: Option<&String>) -> Option<String> {
        if let Some(env_var) = env_var {
            if let Ok(value) = std::env::var(env_var) {
                if !value.is_empty() {
                    return Some(value);
                }
            }
        }
        direct.filter(|v| !v.is_empty()).cloned()
    }

    /// Scopes as the space-separated string Reddit expects
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}
