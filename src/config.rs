use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Base URL of the ViaCEP postal-code service, without trailing slash.
    pub via_cep_api: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL")
                .or_else(|_| std::env::var("DB_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DATABASE_URL or DB_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DATABASE_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            via_cep_api: std::env::var("VIA_CEP_API")
                .map_err(|_| anyhow::anyhow!("VIA_CEP_API environment variable required"))
                .and_then(|url| normalize_base_url("VIA_CEP_API", &url))?,
        };

        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            log_prefix(&config.database_url)
        );
        tracing::debug!("ViaCEP API: {}", config.via_cep_api);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

/// First 20 characters of a value, for logging without credentials.
fn log_prefix(value: &str) -> String {
    value.chars().take(20).collect()
}

/// Validates an `http(s)://` base URL and strips trailing slashes.
fn normalize_base_url(name: &str, url: &str) -> anyhow::Result<String> {
    let url = url.trim();
    if url.is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(url.trim_end_matches('/').to_string())
}
