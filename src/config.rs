use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub gateway: GatewayConfig,
}

/// Settings for the external payment gateway client.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub secret_key: String,
    pub redirect_url: String,
    pub timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        Ok(Self {
            port,
            database_url,
            host,
            gateway: GatewayConfig::from_env(),
        })
    }
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        let base_url = env::var("FLUTTERWAVE_API_URL")
            .unwrap_or_else(|_| "https://api.flutterwave.com/v3".to_string());
        let secret_key = env::var("FLUTTERWAVE_SECRET_KEY").unwrap_or_default();
        let redirect_url = env::var("PAYMENT_REDIRECT_URL")
            .unwrap_or_else(|_| "https://zentoria.example.com/payments/complete".to_string());
        let timeout_secs = env::var("GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse::<u64>().ok())
            .unwrap_or(10);
        Self {
            base_url,
            secret_key,
            redirect_url,
            timeout_secs,
        }
    }
}
