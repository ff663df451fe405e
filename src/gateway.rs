use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::{
    config::GatewayConfig,
    error::{AppError, AppResult},
};

/// How often the charge request is attempted before giving up. Retries only
/// fire on transport timeouts and reuse the same tx_ref, so the gateway can
/// deduplicate.
const MAX_ATTEMPTS: u32 = 2;
const RETRY_BACKOFF_MS: u64 = 500;

/// HTTP client for the Flutterwave-style payment gateway.
#[derive(Clone)]
pub struct PaymentGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

#[derive(Debug, Clone)]
pub struct GatewayCharge {
    pub tx_ref: String,
    pub payment_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InitiateResponse {
    status: String,
    message: Option<String>,
    data: Option<InitiateData>,
}

#[derive(Debug, Deserialize)]
struct InitiateData {
    link: Option<String>,
}

impl PaymentGateway {
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::new(GatewayConfig::from_env())
    }

    /// Initiate a charge for `amount` minor units. `tx_ref` doubles as the
    /// idempotency key across retries.
    pub async fn initiate(
        &self,
        tx_ref: &str,
        amount: i64,
        email: &str,
    ) -> AppResult<GatewayCharge> {
        let url = format!("{}/payments", self.config.base_url);
        let body = json!({
            "tx_ref": tx_ref,
            "amount": format_major_units(amount),
            "currency": "NGN",
            "redirect_url": self.config.redirect_url,
            "customer": { "email": email },
        });

        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self
                .client
                .post(&url)
                .bearer_auth(&self.config.secret_key)
                .json(&body)
                .send()
                .await;

            let response = match result {
                Ok(response) => response,
                Err(err) if err.is_timeout() || err.is_connect() => {
                    if attempt < MAX_ATTEMPTS {
                        tracing::warn!(tx_ref, attempt, error = %err, "gateway unreachable, retrying");
                        tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS)).await;
                        continue;
                    }
                    return Err(AppError::GatewayTimeout);
                }
                Err(err) => return Err(AppError::Gateway(err.to_string())),
            };

            let http_status = response.status();
            if !http_status.is_success() {
                return Err(AppError::Gateway(format!(
                    "charge declined with status {http_status}"
                )));
            }

            let parsed: InitiateResponse = response
                .json()
                .await
                .map_err(|err| AppError::Gateway(err.to_string()))?;

            if parsed.status != "success" {
                let reason = parsed
                    .message
                    .unwrap_or_else(|| "no reason given".to_string());
                return Err(AppError::Gateway(reason));
            }

            tracing::info!(tx_ref, amount, "gateway charge initiated");
            return Ok(GatewayCharge {
                tx_ref: tx_ref.to_string(),
                payment_link: parsed.data.and_then(|d| d.link),
            });
        }
    }
}

/// Render minor units as a "major.cents" decimal string for the gateway.
fn format_major_units(amount: i64) -> String {
    format!("{}.{:02}", amount / 100, (amount % 100).abs())
}

#[cfg(test)]
mod tests {
    use super::format_major_units;

    #[test]
    fn formats_whole_and_fractional_amounts() {
        assert_eq!(format_major_units(2000), "20.00");
        assert_eq!(format_major_units(1850), "18.50");
        assert_eq!(format_major_units(5), "0.05");
        assert_eq!(format_major_units(0), "0.00");
    }
}
