//! Product vision client
//!
//! Client for the photo autofill microservice: an encoded product photo
//! in, best-effort label suggestions out. Suggestions only prefill a
//! draft and are never authoritative — every save still goes through the
//! reconciliation engine's validation.

use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::VisionConfig;
use crate::error::{AppError, AppResult};

/// Client for the product extraction microservice
#[derive(Clone)]
pub struct VisionClient {
    api_endpoint: String,
    api_key: String,
    http_client: Client,
}

/// Request to extract product labels from a photo
#[derive(Debug, Serialize)]
pub struct ExtractProductRequest {
    pub image_base64: String,
}

/// Best-effort label suggestions from the photo
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductSuggestions {
    pub name: Option<String>,
    pub flavor: Option<String>,
    pub size: Option<String>,
    pub nicotine: Option<Decimal>,
}

impl VisionClient {
    /// Create a new vision client
    pub fn new(api_endpoint: String, api_key: String) -> Self {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_endpoint,
            api_key,
            http_client,
        }
    }

    /// Create a client from configuration; `None` when autofill is not
    /// configured.
    pub fn from_config(config: &VisionConfig) -> Option<Self> {
        if config.api_endpoint.is_empty() {
            return None;
        }
        Some(Self::new(
            config.api_endpoint.clone(),
            config.api_key.clone(),
        ))
    }

    /// Send a photo for product label extraction
    pub async fn extract_product(
        &self,
        request: ExtractProductRequest,
    ) -> AppResult<ProductSuggestions> {
        let response = self
            .http_client
            .post(&self.api_endpoint)
            .header("x-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalService(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let suggestions: ProductSuggestions = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to parse response: {}", e)))?;

        Ok(suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_endpoint_yields_no_client() {
        let config = VisionConfig {
            api_endpoint: String::new(),
            api_key: String::new(),
        };
        assert!(VisionClient::from_config(&config).is_none());
    }

    #[test]
    fn configured_endpoint_yields_client() {
        let config = VisionConfig {
            api_endpoint: "https://vision.example.com/extract".to_string(),
            api_key: "key".to_string(),
        };
        assert!(VisionClient::from_config(&config).is_some());
    }
}
