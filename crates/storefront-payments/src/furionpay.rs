//! FurionPay PIX Integration
//!
//! Implementation of `PaymentGateway` against the FurionPay HTTP+JSON API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storefront_core::{
    CreateOutcome, CreateTransactionRequest, Customer, PaymentGateway, PaymentStatus, PixCharge,
    TransactionMetadata,
};

use crate::error::{PaymentError, Result};

const DEFAULT_BASE_URL: &str = "https://qtlhwjotfkyyqzgxlmkg.supabase.co/functions/v1";

/// FurionPay client configuration
#[derive(Clone, Debug)]
pub struct FurionPayConfig {
    /// Bearer API key
    pub api_key: String,

    /// API base URL (no trailing slash)
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl FurionPayConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: 30,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("FURIONPAY_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| PaymentError::Config("FURIONPAY_API_KEY not set".into()))?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup("FURIONPAY_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(timeout) = lookup("FURIONPAY_TIMEOUT_SECS").and_then(|t| t.parse().ok()) {
            config.timeout_secs = timeout;
        }
        Ok(config)
    }
}

/// FurionPay gateway client
pub struct FurionPayClient {
    http: reqwest::Client,
    config: FurionPayConfig,
}

impl FurionPayClient {
    /// Create a new client
    pub fn new(config: FurionPayConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PaymentError::Config(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(FurionPayConfig::from_env()?)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path)
    }

    /// Our reference for a new transaction: `order-<plan>-<millis>-<suffix>`
    pub fn external_reference(plan_id: &str) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("order-{}-{}-{}", plan_id, Utc::now().timestamp_millis(), &suffix[..6])
    }

    /// Create a PIX charge
    pub async fn create_pix(&self, request: &CreateTransactionRequest) -> Result<CreateOutcome> {
        let external_reference = Self::external_reference(&request.plan_id);
        let body = PixCreateBody {
            amount: request.amount,
            description: format!("Assinatura {}", request.plan_name),
            external_reference: &external_reference,
            customer: &request.customer,
            metadata: &request.metadata,
        };

        tracing::debug!(
            plan_id = %request.plan_id,
            external_reference = %external_reference,
            metadata_keys = request.metadata.len(),
            "Creating FurionPay PIX charge"
        );

        let response = self
            .http
            .post(self.endpoint("api-v1-pix-create"))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        Self::parse_create_response(status, &text)
    }

    /// Fetch a charge's normalized status
    pub async fn pix_status(&self, txid: &str) -> Result<PaymentStatus> {
        let response = self
            .http
            .get(self.endpoint("api-v1-pix-status"))
            .query(&[("txid", txid)])
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        Self::parse_status_response(status, &text)
    }

    fn parse_create_response(status: StatusCode, body: &str) -> Result<CreateOutcome> {
        let envelope: Envelope<PixData> = serde_json::from_str(body)
            .map_err(|e| PaymentError::InvalidResponse(format!("{e}: {body}")))?;

        if !status.is_success() || !envelope.success {
            let message = envelope
                .error
                .map(|e| e.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| format!("FurionPay API error: {}", status.as_u16()));
            tracing::warn!(status = status.as_u16(), %message, "FurionPay rejected PIX charge");
            return Ok(CreateOutcome::Rejected {
                message: Some(message),
            });
        }

        let data = envelope
            .data
            .ok_or_else(|| PaymentError::InvalidResponse("missing data".into()))?;

        Ok(CreateOutcome::Created(PixCharge {
            transaction_id: data.txid,
            external_id: data.external_reference,
            payment_code: data.pix_code.unwrap_or_default(),
            qr_target_url: data.qr_code_url,
            status: PaymentStatus::from_provider(&data.status),
        }))
    }

    fn parse_status_response(status: StatusCode, body: &str) -> Result<PaymentStatus> {
        let envelope: Envelope<StatusData> = serde_json::from_str(body)
            .map_err(|e| PaymentError::InvalidResponse(format!("{e}: {body}")))?;

        if !status.is_success() || !envelope.success {
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message: envelope
                    .error
                    .map_or_else(|| "Could not check payment status".into(), |e| e.message),
            });
        }

        envelope
            .data
            .map(|d| PaymentStatus::from_provider(&d.status))
            .ok_or_else(|| PaymentError::InvalidResponse("missing data".into()))
    }
}

#[async_trait]
impl PaymentGateway for FurionPayClient {
    async fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
    ) -> storefront_core::Result<CreateOutcome> {
        Ok(self.create_pix(request).await?)
    }

    async fn transaction_status(&self, transaction_id: &str) -> storefront_core::Result<PaymentStatus> {
        Ok(self.pix_status(transaction_id).await?)
    }

    fn name(&self) -> &str {
        "FurionPay"
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Serialize)]
struct PixCreateBody<'a> {
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    description: String,
    external_reference: &'a str,
    customer: &'a Customer,
    metadata: &'a TransactionMetadata,
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct PixData {
    txid: String,
    pix_code: Option<String>,
    qr_code_url: Option<String>,
    #[serde(default)]
    status: String,
    external_reference: Option<String>,
}

#[derive(Deserialize)]
struct StatusData {
    status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use storefront_core::{AttributionParams, Plan};
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> CreateTransactionRequest {
        let plan = Plan::find("plan-3-meses").unwrap();
        let customer = Customer {
            name: "Jo".into(),
            email: "jo@example.com".into(),
            document: "52998224725".into(),
        };
        let attribution = AttributionParams::from_pairs([("utm_source", "fb")]);
        CreateTransactionRequest::new(plan, customer, &attribution)
    }

    fn client(server: &MockServer) -> FurionPayClient {
        let mut config = FurionPayConfig::new("fp_test_key");
        config.base_url = server.uri();
        FurionPayClient::new(config).unwrap()
    }

    #[test]
    fn test_config_requires_api_key() {
        assert!(FurionPayConfig::from_lookup(|_| None).is_err());

        let config = FurionPayConfig::from_lookup(|key| match key {
            "FURIONPAY_API_KEY" => Some("fp_live_x".into()),
            "FURIONPAY_BASE_URL" => Some("http://localhost:9000/".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_external_reference_shape() {
        let reference = FurionPayClient::external_reference("plan-1-mes");
        assert!(reference.starts_with("order-plan-1-mes-"));
        assert_eq!(reference.rsplit('-').next().unwrap().len(), 6);
    }

    #[test]
    fn test_rejection_carries_gateway_message() {
        let body = r#"{"success":false,"error":{"code":"INVALID","message":"Documento inválido"}}"#;
        let outcome = FurionPayClient::parse_create_response(StatusCode::BAD_REQUEST, body).unwrap();
        assert_eq!(
            outcome,
            CreateOutcome::Rejected {
                message: Some("Documento inválido".into())
            }
        );
    }

    #[test]
    fn test_unparseable_body_is_an_error() {
        let result = FurionPayClient::parse_create_response(StatusCode::BAD_GATEWAY, "<html>");
        assert!(matches!(result, Err(PaymentError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_create_pix_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api-v1-pix-create"))
            .and(header("authorization", "Bearer fp_test_key"))
            .and(body_partial_json(serde_json::json!({
                "amount": 27.9,
                "description": "Assinatura 3 Meses",
                "metadata": {"plan_id": "plan-3-meses", "utm_source": "fb"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {
                    "txid": "tx_123",
                    "pix_code": "00020126...",
                    "qr_code_url": "https://qr.example/tx_123.png",
                    "amount": 27.9,
                    "status": "pending",
                    "external_reference": "order-plan-3-meses-1-abcdef",
                    "expires_at": "2026-01-01T00:00:00Z",
                    "created_at": "2026-01-01T00:00:00Z"
                }
            })))
            .mount(&server)
            .await;

        let outcome = client(&server).create_pix(&request()).await.unwrap();
        let CreateOutcome::Created(charge) = outcome else {
            panic!("expected created charge");
        };
        assert_eq!(charge.transaction_id, "tx_123");
        assert_eq!(charge.payment_code, "00020126...");
        assert_eq!(charge.status, PaymentStatus::Pending);
        assert_eq!(request().amount, dec!(27.90));
    }

    #[tokio::test]
    async fn test_pix_status_normalizes_paid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api-v1-pix-status"))
            .and(query_param("txid", "tx_123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {"txid": "tx_123", "amount": 27.9, "status": "paid", "created_at": "x"}
            })))
            .mount(&server)
            .await;

        let status = client(&server).transaction_status("tx_123").await.unwrap();
        assert_eq!(status, PaymentStatus::Authorized);
    }

    #[tokio::test]
    async fn test_pix_status_failure_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api-v1-pix-status"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "success": false,
                "error": {"code": "NOT_FOUND", "message": "Transaction not found"}
            })))
            .mount(&server)
            .await;

        let result = client(&server).pix_status("tx_missing").await;
        assert!(matches!(result, Err(PaymentError::Api { status: 404, .. })));
    }
}
