//! Storefront API Client
//!
//! `PaymentGateway` over the storefront's own `/api/create-payment` and
//! `/api/check-payment` endpoints. This is what a checkout running outside
//! the server uses: provider credentials never leave the server.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use storefront_core::{
    CreateOutcome, CreateTransactionRequest, PaymentGateway, PaymentStatus, PixCharge,
};

use crate::error::{PaymentError, Result};

/// Response body of `POST /api/create-payment`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pix_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_code_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CreatePaymentResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn from_charge(charge: PixCharge) -> Self {
        Self {
            success: true,
            transaction_id: Some(charge.transaction_id),
            external_id: charge.external_id,
            pix_code: Some(charge.payment_code),
            qr_code_url: charge.qr_target_url,
            status: Some(charge.status),
            error: None,
        }
    }

    /// Interpret as a gateway outcome
    pub fn into_outcome(self) -> Result<CreateOutcome> {
        if !self.success {
            return Ok(CreateOutcome::Rejected {
                message: self.error.filter(|m| !m.trim().is_empty()),
            });
        }

        let transaction_id = self
            .transaction_id
            .ok_or_else(|| PaymentError::InvalidResponse("missing transactionId".into()))?;

        Ok(CreateOutcome::Created(PixCharge {
            transaction_id,
            external_id: self.external_id,
            payment_code: self.pix_code.unwrap_or_default(),
            qr_target_url: self.qr_code_url,
            status: self.status.unwrap_or(PaymentStatus::Pending),
        }))
    }
}

/// Request body of `POST /api/check-payment`
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckPaymentRequest {
    #[serde(default)]
    pub transaction_id: String,
}

/// Response body of `POST /api/check-payment`
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckPaymentResponse {
    pub status: PaymentStatus,
    pub transaction_id: String,
}

/// Client for the storefront HTTP API
pub struct StorefrontApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl StorefrontApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PaymentError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Create a payment through the storefront server
    pub async fn create_payment(&self, request: &CreateTransactionRequest) -> Result<CreateOutcome> {
        let response = self
            .http
            .post(self.endpoint("/api/create-payment"))
            .json(request)
            .send()
            .await?;

        // Failures come back as `{ success: false, error }` with a 4xx/5xx status
        let body: CreatePaymentResponse = response.json().await?;
        body.into_outcome()
    }

    /// Check a payment through the storefront server
    pub async fn check_payment(&self, transaction_id: &str) -> Result<PaymentStatus> {
        let response = self
            .http
            .post(self.endpoint("/api/check-payment"))
            .json(&CheckPaymentRequest {
                transaction_id: transaction_id.into(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: CheckPaymentResponse = response.json().await?;
        Ok(body.status)
    }
}

#[async_trait]
impl PaymentGateway for StorefrontApiClient {
    async fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
    ) -> storefront_core::Result<CreateOutcome> {
        Ok(self.create_payment(request).await?)
    }

    async fn transaction_status(&self, transaction_id: &str) -> storefront_core::Result<PaymentStatus> {
        Ok(self.check_payment(transaction_id).await?)
    }

    fn name(&self) -> &str {
        "StorefrontApi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::{AttributionParams, Customer, Plan};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> CreateTransactionRequest {
        let customer = Customer {
            name: "Jo".into(),
            email: "jo@example.com".into(),
            document: "52998224725".into(),
        };
        CreateTransactionRequest::new(
            Plan::find("plan-1-mes").unwrap(),
            customer,
            &AttributionParams::new(),
        )
    }

    #[test]
    fn test_failure_without_message() {
        let outcome = CreatePaymentResponse::failure("  ").into_outcome().unwrap();
        assert_eq!(outcome, CreateOutcome::Rejected { message: None });
    }

    #[test]
    fn test_success_without_transaction_id_is_invalid() {
        let response = CreatePaymentResponse {
            success: true,
            pix_code: Some("000201".into()),
            ..Default::default()
        };
        assert!(matches!(
            response.into_outcome(),
            Err(PaymentError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_create_payment_rejected_by_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/create-payment"))
            .respond_with(ResponseTemplate::new(502).set_body_json(serde_json::json!({
                "success": false,
                "error": "Gateway offline"
            })))
            .mount(&server)
            .await;

        let client = StorefrontApiClient::new(server.uri()).unwrap();
        let outcome = client.create_transaction(&request()).await.unwrap();
        assert_eq!(
            outcome,
            CreateOutcome::Rejected {
                message: Some("Gateway offline".into())
            }
        );
    }

    #[tokio::test]
    async fn test_check_payment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/check-payment"))
            .and(body_json(serde_json::json!({"transactionId": "tx_9"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "AUTHORIZED",
                "transactionId": "tx_9"
            })))
            .mount(&server)
            .await;

        let client = StorefrontApiClient::new(format!("{}/", server.uri())).unwrap();
        assert_eq!(client.check_payment("tx_9").await.unwrap(), PaymentStatus::Authorized);
    }

    #[tokio::test]
    async fn test_check_payment_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/check-payment"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = StorefrontApiClient::new(server.uri()).unwrap();
        let result = client.check_payment("tx_9").await;
        assert!(matches!(result, Err(PaymentError::Api { status: 500, .. })));
    }
}
