//! HTTP Handlers

use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use storefront_checkout::{validate_email, validate_name};
use storefront_core::{
    CreateOutcome, CreateTransactionRequest, Customer, PaymentGateway, Plan, StorefrontError,
};
use storefront_payments::{
    CheckPaymentRequest, CheckPaymentResponse, CreatePaymentResponse, SIGNATURE_HEADER,
};

use crate::state::AppState;

const DOCUMENT_DIGITS: usize = 11;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub gateway_configured: bool,
}

/// Error body; `success: false` lets checkout clients read it as a
/// create-payment response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
}

#[derive(Debug, Default, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub event: Option<String>,
    pub txid: Option<String>,
}

/// API errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Payments not configured")]
    NotConfigured,

    #[error("{0}")]
    Gateway(String),

    #[error("{0}")]
    Internal(String),

    #[error("Invalid webhook signature")]
    Unauthorized,
}

impl ApiError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            Self::Gateway(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    const fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_REQUEST",
            Self::NotConfigured => "PAYMENTS_DISABLED",
            Self::Gateway(_) => "GATEWAY_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Unauthorized => "INVALID_SIGNATURE",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            code: self.code(),
        };
        (self.status(), Json(body)).into_response()
    }
}

fn require_gateway(state: &AppState) -> Result<&dyn PaymentGateway, ApiError> {
    state.gateway.as_deref().ok_or(ApiError::NotConfigured)
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        gateway_configured: state.gateway.is_some(),
    })
}

/// Plan catalog
pub async fn list_plans() -> Json<&'static [Plan]> {
    Json(Plan::catalog())
}

/// Create a PIX payment
pub async fn create_payment(
    State(state): State<AppState>,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<Json<CreatePaymentResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    validate_customer(&payload.customer)?;

    // Price and name always come from the catalog
    let plan = Plan::find(&payload.plan_id).ok_or_else(|| {
        let err = StorefrontError::UnknownPlan(payload.plan_id.clone());
        tracing::warn!(error = %err, "Rejected create payment");
        ApiError::BadRequest(err.user_message())
    })?;
    let request =
        CreateTransactionRequest::new(plan, payload.customer, &payload.metadata.attribution());

    let gateway = require_gateway(&state)?;
    tracing::info!(
        plan = %plan.id,
        amount = %plan.price,
        tags = request.metadata.attribution().len(),
        "Creating PIX payment"
    );

    match gateway.create_transaction(&request).await {
        Ok(CreateOutcome::Created(charge)) => {
            tracing::info!(transaction_id = %charge.transaction_id, "PIX payment created");
            Ok(Json(CreatePaymentResponse::from_charge(charge)))
        }
        Ok(CreateOutcome::Rejected { message }) => {
            tracing::warn!(?message, "Gateway rejected payment");
            Err(ApiError::Gateway(
                message.unwrap_or_else(|| "Could not create payment".into()),
            ))
        }
        Err(e) => {
            tracing::error!(error = %e, "Create payment failed");
            Err(ApiError::Gateway(e.user_message()))
        }
    }
}

fn validate_customer(customer: &Customer) -> Result<(), ApiError> {
    let document_ok = customer.document.len() == DOCUMENT_DIGITS
        && customer.document.bytes().all(|b| b.is_ascii_digit());

    validate_name(&customer.name)
        .or_else(|| validate_email(&customer.email))
        .map(str::to_string)
        .or_else(|| (!document_ok).then(|| "Document must have 11 digits".to_string()))
        .map_or(Ok(()), |message| Err(ApiError::BadRequest(message)))
}

/// Check a payment's status
pub async fn check_payment(
    State(state): State<AppState>,
    payload: Result<Json<CheckPaymentRequest>, JsonRejection>,
) -> Result<Json<CheckPaymentResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let transaction_id = payload.transaction_id.trim();
    if transaction_id.is_empty() {
        return Err(ApiError::BadRequest("Transaction ID is required".into()));
    }

    let status = require_gateway(&state)?
        .transaction_status(transaction_id)
        .await
        .map_err(|e| {
            tracing::error!(transaction_id, error = %e, "Check payment failed");
            ApiError::Internal(e.user_message())
        })?;

    Ok(Json(CheckPaymentResponse {
        status,
        transaction_id: transaction_id.to_string(),
    }))
}

/// PIX provider webhook
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    state.webhooks.verify(&body, signature).map_err(|e| {
        tracing::warn!(error = %e, "Webhook signature failed");
        ApiError::Unauthorized
    })?;

    // Always acknowledge so the provider does not retry
    let event = match state.webhooks.parse(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable webhook");
            return Ok(Json(WebhookAck {
                received: true,
                ..WebhookAck::default()
            }));
        }
    };
    state.webhooks.handle(&event);

    Ok(Json(WebhookAck {
        received: true,
        event: Some(event.event_name().to_string()),
        txid: event.txid().map(str::to_string),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::Request,
    };
    use serde_json::{Value, json};
    use storefront_core::{PaymentStatus, PixCharge};
    use storefront_payments::WebhookHandler;
    use tower::ServiceExt;

    #[derive(Default)]
    struct FakeGateway {
        outcome: Option<CreateOutcome>,
        requests: Mutex<Vec<CreateTransactionRequest>>,
    }

    impl FakeGateway {
        fn answering(outcome: CreateOutcome) -> Arc<Self> {
            Arc::new(Self {
                outcome: Some(outcome),
                ..Self::default()
            })
        }

        fn requests(&self) -> Vec<CreateTransactionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PaymentGateway for FakeGateway {
        async fn create_transaction(
            &self,
            request: &CreateTransactionRequest,
        ) -> storefront_core::Result<CreateOutcome> {
            self.requests.lock().unwrap().push(request.clone());
            self.outcome
                .clone()
                .ok_or_else(|| StorefrontError::GatewayUnavailable("connection refused".into()))
        }

        async fn transaction_status(&self, transaction_id: &str) -> storefront_core::Result<PaymentStatus> {
            if transaction_id == "tx_paid" {
                Ok(PaymentStatus::Authorized)
            } else {
                Err(StorefrontError::InvalidResponse("no data".into()))
            }
        }

        fn name(&self) -> &str {
            "Fake"
        }
    }

    fn created() -> CreateOutcome {
        CreateOutcome::Created(PixCharge {
            transaction_id: "tx_1".into(),
            external_id: Some("order-plan-1-mes-1-abcdef".into()),
            payment_code: "00020126PIX".into(),
            qr_target_url: None,
            status: PaymentStatus::Pending,
        })
    }

    fn app(gateway: Option<Arc<FakeGateway>>, secret: Option<&str>) -> Router {
        crate::build_router(AppState {
            gateway: gateway.map(|g| g as Arc<dyn PaymentGateway>),
            webhooks: Arc::new(WebhookHandler::new(secret.map(str::to_string))),
        })
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn payment_body(name: &str, document: &str, plan_id: &str) -> Value {
        json!({
            "planId": plan_id,
            "planName": "Anything",
            "amount": 0.01,
            "customer": { "name": name, "email": "a@b.co", "document": document },
            "metadata": { "utm_source": "fb", "customer_ip": "1.2.3.4", "plan_id": "spoofed" }
        })
    }

    #[tokio::test]
    async fn test_health_and_plans() {
        let (status, body) = send(app(None, None), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["gateway_configured"], false);

        let (status, body) = send(app(None, None), "GET", "/api/plans", None).await;
        assert_eq!(status, StatusCode::OK);
        let plans = body.as_array().unwrap();
        assert_eq!(plans.len(), 3);
        assert_eq!(plans[2]["id"], "plan-vitalicio");
        assert_eq!(plans[1]["discount"], "25% off");
    }

    #[tokio::test]
    async fn test_create_payment_uses_catalog_price() {
        let gateway = FakeGateway::answering(created());
        let (status, body) = send(
            app(Some(gateway.clone()), None),
            "POST",
            "/api/create-payment",
            Some(payment_body("Jo", "52998224725", "plan-1-mes")),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["transactionId"], "tx_1");
        assert_eq!(body["pixCode"], "00020126PIX");

        let requests = gateway.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].amount, Plan::find("plan-1-mes").unwrap().price);
        assert_eq!(requests[0].plan_name, "1 Mês");
        assert_eq!(requests[0].metadata.get("utm_source"), Some("fb"));
        assert_eq!(requests[0].metadata.get("plan_id"), Some("plan-1-mes"));
        assert!(requests[0].metadata.get("customer_ip").is_none());
    }

    #[tokio::test]
    async fn test_create_payment_validation() {
        let gateway = FakeGateway::answering(created());
        let cases = [
            payment_body("A", "52998224725", "plan-1-mes"),
            payment_body("Jo", "123", "plan-1-mes"),
            payment_body("Jo", "52998224725", "plan-forever"),
            json!({ "planId": "plan-1-mes" }),
        ];
        for body in cases {
            let (status, body) =
                send(app(Some(gateway.clone()), None), "POST", "/api/create-payment", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["success"], false);
            assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
        }
        assert!(gateway.requests().is_empty());

        let (_, body) = send(
            app(Some(gateway), None),
            "POST",
            "/api/create-payment",
            Some(payment_body("A", "52998224725", "plan-1-mes")),
        )
        .await;
        assert_eq!(body["error"], "Name must be at least 2 characters");
    }

    #[tokio::test]
    async fn test_create_payment_unknown_plan() {
        let (status, body) = send(
            app(Some(FakeGateway::answering(created())), None),
            "POST",
            "/api/create-payment",
            Some(payment_body("Jo", "52998224725", "plan-forever")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_REQUEST");
        assert_eq!(
            body["error"],
            StorefrontError::UnknownPlan("plan-forever".into()).user_message()
        );
    }

    #[tokio::test]
    async fn test_create_payment_skips_non_string_metadata() {
        let gateway = FakeGateway::answering(created());
        let mut body = payment_body("Jo", "52998224725", "plan-3-meses");
        body["metadata"] = json!({ "utm_source": "fb", "utm_id": 42, "utm_ad": null });

        let (status, response) =
            send(app(Some(gateway.clone()), None), "POST", "/api/create-payment", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["success"], true);

        let requests = gateway.requests();
        assert_eq!(requests[0].metadata.get("utm_source"), Some("fb"));
        assert!(requests[0].metadata.get("utm_id").is_none());
        assert!(requests[0].metadata.get("utm_ad").is_none());
    }

    #[tokio::test]
    async fn test_create_payment_gateway_failures() {
        let body = payment_body("Jo", "52998224725", "plan-1-mes");

        let (status, response) =
            send(app(None, None), "POST", "/api/create-payment", Some(body.clone())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response["code"], "PAYMENTS_DISABLED");

        let rejected = FakeGateway::answering(CreateOutcome::Rejected { message: None });
        let (status, response) =
            send(app(Some(rejected), None), "POST", "/api/create-payment", Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(response["error"], "Could not create payment");

        let down = Arc::new(FakeGateway::default());
        let (status, response) =
            send(app(Some(down), None), "POST", "/api/create-payment", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            response["error"],
            StorefrontError::GatewayUnavailable(String::new()).user_message()
        );
    }

    #[tokio::test]
    async fn test_check_payment() {
        let gateway = Arc::new(FakeGateway::default());

        let (status, _) = send(
            app(Some(gateway.clone()), None),
            "POST",
            "/api/check-payment",
            Some(json!({ "transactionId": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            app(Some(gateway.clone()), None),
            "POST",
            "/api/check-payment",
            Some(json!({ "transactionId": "tx_paid" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "AUTHORIZED", "transactionId": "tx_paid" }));

        let (status, _) = send(
            app(Some(gateway), None),
            "POST",
            "/api/check-payment",
            Some(json!({ "transactionId": "tx_other" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_webhook_acknowledges() {
        let paid = json!({ "event": "payment.paid", "data": { "txid": "tx_1", "status": "paid" } });
        let (status, body) = send(app(None, None), "POST", "/api/webhook", Some(paid.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "received": true, "event": "payment.paid", "txid": "tx_1" }));

        let (status, body) =
            send(app(None, None), "POST", "/api/webhook", Some(json!({ "event": "payment.paid" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["received"], true);
        assert_eq!(body["event"], Value::Null);

        let (status, body) = send(app(None, Some("whsec")), "POST", "/api/webhook", Some(paid)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "INVALID_SIGNATURE");
    }
}
