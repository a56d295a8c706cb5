//! Router tests against the in-memory adapter

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

use core_kernel::{Currency, CustomerId, Money};
use domain_returns::ports::mock::InMemoryErp;
use domain_returns::SalesReturnService;
use domain_sales::{ChargeType, SalesInvoice, SalesInvoiceItem, SalesTaxCharge};
use interface_api::auth::{create_token, permissions};
use interface_api::config::ApiConfig;
use interface_api::{create_router, AppState};

struct TestApp {
    router: Router,
    config: ApiConfig,
    customer: CustomerId,
    invoice: SalesInvoice,
}

impl TestApp {
    async fn new() -> Self {
        let customer = CustomerId::new_v7();
        let mut invoice = SalesInvoice::new(
            "Acme KSA",
            customer,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            Currency::SAR,
        );
        invoice.add_item(
            SalesInvoiceItem::new("WIDGET", dec!(10), Money::new(dec!(20), Currency::SAR))
                .with_uom("Nos"),
        );
        invoice.add_tax(SalesTaxCharge::new(ChargeType::OnNetTotal, "VAT 15% - AK", dec!(15), Currency::SAR));
        invoice.calculate_taxes_and_totals().unwrap();
        invoice.submit().unwrap();

        let erp = Arc::new(InMemoryErp::with_documents(vec![invoice.clone()], vec![]).await);
        let config = ApiConfig::default();
        let service = Arc::new(SalesReturnService::new(erp.clone(), erp.clone(), config.return_settings()));
        let router = create_router(AppState::new(service, erp, config.clone()));

        Self {
            router,
            config,
            customer,
            invoice,
        }
    }

    fn token(&self, roles: &[&str]) -> String {
        create_token(
            "clerk@acme.sa",
            roles.iter().map(|r| r.to_string()).collect(),
            &self.config.jwt_secret,
            300,
        )
        .unwrap()
    }

    fn admin(&self) -> String {
        self.token(&["admin"])
    }

    async fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn return_body(&self, qty: &str) -> Value {
        json!({
            "company": "Acme KSA",
            "customer": self.customer.as_uuid(),
            "submit_credit_notes": true,
            "items": [{
                "sales_invoice": self.invoice.id.as_uuid(),
                "sales_invoice_item": self.invoice.items[0].id.as_uuid(),
                "item_code": "WIDGET",
                "uom": "Nos",
                "original_qty": "10",
                "qty": qty,
                "rate": "20",
                "vat_rate_ratio": "0.15"
            }]
        })
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;

    let (status, body) = app.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.send("GET", "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["adapter"]["adapter_id"], "in-memory-erp");
}

#[tokio::test]
async fn test_api_requires_bearer_token() {
    let app = TestApp::new().await;

    let (status, _) = app.send("GET", "/api/v1/amount-in-words?amount=5", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send("GET", "/api/v1/amount-in-words?amount=5", Some("not-a-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_amount_in_words_uses_absolute_value() {
    let app = TestApp::new().await;
    let token = app.token(&[]);

    let (status, body) = app
        .send("GET", "/api/v1/amount-in-words?amount=-126.50", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["in_words"], "SAR One Hundred And Twenty Six and Fifty Halala only.");
}

#[tokio::test]
async fn test_invoice_items_need_customer() {
    let app = TestApp::new().await;
    let token = app.admin();

    let (status, body) = app
        .send("GET", "/api/v1/sales-invoice-items?select_all=true", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Customer is required.");

    let uri = format!("/api/v1/sales-invoice-items?customer={}&select_all=true", app.customer.as_uuid());
    let (status, body) = app.send("GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let lines = body.as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["item_code"], "WIDGET");
}

#[tokio::test]
async fn test_write_needs_permission() {
    let app = TestApp::new().await;
    let token = app.token(&[permissions::RETURN_READ]);

    let (status, _) = app
        .send("POST", "/api/v1/sales-returns", Some(&token), Some(app.return_body("2")))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invalid_line_is_unprocessable() {
    let app = TestApp::new().await;
    let token = app.admin();

    let (status, body) = app
        .send("POST", "/api/v1/sales-returns", Some(&token), Some(app.return_body("0")))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_create_submit_then_exceed_remaining() {
    let app = TestApp::new().await;
    let token = app.admin();

    let (status, created) = app
        .send("POST", "/api/v1/sales-returns", Some(&token), Some(app.return_body("4")))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "draft");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, submitted) = app
        .send("POST", &format!("/api/v1/sales-returns/{}/submit", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["document"]["status"], "submitted");
    assert!(submitted["message"]
        .as_str()
        .unwrap()
        .starts_with(&format!("Credit Note created for {}", app.invoice.name())));

    let (status, _) = app
        .send("PUT", &format!("/api/v1/sales-returns/{}", id), Some(&token), Some(json!({ "create_delivery_note": true })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .send("POST", "/api/v1/sales-returns", Some(&token), Some(app.return_body("7")))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["row"], 1);
    assert_eq!(body["details"]["item_code"], "WIDGET");

    let (status, _) = app
        .send("POST", "/api/v1/sales-returns", Some(&token), Some(app.return_body("6")))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_claimed_original_quantity_is_ignored() {
    let app = TestApp::new().await;
    let token = app.admin();

    let mut body = app.return_body("50");
    body["items"][0]["original_qty"] = json!("1000");
    let (status, body) = app
        .send("POST", "/api/v1/sales-returns", Some(&token), Some(body))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["original_qty"], "10");
    assert_eq!(body["details"]["remaining"], "10");
}

#[tokio::test]
async fn test_unknown_return_is_not_found() {
    let app = TestApp::new().await;
    let token = app.admin();

    let uri = format!("/api/v1/sales-returns/{}", uuid_v7());
    let (status, body) = app.send("GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

fn uuid_v7() -> String {
    core_kernel::SalesReturnId::new_v7().as_uuid().to_string()
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = TestApp::new().await;

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");
}
