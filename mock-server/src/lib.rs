//! In-memory stand-in for the Platega API.
//!
//! Speaks the live wire format (including the API's `return`, `mechantId`
//! and `comission` keys), rejects requests whose `X-MerchantId` / `X-Secret`
//! headers do not match, and keeps transactions and conversion history in a
//! shared [`Db`] that tests can inspect and mutate.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const MERCHANT_ID: &str = "5f1c2a7e-8d4b-4e3a-9c61-0b2d7f9e4a10";
pub const SECRET: &str = "mock-secret";

#[derive(Clone, Debug, Serialize)]
pub struct Transaction {
    pub id: Uuid,
    pub status: String,
    pub payment_method: u8,
    pub amount: f64,
    pub currency: String,
    pub description: String,
    pub return_url: String,
    pub failed_url: Option<String>,
    pub payload: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Conversion {
    pub id: Uuid,
    pub amount: f64,
    pub currency: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct Store {
    pub transactions: HashMap<Uuid, Transaction>,
    pub conversions: Vec<Conversion>,
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Deserialize)]
pub struct CreateTransaction {
    #[serde(rename = "paymentMethod")]
    pub payment_method: u8,
    #[serde(rename = "paymentDetails")]
    pub payment_details: PaymentDetails,
    pub description: String,
    #[serde(rename = "return")]
    pub return_url: String,
    #[serde(rename = "failedUrl")]
    pub failed_url: Option<String>,
    pub payload: Option<String>,
}

#[derive(Deserialize)]
pub struct PaymentDetails {
    pub amount: f64,
    pub currency: String,
}

#[derive(Deserialize)]
pub struct RateQuery {
    #[serde(rename = "merchantId")]
    pub merchant_id: String,
    #[serde(rename = "paymentMethod")]
    pub payment_method: u8,
    #[serde(rename = "currencyFrom")]
    pub currency_from: String,
    #[serde(rename = "currencyTo")]
    pub currency_to: String,
}

#[derive(Deserialize)]
pub struct ConversionsQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_size() -> u32 {
    20
}

pub fn app() -> Router {
    app_with_db(Db::default())
}

/// Router over caller-owned state, so tests can seed and inspect it.
pub fn app_with_db(db: Db) -> Router {
    Router::new()
        .route("/transaction/process", post(create_transaction))
        .route("/transaction/balance-unlock-operations", get(list_conversions))
        .route("/transaction/{id}", get(get_transaction))
        .route("/rates/payment_method_rate", get(get_rate))
        .layer(middleware::from_fn(require_credentials))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_db(listener, Db::default()).await
}

pub async fn run_with_db(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_db(db)).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

async fn require_credentials(headers: HeaderMap, request: Request, next: Next) -> Response {
    let merchant = headers.get("X-MerchantId").and_then(|v| v.to_str().ok());
    let secret = headers.get("X-Secret").and_then(|v| v.to_str().ok());
    if merchant != Some(MERCHANT_ID) || secret != Some(SECRET) {
        tracing::warn!("rejected request with bad credentials");
        return error(StatusCode::UNAUTHORIZED, "invalid merchant credentials");
    }
    next.run(request).await
}

fn method_name(code: u8) -> Option<&'static str> {
    match code {
        2 => Some("SBP QR"),
        10 => Some("Cards RUB"),
        11 => Some("Card acquiring"),
        12 => Some("International acquiring"),
        13 => Some("Cryptocurrency"),
        _ => None,
    }
}

fn rate(from: &str, to: &str) -> Option<f64> {
    match (from, to) {
        ("RUB", "USDT") => Some(0.0108),
        ("USDT", "RUB") => Some(92.5),
        ("RUB", "RUB") | ("USDT", "USDT") => Some(1.0),
        _ => None,
    }
}

async fn create_transaction(State(db): State<Db>, Json(input): Json<CreateTransaction>) -> Response {
    let Some(method) = method_name(input.payment_method) else {
        return error(StatusCode::BAD_REQUEST, "unknown payment method");
    };
    if input.payment_details.amount <= 0.0 {
        return error(StatusCode::BAD_REQUEST, "amount must be positive");
    }

    let tx = Transaction {
        id: Uuid::new_v4(),
        status: "PENDING".to_string(),
        payment_method: input.payment_method,
        amount: input.payment_details.amount,
        currency: input.payment_details.currency,
        description: input.description,
        return_url: input.return_url,
        failed_url: input.failed_url,
        payload: input.payload,
    };
    db.write().await.transactions.insert(tx.id, tx.clone());
    tracing::info!(id = %tx.id, "transaction created");

    Json(json!({
        "paymentMethod": method,
        "transactionId": tx.id,
        "redirect": format!("https://pay.platega.io/{}", tx.id),
        "return": tx.return_url,
        "paymentDetails": { "amount": tx.amount, "currency": tx.currency },
        "status": tx.status,
        "expiresIn": "00:15:00",
        "merchantId": MERCHANT_ID,
        "usdtRate": rate("USDT", "RUB"),
    }))
    .into_response()
}

async fn get_transaction(State(db): State<Db>, Path(id): Path<Uuid>) -> Response {
    let store = db.read().await;
    let Some(tx) = store.transactions.get(&id) else {
        return error(StatusCode::NOT_FOUND, "transaction not found");
    };
    let usdt = rate(&tx.currency, "USDT").unwrap_or(0.0);
    let commission = (tx.amount * 0.02 * 100.0).round() / 100.0;
    let qr = (tx.payment_method == 2).then(|| format!("https://qr.nspk.ru/{}", tx.id.simple()));

    Json(json!({
        "id": tx.id,
        "status": tx.status,
        "paymentDetails": { "amount": tx.amount, "currency": tx.currency },
        "merchantName": "Mock Merchant",
        "mechantId": MERCHANT_ID,
        "comission": commission,
        "paymentMethod": method_name(tx.payment_method),
        "expiresIn": "00:15:00",
        "return": tx.return_url,
        "comissionUsdt": commission * usdt,
        "amountUsdt": tx.amount * usdt,
        "qr": qr,
        "payformSuccessUrl": tx.return_url,
        "payload": tx.payload,
        "comissionType": 0,
        "externalId": Value::Null,
        "description": tx.description,
    }))
    .into_response()
}

async fn get_rate(headers: HeaderMap, Query(query): Query<RateQuery>) -> Response {
    let caller = headers.get("X-MerchantId").and_then(|v| v.to_str().ok());
    if caller != Some(query.merchant_id.as_str()) {
        return error(StatusCode::BAD_REQUEST, "merchantId does not match credentials");
    }
    if method_name(query.payment_method).is_none() {
        return error(StatusCode::BAD_REQUEST, "unknown payment method");
    }
    let Some(rate) = rate(&query.currency_from, &query.currency_to) else {
        return error(StatusCode::BAD_REQUEST, "unsupported currency pair");
    };

    Json(json!({
        "paymentMethod": query.payment_method,
        "currencyFrom": query.currency_from,
        "currencyTo": query.currency_to,
        "rate": rate,
        "updatedAt": Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
    }))
    .into_response()
}

async fn list_conversions(State(db): State<Db>, Query(query): Query<ConversionsQuery>) -> Response {
    if query.page == 0 || query.size == 0 {
        return error(StatusCode::BAD_REQUEST, "page and size must be positive");
    }

    let store = db.read().await;
    let mut matching: Vec<&Conversion> = store
        .conversions
        .iter()
        .filter(|c| c.created_at >= query.from && c.created_at <= query.to)
        .collect();
    matching.sort_by_key(|c| c.created_at);

    let skip = (query.page as usize - 1) * query.size as usize;
    let items: Vec<&Conversion> = matching.iter().skip(skip).take(query.size as usize).copied().collect();

    Json(json!({
        "items": items,
        "total": matching.len(),
        "page": query.page,
        "size": query.size,
    }))
    .into_response()
}
