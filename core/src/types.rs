//! Domain DTOs for the Platega API.
//!
//! # Design
//! Wire keys are pinned with `#[serde(rename)]` and follow the live API
//! byte-for-byte, including its spellings (`return`, `mechantId`,
//! `comission`). Response types only deserialize, and always through
//! [`crate::json`] so object keys match case-insensitively.
//!
//! Request-side enums travel as numbers, response-side enums as uppercase
//! tokens matched case-sensitively. Money is `Decimal` and travels as a JSON
//! number written and read digit for digit.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, PlategaError};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Payment methods accepted by Platega. Serialized as the numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PaymentMethod {
    /// SBP via NSPK QR code.
    SbpQr = 2,
    /// Russian cards (MIR, Visa, Mastercard).
    CardsRub = 10,
    CardAcquiring = 11,
    InternationalAcquiring = 12,
    Cryptocurrency = 13,
}

impl PaymentMethod {
    /// Numeric wire id.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl From<PaymentMethod> for u8 {
    fn from(method: PaymentMethod) -> Self {
        method.code()
    }
}

/// Returned when a numeric id does not name a known [`PaymentMethod`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown payment method id {0}")]
pub struct UnknownPaymentMethod(pub u8);

impl TryFrom<u8> for PaymentMethod {
    type Error = UnknownPaymentMethod;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            2 => Ok(Self::SbpQr),
            10 => Ok(Self::CardsRub),
            11 => Ok(Self::CardAcquiring),
            12 => Ok(Self::InternationalAcquiring),
            13 => Ok(Self::Cryptocurrency),
            other => Err(UnknownPaymentMethod(other)),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Transaction lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    None,
    Created,
    /// Awaiting payment from the payer.
    Pending,
    /// Being processed by the payment system.
    InProgress,
    Failed,
    /// Payment window elapsed without payment.
    Expired,
    Canceled,
    Confirmed,
    Refunded,
    /// Disputed by the payer's bank.
    Chargebacked,
}

impl PaymentStatus {
    /// Whether no further transition is expected for this transaction.
    pub fn is_final(self) -> bool {
        matches!(
            self,
            Self::Failed
                | Self::Expired
                | Self::Canceled
                | Self::Confirmed
                | Self::Refunded
                | Self::Chargebacked
        )
    }
}

/// Status values delivered in webhook callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallbackStatus {
    Confirmed,
    Canceled,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Amount and currency of a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    #[serde(rename = "amount", with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    #[serde(rename = "currency")]
    pub currency: String,
}

/// Body of `POST transaction/process`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    #[serde(rename = "paymentMethod")]
    pub payment_method: PaymentMethod,
    #[serde(rename = "paymentDetails")]
    pub payment_details: PaymentDetails,
    #[serde(rename = "description")]
    pub description: String,
    /// Where the payer lands after a successful payment.
    #[serde(rename = "return")]
    pub return_url: String,
    #[serde(rename = "failedUrl", skip_serializing_if = "Option::is_none")]
    pub failed_url: Option<String>,
    /// Opaque merchant data echoed back in status responses and callbacks.
    #[serde(rename = "payload", skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

/// Parameters of `GET rates/payment_method_rate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRateRequest {
    pub payment_method: PaymentMethod,
    pub currency_from: String,
    pub currency_to: String,
}

impl GetRateRequest {
    pub fn new(
        payment_method: PaymentMethod,
        currency_from: impl Into<String>,
        currency_to: impl Into<String>,
    ) -> Self {
        Self {
            payment_method,
            currency_from: currency_from.into(),
            currency_to: currency_to.into(),
        }
    }
}

/// Parameters of `GET transaction/balance-unlock-operations`.
///
/// Pages are 1-based. Neither `page` nor `size` is validated client-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetConversionsRequest {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub page: u32,
    pub size: u32,
}

impl GetConversionsRequest {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_SIZE: u32 = 20;

    /// First page of 20 items for the given window.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from,
            to,
            page: Self::DEFAULT_PAGE,
            size: Self::DEFAULT_SIZE,
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Returned by `POST transaction/process`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateTransactionResponse {
    /// Human-readable payment method name.
    #[serde(rename = "paymentMethod", default)]
    pub payment_method: Option<String>,
    #[serde(rename = "transactionId", deserialize_with = "non_nil_uuid")]
    pub transaction_id: Uuid,
    /// Payment page the payer should be sent to.
    #[serde(rename = "redirect", default)]
    pub redirect: Option<String>,
    #[serde(rename = "return", default)]
    pub return_url: Option<String>,
    /// Left as raw JSON; the API does not pin its shape.
    #[serde(rename = "paymentDetails", default)]
    pub payment_details: Option<serde_json::Value>,
    #[serde(rename = "status")]
    pub status: PaymentStatus,
    /// Remaining payment window as `HH:MM:SS`.
    #[serde(rename = "expiresIn", default)]
    pub expires_in: Option<String>,
    #[serde(rename = "merchantId", default)]
    pub merchant_id: Option<Uuid>,
    #[serde(rename = "usdtRate", default)]
    pub usdt_rate: Option<Decimal>,
}

/// Returned by `GET transaction/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionStatusResponse {
    #[serde(rename = "id", deserialize_with = "non_nil_uuid")]
    pub id: Uuid,
    #[serde(rename = "status")]
    pub status: PaymentStatus,
    #[serde(rename = "paymentDetails", default)]
    pub payment_details: Option<PaymentDetails>,
    #[serde(rename = "merchantName", default)]
    pub merchant_name: Option<String>,
    #[serde(rename = "mechantId", default)]
    pub merchant_id: Option<Uuid>,
    #[serde(rename = "comission", default)]
    pub commission: Option<Decimal>,
    #[serde(rename = "paymentMethod", default)]
    pub payment_method: Option<String>,
    #[serde(rename = "expiresIn", default)]
    pub expires_in: Option<String>,
    #[serde(rename = "return", default)]
    pub return_url: Option<String>,
    #[serde(rename = "comissionUsdt", default)]
    pub commission_usdt: Option<Decimal>,
    #[serde(rename = "amountUsdt", default)]
    pub amount_usdt: Option<Decimal>,
    /// QR payload or image URL for QR-based methods.
    #[serde(rename = "qr", default)]
    pub qr: Option<String>,
    #[serde(rename = "payformSuccessUrl", default)]
    pub payform_success_url: Option<String>,
    #[serde(rename = "payload", default)]
    pub payload: Option<String>,
    #[serde(rename = "comissionType", default)]
    pub commission_type: Option<i32>,
    #[serde(rename = "externalId", default)]
    pub external_id: Option<String>,
    #[serde(rename = "description", default)]
    pub description: Option<String>,
}

/// Returned by `GET rates/payment_method_rate`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RateResponse {
    /// Numeric payment method id as reported by the server.
    #[serde(rename = "paymentMethod")]
    pub payment_method: i32,
    #[serde(rename = "currencyFrom")]
    pub currency_from: String,
    #[serde(rename = "currencyTo")]
    pub currency_to: String,
    #[serde(rename = "rate")]
    pub rate: Decimal,
    #[serde(rename = "updatedAt", default, deserialize_with = "lenient_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One page of balance-unlock operations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConversionsResponse {
    #[serde(rename = "items", default)]
    pub items: Vec<ConversionItem>,
    #[serde(rename = "total", default)]
    pub total: Option<u64>,
    #[serde(rename = "page", default)]
    pub page: Option<u32>,
    #[serde(rename = "size", default)]
    pub size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConversionItem {
    #[serde(rename = "id", default)]
    pub id: Option<Uuid>,
    #[serde(rename = "amount", default)]
    pub amount: Option<Decimal>,
    #[serde(rename = "currency", default)]
    pub currency: Option<String>,
    #[serde(rename = "createdAt", default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Inbound webhook body sent by Platega when a transaction settles.
///
/// Authenticity is not verified here; the payload is trusted as delivered.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CallbackPayload {
    #[serde(rename = "id", deserialize_with = "non_nil_uuid")]
    pub id: Uuid,
    #[serde(rename = "amount")]
    pub amount: Decimal,
    #[serde(rename = "currency")]
    pub currency: String,
    #[serde(rename = "status")]
    pub status: CallbackStatus,
    #[serde(rename = "paymentMethod")]
    pub payment_method: i32,
    #[serde(rename = "payload", default)]
    pub payload: Option<String>,
}

impl CallbackPayload {
    /// Parse a raw callback body with the same JSON rules as API responses.
    pub fn from_json(body: &str) -> Result<Self, PlategaError> {
        match crate::json::from_str::<Self>(body) {
            Ok(Some(payload)) => Ok(payload),
            Ok(None) => Err(ApiError::unparsable(None, body, "callback payload is null").into()),
            Err(e) => Err(ApiError::unparsable(
                None,
                body,
                format!("failed to parse callback payload: {e}"),
            )
            .into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn non_nil_uuid<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Uuid, D::Error> {
    let id = Uuid::deserialize(deserializer)?;
    if id.is_nil() {
        return Err(serde::de::Error::custom("identifier must not be the nil UUID"));
    }
    Ok(id)
}

/// Accepts RFC 3339 timestamps as well as offset-less ones, which are read as UTC.
fn lenient_datetime<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    raw.parse::<chrono::NaiveDateTime>()
        .map(|naive| Some(naive.and_utc()))
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn parse<T: serde::de::DeserializeOwned>(json: &str) -> T {
        crate::json::from_str(json).unwrap().unwrap()
    }

    #[test]
    fn create_request_serializes_wire_keys_and_numeric_method() {
        let request = CreateTransactionRequest {
            payment_method: PaymentMethod::SbpQr,
            payment_details: PaymentDetails {
                amount: dec!(1500.50),
                currency: "RUB".to_string(),
            },
            description: "Order #42".to_string(),
            return_url: "https://shop.example/ok".to_string(),
            failed_url: None,
            payload: Some("order-42".to_string()),
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["paymentMethod"], 2);
        assert!(body["paymentDetails"]["amount"].is_number());
        assert_eq!(body["paymentDetails"]["amount"], 1500.5);
        assert_eq!(body["paymentDetails"]["currency"], "RUB");
        assert_eq!(body["return"], "https://shop.example/ok");
        assert_eq!(body["payload"], "order-42");
        assert!(body.get("failedUrl").is_none());
    }

    #[test]
    fn large_request_amount_is_written_exactly() {
        let details = PaymentDetails {
            amount: dec!(12345678901234567.89),
            currency: "RUB".to_string(),
        };
        let body = crate::json::to_string(&details).unwrap();
        assert_eq!(body, r#"{"amount":12345678901234567.89,"currency":"RUB"}"#);
    }

    #[test]
    fn high_precision_amounts_and_rates_are_read_exactly() {
        let rate: RateResponse = parse(
            r#"{"paymentMethod":13,"currencyFrom":"RUB","currencyTo":"USDT","rate":0.01081234567890123456}"#,
        );
        assert_eq!(rate.rate, dec!(0.01081234567890123456));

        let status: TransactionStatusResponse = parse(
            r#"{"id":"3fa85f64-5717-4562-b3fc-2c963f66afa6","status":"PENDING","paymentDetails":{"amount":12345678901234567.89,"currency":"RUB"},"comission":0.000000000000000001}"#,
        );
        assert_eq!(status.payment_details.unwrap().amount, dec!(12345678901234567.89));
        assert_eq!(status.commission, Some(dec!(0.000000000000000001)));
    }

    #[test]
    fn payment_method_codes() {
        assert_eq!(PaymentMethod::SbpQr.code(), 2);
        assert_eq!(PaymentMethod::CardsRub.code(), 10);
        assert_eq!(PaymentMethod::Cryptocurrency.code(), 13);
        assert_eq!(PaymentMethod::try_from(12u8), Ok(PaymentMethod::InternationalAcquiring));
        assert_eq!(PaymentMethod::try_from(3u8), Err(UnknownPaymentMethod(3)));
    }

    #[test]
    fn status_tokens_are_uppercase() {
        let parsed: PaymentStatus = serde_json::from_str(r#""INPROGRESS""#).unwrap();
        assert_eq!(parsed, PaymentStatus::InProgress);
        let parsed: PaymentStatus = serde_json::from_str(r#""CHARGEBACKED""#).unwrap();
        assert_eq!(parsed, PaymentStatus::Chargebacked);
    }

    #[test]
    fn status_tokens_are_case_sensitive() {
        assert!(serde_json::from_str::<PaymentStatus>(r#""confirmed""#).is_err());
        assert!(serde_json::from_str::<PaymentStatus>(r#""SETTLED""#).is_err());
    }

    #[test]
    fn final_statuses() {
        assert!(PaymentStatus::Confirmed.is_final());
        assert!(PaymentStatus::Expired.is_final());
        assert!(!PaymentStatus::Pending.is_final());
        assert!(!PaymentStatus::InProgress.is_final());
    }

    #[test]
    fn status_response_reads_live_spellings() {
        let response: TransactionStatusResponse = parse(
            r#"{
                "id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
                "status": "CONFIRMED",
                "paymentDetails": {"amount": 100.25, "currency": "RUB"},
                "mechantId": "9b2f0e4c-1a8d-4c6e-9f11-2b7a5d3c8e01",
                "comission": 2.5,
                "comissionUsdt": 0.03,
                "comissionType": 1,
                "return": "https://shop.example/ok"
            }"#,
        );
        assert_eq!(response.status, PaymentStatus::Confirmed);
        assert_eq!(response.payment_details.unwrap().amount, dec!(100.25));
        assert_eq!(response.commission, Some(dec!(2.5)));
        assert_eq!(response.commission_usdt, Some(dec!(0.03)));
        assert_eq!(response.commission_type, Some(1));
        assert!(response.merchant_id.is_some());
        assert_eq!(response.return_url.as_deref(), Some("https://shop.example/ok"));
        assert!(response.qr.is_none());
    }

    #[test]
    fn nil_transaction_id_is_rejected() {
        let result = crate::json::from_str::<CreateTransactionResponse>(
            r#"{"transactionId":"00000000-0000-0000-0000-000000000000","status":"PENDING"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn create_response_keeps_payment_details_opaque() {
        let response: CreateTransactionResponse = parse(
            r#"{
                "transactionId": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
                "status": "PENDING",
                "paymentDetails": {"Amount": 10, "CurrencyCode": "RUB"},
                "expiresIn": "00:15:00",
                "usdtRate": 92.41
            }"#,
        );
        let details = response.payment_details.unwrap();
        assert_eq!(details["Amount"], 10);
        assert_eq!(details["CurrencyCode"], "RUB");
        assert_eq!(response.expires_in.as_deref(), Some("00:15:00"));
        assert_eq!(response.usdt_rate, Some(dec!(92.41)));
    }

    #[test]
    fn rate_response_accepts_offsetless_timestamp() {
        let response: RateResponse = parse(
            r#"{"paymentMethod":10,"currencyFrom":"RUB","currencyTo":"USDT","rate":0.0108,"updatedAt":"2024-05-01T12:30:00"}"#,
        );
        assert_eq!(response.rate, dec!(0.0108));
        assert_eq!(
            response.updated_at.unwrap().to_rfc3339(),
            "2024-05-01T12:30:00+00:00"
        );
    }

    #[test]
    fn conversions_response_defaults_to_empty_items() {
        let response: ConversionsResponse = parse(r#"{"total":0,"page":1,"size":20}"#);
        assert!(response.items.is_empty());
        assert_eq!(response.total, Some(0));
    }

    #[test]
    fn conversions_request_defaults() {
        let from = "2024-01-01T00:00:00Z".parse().unwrap();
        let to = "2024-01-31T23:59:59Z".parse().unwrap();
        let request = GetConversionsRequest::new(from, to);
        assert_eq!(request.page, 1);
        assert_eq!(request.size, 20);
        let request = request.page(3).size(5);
        assert_eq!((request.page, request.size), (3, 5));
    }

    #[test]
    fn callback_payload_from_json() {
        let payload = CallbackPayload::from_json(
            r#"{"id":"3fa85f64-5717-4562-b3fc-2c963f66afa6","amount":500,"currency":"RUB","status":"CANCELED","paymentMethod":2}"#,
        )
        .unwrap();
        assert_eq!(payload.status, CallbackStatus::Canceled);
        assert_eq!(payload.amount, dec!(500));
        assert_eq!(payload.payment_method, 2);
        assert!(payload.payload.is_none());
    }

    #[test]
    fn callback_payload_rejects_garbage() {
        let err = CallbackPayload::from_json("not json").unwrap_err();
        let api = err.as_api().unwrap();
        assert_eq!(api.kind(), crate::ApiErrorKind::Generic);
        assert_eq!(api.status_code(), None);
        assert_eq!(api.response_body(), Some("not json"));
    }
}
