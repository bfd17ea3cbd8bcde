//! Async client for the Platega payment gateway.
//!
//! # Overview
//! Exposes transaction creation, status polling, rate lookup and conversion
//! history as typed operations. Non-2xx responses become classified
//! [`ApiError`]s carrying the status code and raw body.
//!
//! # Design
//! - `PlategaClient` validates arguments and shapes requests; `Pipeline`
//!   attaches auth headers, dispatches through a [`Transport`] and parses.
//! - The transport is a trait object. `ReqwestTransport` is the default; tests
//!   substitute stubs.
//! - Response bodies are matched against wire keys case-insensitively
//!   (see [`json`]).
//! - Operations are cancellable through `tokio_util::sync::CancellationToken`;
//!   cancellation is reported as `PlategaError::Cancelled`, never as an
//!   API error.

pub mod client;
pub mod config;
pub mod error;
pub mod factory;
pub mod http;
pub mod json;
pub mod pipeline;
pub mod transport;
pub mod types;

pub use client::PlategaClient;
pub use config::{ClientConfig, ConfigError, Credentials, Settings, DEFAULT_BASE_URL};
pub use error::{ApiError, ApiErrorKind, PlategaError, Result};
pub use factory::ClientFactory;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use pipeline::{parse_response, Pipeline};
pub use transport::ReqwestTransport;
pub use types::{
    CallbackPayload, CallbackStatus, ConversionItem, ConversionsResponse, CreateTransactionRequest,
    CreateTransactionResponse, GetConversionsRequest, GetRateRequest, PaymentDetails,
    PaymentMethod, PaymentStatus, RateResponse, TransactionStatusResponse, UnknownPaymentMethod,
};

pub use tokio_util::sync::CancellationToken;
