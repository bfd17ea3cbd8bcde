//! Typed facade over the Platega REST API.
//!
//! # Design
//! `PlategaClient` validates arguments, shapes paths, query strings and
//! bodies, then hands off to the [`Pipeline`]. Validation failures return
//! `PlategaError::InvalidArgument` without touching the transport.
//!
//! Every operation comes in two forms: the plain one runs to completion, the
//! `*_with_cancel` one stops early when its `CancellationToken` fires.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::{ClientConfig, Credentials};
use crate::error::{ApiError, PlategaError, Result};
use crate::http::Transport;
use crate::pipeline::Pipeline;
use crate::transport::ReqwestTransport;
use crate::types::{
    ConversionsResponse, CreateTransactionRequest, CreateTransactionResponse, GetConversionsRequest,
    GetRateRequest, RateResponse, TransactionStatusResponse,
};

const PATH_CREATE_TRANSACTION: &str = "transaction/process";
const PATH_TRANSACTION: &str = "transaction";
const PATH_RATE: &str = "rates/payment_method_rate";
const PATH_CONVERSIONS: &str = "transaction/balance-unlock-operations";

/// Query timestamps: UTC, second precision, literal `Z`.
const QUERY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Async client for one merchant account.
///
/// Cloning is cheap and clones share the transport. The client holds no
/// mutable state, so concurrent calls are independent.
#[derive(Debug, Clone)]
pub struct PlategaClient {
    pipeline: Pipeline,
}

impl PlategaClient {
    /// Build a client that owns a reqwest transport with `config.timeout`.
    pub fn new(config: ClientConfig, credentials: Credentials) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout).map_err(ApiError::transport)?;
        Ok(Self::with_transport(config, credentials, Arc::new(transport)))
    }

    /// Build a client over a caller-managed transport. `config.timeout` is
    /// not applied; the transport owns its own timeouts.
    pub fn with_transport(
        config: ClientConfig,
        credentials: Credentials,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            pipeline: Pipeline::new(&config.base_url, credentials, transport),
        }
    }

    pub fn merchant_id(&self) -> &str {
        self.pipeline.credentials().merchant_id()
    }

    pub fn base_url(&self) -> &str {
        self.pipeline.base_url()
    }

    /// Create a payment transaction.
    pub async fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
    ) -> Result<CreateTransactionResponse> {
        self.create_transaction_with_cancel(request, &CancellationToken::new())
            .await
    }

    pub async fn create_transaction_with_cancel(
        &self,
        request: &CreateTransactionRequest,
        cancel: &CancellationToken,
    ) -> Result<CreateTransactionResponse> {
        self.pipeline
            .post(PATH_CREATE_TRANSACTION, request, cancel)
            .await
    }

    /// Fetch the current status of a transaction.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `transaction_id` is the nil UUID.
    pub async fn get_transaction_status(
        &self,
        transaction_id: Uuid,
    ) -> Result<TransactionStatusResponse> {
        self.get_transaction_status_with_cancel(transaction_id, &CancellationToken::new())
            .await
    }

    pub async fn get_transaction_status_with_cancel(
        &self,
        transaction_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<TransactionStatusResponse> {
        if transaction_id.is_nil() {
            return Err(PlategaError::invalid_argument(
                "transaction_id",
                "transaction id cannot be empty",
            ));
        }
        let path = format!("{PATH_TRANSACTION}/{transaction_id}");
        self.pipeline.get(&path, &[], cancel).await
    }

    /// Look up the exchange rate for a payment method and currency pair.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when either currency is blank.
    pub async fn get_rate(&self, request: &GetRateRequest) -> Result<RateResponse> {
        self.get_rate_with_cancel(request, &CancellationToken::new())
            .await
    }

    pub async fn get_rate_with_cancel(
        &self,
        request: &GetRateRequest,
        cancel: &CancellationToken,
    ) -> Result<RateResponse> {
        let query = self.rate_query(request)?;
        self.pipeline.get(PATH_RATE, &query, cancel).await
    }

    /// List balance-unlock (conversion) operations in a time window.
    pub async fn get_conversions(
        &self,
        request: &GetConversionsRequest,
    ) -> Result<ConversionsResponse> {
        self.get_conversions_with_cancel(request, &CancellationToken::new())
            .await
    }

    pub async fn get_conversions_with_cancel(
        &self,
        request: &GetConversionsRequest,
        cancel: &CancellationToken,
    ) -> Result<ConversionsResponse> {
        let query = conversions_query(request);
        self.pipeline.get(PATH_CONVERSIONS, &query, cancel).await
    }

    fn rate_query(&self, request: &GetRateRequest) -> Result<Vec<(&'static str, String)>> {
        if request.currency_from.trim().is_empty() {
            return Err(PlategaError::invalid_argument(
                "currency_from",
                "currency_from cannot be empty",
            ));
        }
        if request.currency_to.trim().is_empty() {
            return Err(PlategaError::invalid_argument(
                "currency_to",
                "currency_to cannot be empty",
            ));
        }
        Ok(vec![
            ("merchantId", self.merchant_id().to_string()),
            ("paymentMethod", request.payment_method.code().to_string()),
            ("currencyFrom", request.currency_from.clone()),
            ("currencyTo", request.currency_to.clone()),
        ])
    }
}

fn conversions_query(request: &GetConversionsRequest) -> Vec<(&'static str, String)> {
    vec![
        ("from", request.from.format(QUERY_TIME_FORMAT).to_string()),
        ("to", request.to.format(QUERY_TIME_FORMAT).to_string()),
        ("page", request.page.to_string()),
        ("size", request.size.to_string()),
    ]
}
