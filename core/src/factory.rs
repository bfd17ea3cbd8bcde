//! Clients for several merchant accounts over one transport.

use std::fmt;
use std::sync::Arc;

use crate::client::PlategaClient;
use crate::config::{ClientConfig, Credentials};
use crate::error::{ApiError, Result};
use crate::http::Transport;
use crate::transport::ReqwestTransport;

/// Hands out [`PlategaClient`]s that share one connection pool.
#[derive(Clone)]
pub struct ClientFactory {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl ClientFactory {
    /// Own a reqwest transport built from `config`. It is released when the
    /// factory and every client it created are dropped.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout).map_err(ApiError::transport)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Share a caller-managed transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// # Errors
    ///
    /// `InvalidArgument` when either value is blank.
    pub fn create_client(
        &self,
        merchant_id: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<PlategaClient> {
        let credentials = Credentials::new(merchant_id, secret)?;
        Ok(PlategaClient::with_transport(
            self.config.clone(),
            credentials,
            Arc::clone(&self.transport),
        ))
    }
}

impl fmt::Debug for ClientFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientFactory")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
