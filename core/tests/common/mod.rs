//! Shared transport doubles for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use platega_core::{
    ClientConfig, Credentials, HttpRequest, HttpResponse, PlategaClient, Transport, TransportError,
};

pub const MERCHANT_ID: &str = "merchant-test";
pub const SECRET: &str = "secret-test";

/// What a [`StubTransport`] does with each request.
#[derive(Clone)]
pub enum Reply {
    Respond { status: u16, body: String },
    Fail(TransportError),
    /// Never completes; only cancellation ends the call.
    Hang,
}

/// Counts and records requests, then applies a fixed [`Reply`].
pub struct StubTransport {
    reply: Reply,
    calls: AtomicUsize,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubTransport {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn respond(status: u16, body: &str) -> Arc<Self> {
        Self::new(Reply::Respond {
            status,
            body: body.to_string(),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        match &self.reply {
            Reply::Respond { status, body } => Ok(HttpResponse {
                status: *status,
                headers: Vec::new(),
                body: body.clone(),
            }),
            Reply::Fail(e) => Err(e.clone()),
            Reply::Hang => std::future::pending().await,
        }
    }
}

pub fn client(transport: Arc<StubTransport>) -> PlategaClient {
    PlategaClient::with_transport(
        ClientConfig::default(),
        Credentials::new(MERCHANT_ID, SECRET).unwrap(),
        transport,
    )
}
