//! Verify request building and response classification against the JSON
//! test vectors stored in `test-vectors/`.
//!
//! Request vectors drive the public client through a recording transport and
//! compare the captured `HttpRequest`. Response vectors feed a canned
//! `HttpResponse` to `get_transaction_status`. Bodies are compared as parsed
//! JSON so field ordering does not matter.

mod common;

use common::{client, StubTransport};
use platega_core::{
    ApiErrorKind, CreateTransactionRequest, GetConversionsRequest, GetRateRequest, HttpMethod,
    HttpRequest, PaymentMethod, PaymentStatus,
};
use serde_json::Value;
use uuid::Uuid;

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        other => panic!("unknown method: {other}"),
    }
}

fn parse_kind(s: &str) -> ApiErrorKind {
    match s {
        "Authentication" => ApiErrorKind::Authentication,
        "Validation" => ApiErrorKind::Validation,
        "NotFound" => ApiErrorKind::NotFound,
        "Http" => ApiErrorKind::Http,
        "Generic" => ApiErrorKind::Generic,
        other => panic!("unknown error kind: {other}"),
    }
}

fn pairs(value: &Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|pair| {
            let arr = pair.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect()
}

fn query_pairs(req: &HttpRequest) -> Vec<(String, String)> {
    url::Url::parse(&req.url)
        .unwrap()
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let base_url = vectors["base_url"].as_str().unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = &case["input"];
        let expected = &case["expected_request"];

        // The canned reply is irrelevant here; only the captured request matters.
        let transport = StubTransport::respond(500, "");
        let c = client(transport.clone());

        let _ = match case["operation"].as_str().unwrap() {
            "create" => {
                let request: CreateTransactionRequest = serde_json::from_value(input.clone()).unwrap();
                c.create_transaction(&request).await.map(|_| ())
            }
            "status" => {
                let id: Uuid = input["transaction_id"].as_str().unwrap().parse().unwrap();
                c.get_transaction_status(id).await.map(|_| ())
            }
            "rate" => {
                let method = PaymentMethod::try_from(input["payment_method"].as_u64().unwrap() as u8).unwrap();
                let request = GetRateRequest::new(
                    method,
                    input["currency_from"].as_str().unwrap(),
                    input["currency_to"].as_str().unwrap(),
                );
                c.get_rate(&request).await.map(|_| ())
            }
            "conversions" => {
                let request = GetConversionsRequest::new(
                    input["from"].as_str().unwrap().parse().unwrap(),
                    input["to"].as_str().unwrap().parse().unwrap(),
                )
                .page(input["page"].as_u64().unwrap() as u32)
                .size(input["size"].as_u64().unwrap() as u32);
                c.get_conversions(&request).await.map(|_| ())
            }
            other => panic!("{name}: unknown operation {other}"),
        };

        assert_eq!(transport.calls(), 1, "{name}: transport calls");
        let req = transport.last_request().unwrap();

        assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
        let path = expected["path"].as_str().unwrap();
        assert!(
            req.url.starts_with(&format!("{base_url}{path}")),
            "{name}: url {} does not target {path}",
            req.url
        );
        assert_eq!(query_pairs(&req), pairs(&expected["query"]), "{name}: query");
        assert_eq!(req.headers, pairs(&expected["headers"]), "{name}: headers");

        match expected.get("body") {
            Some(body) => {
                let req_body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
                assert_eq!(&req_body, body, "{name}: body");
            }
            None => assert!(req.body.is_none(), "{name}: body should be None"),
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[tokio::test]
async fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let id: Uuid = "3fa85f64-5717-4562-b3fc-2c963f66afa6".parse().unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let sim = &case["simulated_response"];
        let status = sim["status"].as_u64().unwrap() as u16;
        let body = sim["body"].as_str().unwrap();

        let transport = StubTransport::respond(status, body);
        let result = client(transport).get_transaction_status(id).await;

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.expect_err(name);
            let api = err.as_api().unwrap_or_else(|| panic!("{name}: expected API error, got {err:?}"));
            assert_eq!(api.kind(), parse_kind(expected_error["kind"].as_str().unwrap()), "{name}: kind");
            assert_eq!(api.status_code(), Some(status), "{name}: status code");
            assert_eq!(api.response_body(), Some(body), "{name}: body");
        } else {
            let response = result.unwrap_or_else(|e| panic!("{name}: unexpected error {e:?}"));
            let expected = &case["expected_result"];
            let expected_status: PaymentStatus =
                serde_json::from_value(expected["status"].clone()).unwrap();
            assert_eq!(response.id, id, "{name}: id");
            assert_eq!(response.status, expected_status, "{name}: status");
            let details = response.payment_details.unwrap();
            assert_eq!(details.amount.to_string(), expected["amount"].as_str().unwrap(), "{name}: amount");
            assert_eq!(details.currency, expected["currency"].as_str().unwrap(), "{name}: currency");
        }
    }
}
