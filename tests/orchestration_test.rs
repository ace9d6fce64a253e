mod common;

use common::{
    ScriptedTransport, authorization, authorization_with, entry_ok, exec_fields, exec_reply,
    gateway_error,
};
use gmo_tran::application::transaction::{PaymentTransaction, TransactionState};
use gmo_tran::domain::call::CallMethod;
use gmo_tran::domain::catalogue::{CHECKSUM_MISMATCH, ErrorCatalogue};
use gmo_tran::domain::payment::JobCode;
use gmo_tran::error::PaymentError;
use std::sync::Arc;

fn cancellation(transport: Arc<ScriptedTransport>) -> PaymentTransaction {
    let mut payment = PaymentTransaction::new(
        common::shop(),
        transport,
        Arc::new(ErrorCatalogue::default()),
    );
    payment.access_id = Some("access-123".to_string());
    payment.access_pass = Some("pass-456".to_string());
    payment.job_code = Some(JobCode::Cancel);
    payment
}

#[tokio::test]
async fn test_execute_carries_order_id_and_entry_credentials() {
    let transport = ScriptedTransport::new([
        entry_ok("access-123", "pass-456"),
        exec_fields(&exec_reply("order-77")),
    ]);
    let mut payment = authorization(transport.clone(), "order-77");

    let response = payment.authorize().await.unwrap();
    assert!(response.is_some());

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, CallMethod::EntryTran);
    assert_eq!(requests[0].param("OrderID"), Some("order-77"));
    assert_eq!(requests[0].param("Amount"), Some("4999"));

    let exec = &requests[1];
    assert_eq!(exec.method, CallMethod::ExecTran);
    assert_eq!(exec.param("OrderID"), Some("order-77"));
    assert_eq!(exec.param("AccessID"), Some("access-123"));
    assert_eq!(exec.param("AccessPass"), Some("pass-456"));
    assert_eq!(exec.param("Token"), Some("tok_valid"));
    assert_eq!(exec.param("ShopID"), requests[0].param("ShopID"));
    assert_eq!(exec.endpoint, requests[0].endpoint);
}

#[tokio::test]
async fn test_entry_error_skips_execute() {
    let transport = ScriptedTransport::new([
        gateway_error("E01", "E01040010"),
        exec_fields(&exec_reply("order-1")),
    ]);
    let mut payment = authorization(transport.clone(), "order-1");

    assert!(payment.authorize().await.unwrap().is_none());

    assert_eq!(transport.requests().len(), 1);
    assert!(payment.response().is_none());
    assert!(payment.entry_response().is_none());
    assert_eq!(payment.state(), TransactionState::Failed);
}

#[tokio::test]
async fn test_checksum_mismatch_fails_authorization() {
    let mut tampered = exec_reply("order-2");
    tampered.approve = "0000000".to_string();
    let transport = ScriptedTransport::new([entry_ok("id", "pass"), exec_fields(&tampered)]);
    let mut payment = authorization(transport, "order-2");

    assert!(payment.authorize().await.unwrap().is_none());

    assert!(payment.response().is_none());
    assert_eq!(payment.state(), TransactionState::Failed);
    assert_eq!(
        payment.error_code(),
        Some([CHECKSUM_MISMATCH.to_string()].as_slice())
    );
    assert!(payment.errors()[CHECKSUM_MISMATCH].is_some());
}

#[tokio::test]
async fn test_queries_are_stable() {
    let transport = ScriptedTransport::new([gateway_error("E01|E01", "E01040010|E01060001")]);
    let mut payment = authorization(transport, "order-3");
    payment.authorize().await.unwrap();

    let first = (
        payment.response().cloned(),
        payment.error_code().map(<[String]>::to_vec),
        payment.errors(),
    );
    let second = (
        payment.response().cloned(),
        payment.error_code().map(<[String]>::to_vec),
        payment.errors(),
    );
    assert_eq!(first, second);
    assert_eq!(payment.error_short_code(), Some("E01|E01"));
}

#[tokio::test]
async fn test_errors_cover_every_detail_code() {
    let catalogue = ErrorCatalogue::from_iter([("A100", "first problem"), ("B200", "second problem")]);
    let transport = ScriptedTransport::new([gateway_error("E01", "A100|B200|Z999")]);
    let mut payment = authorization_with(transport, "order-4", catalogue);
    payment.authorize().await.unwrap();

    let errors = payment.errors();
    let keys: Vec<&String> = errors.keys().collect();
    let mut codes: Vec<&String> = payment.error_code().unwrap().iter().collect();
    codes.sort();
    assert_eq!(keys, codes);

    assert_eq!(errors["A100"].as_deref(), Some("first problem"));
    assert_eq!(errors["B200"].as_deref(), Some("second problem"));
    assert_eq!(errors["Z999"], None);
}

#[tokio::test]
async fn test_transport_failure_propagates() {
    let transport = ScriptedTransport::new([Err("connection reset".to_string())]);
    let mut payment = authorization(transport, "order-5");

    let result = payment.authorize().await;

    assert!(matches!(result, Err(PaymentError::Transport(reason)) if reason == "connection reset"));
    assert!(payment.error_code().is_none());
    assert!(payment.response().is_none());
    assert_eq!(payment.state(), TransactionState::Failed);
}

#[tokio::test]
async fn test_malformed_entry_reply_is_an_error() {
    let transport = ScriptedTransport::new([Ok(common::fields(&[("AccessID", "only-id")]))]);
    let mut payment = authorization(transport.clone(), "order-6");

    let result = payment.authorize().await;

    assert!(matches!(
        result,
        Err(PaymentError::MalformedResponse {
            method: CallMethod::EntryTran,
            ..
        })
    ));
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_missing_amount_sends_nothing() {
    let transport = ScriptedTransport::new([]);
    let mut payment = authorization(transport.clone(), "order-7");
    payment.amount = None;

    assert!(matches!(
        payment.authorize().await,
        Err(PaymentError::MissingField("amount"))
    ));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_cancel_requires_access_credentials() {
    let transport = ScriptedTransport::new([]);
    let mut payment = cancellation(transport.clone());
    payment.access_id = None;

    assert!(matches!(
        payment.cancel().await,
        Err(PaymentError::MissingField("access_id"))
    ));

    payment.access_id = Some(String::new());
    assert!(matches!(
        payment.cancel().await,
        Err(PaymentError::MissingField("access_id"))
    ));

    let mut payment = cancellation(transport.clone());
    payment.access_pass = None;
    assert!(matches!(
        payment.cancel().await,
        Err(PaymentError::MissingField("access_pass"))
    ));

    payment.access_pass = Some(String::new());
    assert!(matches!(
        payment.cancel().await,
        Err(PaymentError::MissingField("access_pass"))
    ));

    assert!(transport.requests().is_empty());
    assert_eq!(payment.state(), TransactionState::Unconfigured);
}
