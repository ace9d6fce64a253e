use async_trait::async_trait;
use gmo_tran::application::transaction::PaymentTransaction;
use gmo_tran::domain::call::{CallRequest, ExecTranResponse};
use gmo_tran::domain::catalogue::ErrorCatalogue;
use gmo_tran::domain::context::ShopCredentials;
use gmo_tran::domain::payment::Amount;
use gmo_tran::domain::ports::Transport;
use gmo_tran::domain::response::ResponseFields;
use gmo_tran::error::{PaymentError, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const SHOP_PASS: &str = "shop-pass";

pub fn shop() -> ShopCredentials {
    ShopCredentials::new("shop", SHOP_PASS, Some("Test Shop".to_string()))
}

/// Replies with queued fields in order and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<std::result::Result<ResponseFields, String>>>,
    requests: Mutex<Vec<CallRequest>>,
}

impl ScriptedTransport {
    pub fn new<I>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = std::result::Result<ResponseFields, String>>,
    {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<CallRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn dispatch(&self, request: CallRequest) -> Result<ResponseFields> {
        self.requests.lock().unwrap().push(request);
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(fields)) => Ok(fields),
            Some(Err(reason)) => Err(PaymentError::Transport(reason)),
            None => Err(PaymentError::Transport("no scripted reply".to_string())),
        }
    }
}

pub fn fields(pairs: &[(&str, &str)]) -> ResponseFields {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn entry_ok(access_id: &str, access_pass: &str) -> std::result::Result<ResponseFields, String> {
    Ok(fields(&[("AccessID", access_id), ("AccessPass", access_pass)]))
}

pub fn exec_reply(order_id: &str) -> ExecTranResponse {
    let mut response = ExecTranResponse {
        acs: "0".to_string(),
        order_id: order_id.to_string(),
        forward: "2a99662".to_string(),
        method: "1".to_string(),
        pay_times: String::new(),
        approve: "6543210".to_string(),
        tran_id: "1610181200111111111111111111".to_string(),
        tran_date: "20261018120000".to_string(),
        check_string: String::new(),
    };
    response.check_string = response.checksum(SHOP_PASS);
    response
}

pub fn exec_fields(response: &ExecTranResponse) -> std::result::Result<ResponseFields, String> {
    Ok(fields(&[
        ("ACS", response.acs.as_str()),
        ("OrderID", response.order_id.as_str()),
        ("Forward", response.forward.as_str()),
        ("Method", response.method.as_str()),
        ("PayTimes", response.pay_times.as_str()),
        ("Approve", response.approve.as_str()),
        ("TranID", response.tran_id.as_str()),
        ("TranDate", response.tran_date.as_str()),
        ("CheckString", response.check_string.as_str()),
    ]))
}

pub fn gateway_error(short_code: &str, detail_codes: &str) -> std::result::Result<ResponseFields, String> {
    Ok(fields(&[("ErrCode", short_code), ("ErrInfo", detail_codes)]))
}

pub fn authorization(transport: Arc<dyn Transport>, order_id: &str) -> PaymentTransaction {
    authorization_with(transport, order_id, ErrorCatalogue::builtin().unwrap())
}

pub fn authorization_with(
    transport: Arc<dyn Transport>,
    order_id: &str,
    catalogue: ErrorCatalogue,
) -> PaymentTransaction {
    let mut payment = PaymentTransaction::new(shop(), transport, Arc::new(catalogue));
    payment.payment_id = Some(order_id.to_string());
    payment.amount = Some(Amount::new(4999).unwrap());
    payment.token = Some("tok_valid".to_string());
    payment
}
