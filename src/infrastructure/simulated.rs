use crate::domain::call::{CallMethod, CallRequest, ExecTranResponse};
use crate::domain::catalogue::{ACCESS_MISMATCH, DUPLICATE_ORDER_ID, UNKNOWN_ERROR};
use crate::domain::context::ShopCredentials;
use crate::domain::payment::JobCode;
use crate::domain::ports::Transport;
use crate::domain::response::ResponseFields;
use crate::error::Result;
use async_trait::async_trait;
use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

const UNPROCESSED: &str = "UNPROCESSED";
const FORWARD: &str = "2a99662";

#[derive(Debug, Clone)]
struct Trade {
    order_id: String,
    access_id: String,
    access_pass: String,
    amount: String,
    job_code: String,
    status: String,
    process_date: String,
    method: String,
    pay_times: String,
    approve: String,
    tran_id: String,
}

#[derive(Default)]
struct GatewayState {
    shops: HashMap<String, String>,
    tokens: HashSet<String>,
    // keyed by (shop id, order id)
    trades: HashMap<(String, String), Trade>,
    access: HashMap<String, (String, String)>,
    // `None` unless built with `recording`
    requests: Option<Vec<CallRequest>>,
}

/// An in-memory stand-in for the gateway.
///
/// Applies the gateway's observable rules (shop authentication, order id
/// uniqueness, access credential matching, card token registration, alter
/// preconditions) and answers with the same fields and error codes. A
/// gateway built with [`recording`](Self::recording) also keeps every request
/// so callers can inspect what was sent.
#[derive(Default, Clone)]
pub struct SimulatedGateway {
    state: Arc<RwLock<GatewayState>>,
}

impl SimulatedGateway {
    pub fn new<I>(shops: I) -> Self
    where
        I: IntoIterator<Item = ShopCredentials>,
    {
        Self::with_state(shops, None)
    }

    /// Like [`new`](Self::new), but keeps every request it receives.
    pub fn recording<I>(shops: I) -> Self
    where
        I: IntoIterator<Item = ShopCredentials>,
    {
        Self::with_state(shops, Some(Vec::new()))
    }

    fn with_state<I>(shops: I, requests: Option<Vec<CallRequest>>) -> Self
    where
        I: IntoIterator<Item = ShopCredentials>,
    {
        let state = GatewayState {
            shops: shops
                .into_iter()
                .map(|shop| (shop.shop_id, shop.shop_password))
                .collect(),
            requests,
            ..Default::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Makes `token` acceptable for execution.
    pub async fn register_token(&self, token: impl Into<String>) {
        self.state.write().await.tokens.insert(token.into());
    }

    /// Requests received so far, oldest first. Empty unless recording.
    pub async fn requests(&self) -> Vec<CallRequest> {
        self.state.read().await.requests.clone().unwrap_or_default()
    }
}

#[async_trait]
impl Transport for SimulatedGateway {
    async fn dispatch(&self, request: CallRequest) -> Result<ResponseFields> {
        let mut state = self.state.write().await;
        if let Some(requests) = state.requests.as_mut() {
            requests.push(request.clone());
        }
        let reply = state.handle(&request);
        debug!(
            method = %request.method,
            error = matches!(reply, Reply::Error(..)),
            "simulated reply"
        );
        reply_fields(reply)
    }
}

enum Reply {
    Fields(ResponseFields),
    Error(&'static str, &'static str),
}

fn reply_fields(reply: Reply) -> Result<ResponseFields> {
    Ok(match reply {
        Reply::Fields(fields) => fields,
        Reply::Error(short_code, detail_code) => ResponseFields::from([
            ("ErrCode".to_string(), short_code.to_string()),
            ("ErrInfo".to_string(), detail_code.to_string()),
        ]),
    })
}

fn to_fields<T: Serialize>(value: &T) -> ResponseFields {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::String(value) => Some((key, value)),
                _ => None,
            })
            .collect(),
        _ => ResponseFields::new(),
    }
}

fn fields(pairs: &[(&str, &str)]) -> ResponseFields {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn random_hex(bytes: usize) -> String {
    let mut rng = rand::thread_rng();
    let buf: Vec<u8> = (0..bytes).map(|_| rng.r#gen()).collect();
    hex::encode(buf)
}

fn random_digits(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(b'0' + rng.gen_range(0..10)))
        .collect()
}

fn now() -> String {
    chrono::Local::now().format("%Y%m%d%H%M%S").to_string()
}

macro_rules! param {
    ($request:expr, $name:literal, $missing:literal) => {
        match $request.param($name) {
            Some(value) if !value.is_empty() => value,
            _ => return Reply::Error("E01", $missing),
        }
    };
}

impl GatewayState {
    fn handle(&mut self, request: &CallRequest) -> Reply {
        let shop_id = param!(request, "ShopID", "E01010001");
        let shop_pass = param!(request, "ShopPass", "E01020001");
        match self.shops.get(shop_id) {
            Some(password) if password == shop_pass => {}
            _ => return Reply::Error("E01", "E01030002"),
        }
        let shop_id = shop_id.to_string();

        match request.method {
            CallMethod::EntryTran => self.entry(&shop_id, request),
            CallMethod::ExecTran => self.exec(&shop_id, shop_pass, request),
            CallMethod::AlterTran => self.alter(&shop_id, request),
            CallMethod::SearchTrade => self.search(&shop_id, request),
        }
    }

    fn entry(&mut self, shop_id: &str, request: &CallRequest) -> Reply {
        let order_id = param!(request, "OrderID", "E01040001");
        let job_code = param!(request, "JobCd", "E01050001");
        let amount = param!(request, "Amount", "E01060001");
        if JobCode::parse(job_code).is_none() {
            return Reply::Error("E01", "E01050002");
        }
        if !amount.chars().all(|c| c.is_ascii_digit()) {
            return Reply::Error("E01", "E01060006");
        }

        let key = (shop_id.to_string(), order_id.to_string());
        if self.trades.contains_key(&key) {
            return Reply::Error("E01", DUPLICATE_ORDER_ID);
        }

        let trade = Trade {
            order_id: order_id.to_string(),
            access_id: random_hex(16),
            access_pass: random_hex(16),
            amount: amount.to_string(),
            job_code: job_code.to_uppercase(),
            status: UNPROCESSED.to_string(),
            process_date: now(),
            method: String::new(),
            pay_times: String::new(),
            approve: String::new(),
            tran_id: String::new(),
        };
        let reply = fields(&[
            ("AccessID", trade.access_id.as_str()),
            ("AccessPass", trade.access_pass.as_str()),
        ]);
        self.access.insert(trade.access_id.clone(), key.clone());
        self.trades.insert(key, trade);
        Reply::Fields(reply)
    }

    fn authenticated(
        &mut self,
        shop_id: &str,
        request: &CallRequest,
    ) -> std::result::Result<&mut Trade, Reply> {
        let access_id = match request.param("AccessID") {
            Some(value) if !value.is_empty() => value,
            _ => return Err(Reply::Error("E01", "E01090001")),
        };
        let access_pass = match request.param("AccessPass") {
            Some(value) if !value.is_empty() => value,
            _ => return Err(Reply::Error("E01", "E01100001")),
        };
        let trade = self
            .access
            .get(access_id)
            .filter(|(owner, _)| owner == shop_id)
            .cloned()
            .and_then(|key| self.trades.get_mut(&key))
            .filter(|trade| trade.access_pass == access_pass);
        trade.ok_or(Reply::Error("E01", ACCESS_MISMATCH))
    }

    fn exec(&mut self, shop_id: &str, shop_pass: &str, request: &CallRequest) -> Reply {
        let token_registered = request
            .param("Token")
            .is_some_and(|token| self.tokens.contains(token));
        let trade = match self.authenticated(shop_id, request) {
            Ok(trade) => trade,
            Err(reply) => return reply,
        };
        let order_id = param!(request, "OrderID", "E01040001");
        if order_id != trade.order_id {
            return Reply::Error("E01", ACCESS_MISMATCH);
        }
        let method = param!(request, "Method", "E01260001");
        if method == "2" && request.param("PayTimes").is_none() {
            return Reply::Error("E01", "E01270001");
        }
        if trade.status != UNPROCESSED {
            return Reply::Error("E11", "E11010001");
        }
        if !token_registered {
            return Reply::Error("EX1", UNKNOWN_ERROR);
        }

        trade.status = trade.job_code.clone();
        trade.method = method.to_string();
        trade.pay_times = request.param("PayTimes").unwrap_or_default().to_string();
        trade.approve = random_digits(7);
        trade.tran_id = random_digits(28);
        trade.process_date = now();

        let mut response = ExecTranResponse {
            acs: "0".to_string(),
            order_id: trade.order_id.clone(),
            forward: FORWARD.to_string(),
            method: trade.method.clone(),
            pay_times: trade.pay_times.clone(),
            approve: trade.approve.clone(),
            tran_id: trade.tran_id.clone(),
            tran_date: trade.process_date.clone(),
            check_string: String::new(),
        };
        response.check_string = response.checksum(shop_pass);
        Reply::Fields(to_fields(&response))
    }

    fn alter(&mut self, shop_id: &str, request: &CallRequest) -> Reply {
        let trade = match self.authenticated(shop_id, request) {
            Ok(trade) => trade,
            Err(reply) => return reply,
        };
        let job_code = match request.param("JobCd") {
            Some(value) if !value.is_empty() => value,
            _ => return Reply::Error("E01", "E01050001"),
        };
        let Some(job_code) = JobCode::parse(job_code) else {
            return Reply::Error("E01", "E01050002");
        };
        if trade.status == UNPROCESSED {
            return Reply::Error("E11", "E11010002");
        }
        if trade.status == job_code.as_str() {
            return Reply::Error("E11", "E11010003");
        }

        trade.status = job_code.to_string();
        trade.process_date = now();
        Reply::Fields(fields(&[
            ("AccessID", trade.access_id.as_str()),
            ("AccessPass", trade.access_pass.as_str()),
            ("Forward", FORWARD),
            ("Approve", trade.approve.as_str()),
            ("TranID", trade.tran_id.as_str()),
            ("TranDate", trade.process_date.as_str()),
        ]))
    }

    fn search(&self, shop_id: &str, request: &CallRequest) -> Reply {
        let order_id = param!(request, "OrderID", "E01040001");
        let key = (shop_id.to_string(), order_id.to_string());
        let Some(trade) = self.trades.get(&key) else {
            return Reply::Error("E01", ACCESS_MISMATCH);
        };
        Reply::Fields(fields(&[
            ("OrderID", trade.order_id.as_str()),
            ("Status", trade.status.as_str()),
            ("ProcessDate", trade.process_date.as_str()),
            ("JobCd", trade.job_code.as_str()),
            ("AccessID", trade.access_id.as_str()),
            ("AccessPass", trade.access_pass.as_str()),
            ("Amount", trade.amount.as_str()),
            ("Forward", FORWARD),
            ("Method", trade.method.as_str()),
            ("PayTimes", trade.pay_times.as_str()),
            ("Approve", trade.approve.as_str()),
            ("TranID", trade.tran_id.as_str()),
        ]))
    }
}
