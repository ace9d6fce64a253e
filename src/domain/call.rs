//! Remote calls against the gateway.
//!
//! Each call type carries its own request parameters and the [`CallContext`]
//! it runs under, and names the success type its reply parses into. Calls do
//! no I/O themselves; [`dispatch`] hands the built [`CallRequest`] to a
//! [`Transport`] and interprets the returned fields.

use crate::domain::context::{CallContext, Endpoint};
use crate::domain::payment::{Amount, JobCode, PaymentMethod};
use crate::domain::ports::Transport;
use crate::domain::response::Response;
use crate::error::{PaymentError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallMethod {
    EntryTran,
    ExecTran,
    AlterTran,
    SearchTrade,
}

impl CallMethod {
    pub fn path(&self) -> &'static str {
        match self {
            CallMethod::EntryTran => "EntryTran.idPass",
            CallMethod::ExecTran => "ExecTran.idPass",
            CallMethod::AlterTran => "AlterTran.idPass",
            CallMethod::SearchTrade => "SearchTrade.idPass",
        }
    }
}

impl fmt::Display for CallMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallMethod::EntryTran => "EntryTran",
            CallMethod::ExecTran => "ExecTran",
            CallMethod::AlterTran => "AlterTran",
            CallMethod::SearchTrade => "SearchTrade",
        };
        f.write_str(name)
    }
}

/// A fully built request, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub method: CallMethod,
    pub endpoint: Endpoint,
    pub params: Vec<(&'static str, String)>,
}

impl CallRequest {
    pub fn url(&self) -> String {
        format!("{}{}", self.endpoint.base_url(), self.method.path())
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

pub trait RemoteCall: Send + Sync {
    const METHOD: CallMethod;
    type Success: DeserializeOwned + Send;

    fn context(&self) -> Option<&CallContext>;

    fn set_context(&mut self, context: CallContext);

    fn with_context(mut self, context: CallContext) -> Self
    where
        Self: Sized,
    {
        self.set_context(context);
        self
    }

    /// Method specific parameters. Fails when a required one is unset.
    fn params(&self) -> Result<Vec<(&'static str, String)>>;

    fn request(&self) -> Result<CallRequest> {
        let context = self.context().ok_or(PaymentError::MissingField("shop"))?;
        let mut params = vec![
            ("ShopID", context.shop.shop_id.clone()),
            ("ShopPass", context.shop.shop_password.clone()),
        ];
        params.extend(self.params()?);
        Ok(CallRequest {
            method: Self::METHOD,
            endpoint: context.endpoint,
            params,
        })
    }
}

/// Sends `call` through `transport` and parses the reply.
pub async fn dispatch<C: RemoteCall>(
    call: &C,
    transport: &dyn Transport,
) -> Result<Response<C::Success>> {
    let request = call.request()?;
    let fields = transport.dispatch(request).await?;
    Response::from_fields(C::METHOD, fields)
}

pub(crate) fn required(name: &'static str, value: &Option<String>) -> Result<String> {
    match value {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(PaymentError::MissingField(name)),
    }
}

/// Registers a pending transaction.
#[derive(Debug, Clone)]
pub struct EntryTran {
    context: CallContext,
    pub order_id: String,
    pub job_code: JobCode,
    pub amount: Amount,
}

impl EntryTran {
    pub fn new(context: CallContext, order_id: impl Into<String>, amount: Amount) -> Self {
        Self {
            context,
            order_id: order_id.into(),
            job_code: JobCode::Auth,
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTranResponse {
    #[serde(rename = "AccessID")]
    pub access_id: String,
    #[serde(rename = "AccessPass")]
    pub access_pass: String,
}

impl RemoteCall for EntryTran {
    const METHOD: CallMethod = CallMethod::EntryTran;
    type Success = EntryTranResponse;

    fn context(&self) -> Option<&CallContext> {
        Some(&self.context)
    }

    fn set_context(&mut self, context: CallContext) {
        self.context = context;
    }

    fn params(&self) -> Result<Vec<(&'static str, String)>> {
        if self.order_id.is_empty() {
            return Err(PaymentError::MissingField("OrderID"));
        }
        Ok(vec![
            ("OrderID", self.order_id.clone()),
            ("JobCd", self.job_code.to_string()),
            ("Amount", self.amount.to_string()),
        ])
    }
}

/// Completes a registered transaction with a card token.
#[derive(Debug, Clone)]
pub struct ExecTran {
    context: CallContext,
    pub order_id: String,
    pub access_id: Option<String>,
    pub access_pass: Option<String>,
    pub method: PaymentMethod,
    pub token: Option<String>,
}

impl ExecTran {
    pub fn new(context: CallContext, order_id: impl Into<String>) -> Self {
        Self {
            context,
            order_id: order_id.into(),
            access_id: None,
            access_pass: None,
            method: PaymentMethod::default(),
            token: None,
        }
    }

    /// Copies the access credentials issued by the entry step.
    pub fn set_access(&mut self, entry: &EntryTranResponse) {
        self.access_id = Some(entry.access_id.clone());
        self.access_pass = Some(entry.access_pass.clone());
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Checks `CheckString` against the MD5 of the reply fields and the
    /// shop password this call was sent with.
    pub fn verify_response(&self, response: &ExecTranResponse) -> bool {
        let expected = response.checksum(&self.context.shop.shop_password);
        expected.eq_ignore_ascii_case(&response.check_string)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecTranResponse {
    #[serde(rename = "ACS", default)]
    pub acs: String,
    #[serde(rename = "OrderID")]
    pub order_id: String,
    #[serde(rename = "Forward", default)]
    pub forward: String,
    #[serde(rename = "Method", default)]
    pub method: String,
    #[serde(rename = "PayTimes", default)]
    pub pay_times: String,
    #[serde(rename = "Approve", default)]
    pub approve: String,
    #[serde(rename = "TranID", default)]
    pub tran_id: String,
    #[serde(rename = "TranDate", default)]
    pub tran_date: String,
    #[serde(rename = "CheckString")]
    pub check_string: String,
}

impl ExecTranResponse {
    /// Lowercase hex MD5 over the reply fields followed by the shop password.
    pub fn checksum(&self, shop_password: &str) -> String {
        let input = [
            self.order_id.as_str(),
            self.forward.as_str(),
            self.method.as_str(),
            self.pay_times.as_str(),
            self.approve.as_str(),
            self.tran_id.as_str(),
            self.tran_date.as_str(),
            shop_password,
        ]
        .concat();
        hex::encode(md5::compute(input.as_bytes()).0)
    }
}

impl RemoteCall for ExecTran {
    const METHOD: CallMethod = CallMethod::ExecTran;
    type Success = ExecTranResponse;

    fn context(&self) -> Option<&CallContext> {
        Some(&self.context)
    }

    fn set_context(&mut self, context: CallContext) {
        self.context = context;
    }

    fn params(&self) -> Result<Vec<(&'static str, String)>> {
        if self.order_id.is_empty() {
            return Err(PaymentError::MissingField("OrderID"));
        }
        let mut params = vec![
            ("AccessID", required("AccessID", &self.access_id)?),
            ("AccessPass", required("AccessPass", &self.access_pass)?),
            ("OrderID", self.order_id.clone()),
            ("Method", self.method.code().to_string()),
        ];
        if let Some(times) = self.method.pay_times() {
            params.push(("PayTimes", times.to_string()));
        }
        params.push(("Token", required("Token", &self.token)?));
        Ok(params)
    }
}

/// Changes the state of an existing transaction.
#[derive(Debug, Clone)]
pub struct AlterTran {
    context: CallContext,
    pub access_id: String,
    pub access_pass: String,
    pub job_code: JobCode,
}

impl AlterTran {
    pub fn new(
        context: CallContext,
        access_id: impl Into<String>,
        access_pass: impl Into<String>,
        job_code: JobCode,
    ) -> Self {
        Self {
            context,
            access_id: access_id.into(),
            access_pass: access_pass.into(),
            job_code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlterTranResponse {
    #[serde(rename = "AccessID")]
    pub access_id: String,
    #[serde(rename = "AccessPass")]
    pub access_pass: String,
    #[serde(rename = "Forward", default)]
    pub forward: String,
    #[serde(rename = "Approve", default)]
    pub approve: String,
    #[serde(rename = "TranID", default)]
    pub tran_id: String,
    #[serde(rename = "TranDate", default)]
    pub tran_date: String,
}

impl RemoteCall for AlterTran {
    const METHOD: CallMethod = CallMethod::AlterTran;
    type Success = AlterTranResponse;

    fn context(&self) -> Option<&CallContext> {
        Some(&self.context)
    }

    fn set_context(&mut self, context: CallContext) {
        self.context = context;
    }

    fn params(&self) -> Result<Vec<(&'static str, String)>> {
        if self.access_id.is_empty() {
            return Err(PaymentError::MissingField("AccessID"));
        }
        if self.access_pass.is_empty() {
            return Err(PaymentError::MissingField("AccessPass"));
        }
        Ok(vec![
            ("AccessID", self.access_id.clone()),
            ("AccessPass", self.access_pass.clone()),
            ("JobCd", self.job_code.to_string()),
        ])
    }
}

/// Looks up a transaction by order id.
///
/// Built without a context; pass it through
/// `PaymentTransaction::setup_other` before dispatching.
#[derive(Debug, Clone)]
pub struct SearchTrade {
    context: Option<CallContext>,
    pub order_id: String,
}

impl SearchTrade {
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            context: None,
            order_id: order_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTradeResponse {
    #[serde(rename = "OrderID")]
    pub order_id: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "ProcessDate", default)]
    pub process_date: String,
    #[serde(rename = "JobCd", default)]
    pub job_code: String,
    #[serde(rename = "AccessID", default)]
    pub access_id: String,
    #[serde(rename = "AccessPass", default)]
    pub access_pass: String,
    #[serde(rename = "Amount", default)]
    pub amount: String,
    #[serde(rename = "Forward", default)]
    pub forward: String,
    #[serde(rename = "Method", default)]
    pub method: String,
    #[serde(rename = "PayTimes", default)]
    pub pay_times: String,
    #[serde(rename = "Approve", default)]
    pub approve: String,
    #[serde(rename = "TranID", default)]
    pub tran_id: String,
}

impl RemoteCall for SearchTrade {
    const METHOD: CallMethod = CallMethod::SearchTrade;
    type Success = SearchTradeResponse;

    fn context(&self) -> Option<&CallContext> {
        self.context.as_ref()
    }

    fn set_context(&mut self, context: CallContext) {
        self.context = Some(context);
    }

    fn params(&self) -> Result<Vec<(&'static str, String)>> {
        if self.order_id.is_empty() {
            return Err(PaymentError::MissingField("OrderID"));
        }
        Ok(vec![("OrderID", self.order_id.clone())])
    }
}
