use crate::domain::call::{
    AlterTran, AlterTranResponse, EntryTran, EntryTranResponse, ExecTran, ExecTranResponse,
    RemoteCall, dispatch, required,
};
use crate::domain::catalogue::{CHECKSUM_MISMATCH, ErrorCatalogue};
use crate::domain::context::{CallContext, SandboxShop, ShopCredentials};
use crate::domain::payment::{Amount, JobCode};
use crate::domain::ports::SharedTransport;
use crate::domain::response::{ErrorResponse, Response};
use crate::error::{PaymentError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionState {
    #[default]
    Unconfigured,
    Validated,
    EntrySucceeded,
    ExecuteSucceeded,
    Altered,
    Failed,
}

/// One logical payment operation against the gateway.
///
/// Set the fields the operation needs, call [`authorize`](Self::authorize)
/// or [`cancel`](Self::cancel) once, then read the outcome through the query
/// methods. An instance performs a single operation; a retry needs a fresh
/// instance and, for authorization, a fresh `payment_id`.
pub struct PaymentTransaction {
    /// Access credentials of the transaction. Inputs for `cancel`; filled in
    /// from the entry reply by `authorize`.
    pub access_id: Option<String>,
    pub access_pass: Option<String>,
    /// Order id for `authorize`. Must be unique for the shop.
    pub payment_id: Option<String>,
    pub amount: Option<Amount>,
    /// Card token obtained beforehand from the gateway's tokenizer.
    pub token: Option<String>,
    pub job_code: Option<JobCode>,
    pub sandbox: Option<SandboxShop>,
    shop: ShopCredentials,
    transport: SharedTransport,
    catalogue: Arc<ErrorCatalogue>,
    state: TransactionState,
    context: Option<CallContext>,
    entry_response: Option<EntryTranResponse>,
    exec_response: Option<ExecTranResponse>,
    alter_response: Option<AlterTranResponse>,
    failure: Option<ErrorResponse>,
}

impl PaymentTransaction {
    pub fn new(
        shop: ShopCredentials,
        transport: SharedTransport,
        catalogue: Arc<ErrorCatalogue>,
    ) -> Self {
        Self {
            access_id: None,
            access_pass: None,
            payment_id: None,
            amount: None,
            token: None,
            job_code: None,
            sandbox: None,
            shop,
            transport,
            catalogue,
            state: TransactionState::Unconfigured,
            context: None,
            entry_response: None,
            exec_response: None,
            alter_response: None,
            failure: None,
        }
    }

    /// Registers the payment and charges the card token.
    ///
    /// Returns the execution reply on success and `Ok(None)` when the
    /// gateway rejects a step or the reply fails its checksum; the reason is
    /// then available from [`errors`](Self::errors). Missing fields are
    /// reported as `Err` before anything is sent.
    #[instrument(skip(self), fields(order_id = self.payment_id.as_deref().unwrap_or_default()))]
    pub async fn authorize(&mut self) -> Result<Option<ExecTranResponse>> {
        self.ensure_unused()?;
        let order_id = required("payment_id", &self.payment_id)?;
        let amount = self.amount.ok_or(PaymentError::MissingField("amount"))?;
        let token = required("token", &self.token)?;
        let context = self.begin();

        let entry = EntryTran::new(context.clone(), order_id.clone(), amount);
        let Some(entry_response) = self.step(&entry).await? else {
            return Ok(None);
        };
        self.access_id = Some(entry_response.access_id.clone());
        self.access_pass = Some(entry_response.access_pass.clone());
        self.entry_response = Some(entry_response.clone());
        self.state = TransactionState::EntrySucceeded;

        // The gateway correlates both steps by order id.
        let mut exec = ExecTran::new(context, order_id);
        exec.set_access(&entry_response);
        exec.set_token(token);
        let Some(exec_response) = self.step(&exec).await? else {
            return Ok(None);
        };

        if !exec.verify_response(&exec_response) {
            warn!("execution reply failed checksum verification");
            self.fail(ErrorResponse::new(
                CHECKSUM_MISMATCH,
                vec![CHECKSUM_MISMATCH.to_string()],
            ));
            return Ok(None);
        }

        info!(tran_id = %exec_response.tran_id, "payment authorized");
        self.exec_response = Some(exec_response.clone());
        self.state = TransactionState::ExecuteSucceeded;
        Ok(Some(exec_response))
    }

    /// Alters an existing transaction identified by its access credentials.
    #[instrument(skip(self), fields(job_code = ?self.job_code))]
    pub async fn cancel(&mut self) -> Result<bool> {
        self.ensure_unused()?;
        let access_id = required("access_id", &self.access_id)?;
        let access_pass = required("access_pass", &self.access_pass)?;
        let job_code = self.job_code.ok_or(PaymentError::MissingField("job_code"))?;
        let context = self.begin();

        let alter = AlterTran::new(context, access_id, access_pass, job_code);
        let Some(alter_response) = self.step(&alter).await? else {
            return Ok(false);
        };

        info!("transaction altered");
        self.alter_response = Some(alter_response);
        self.state = TransactionState::Altered;
        Ok(true)
    }

    /// The execution reply of a successful authorization.
    pub fn response(&self) -> Option<&ExecTranResponse> {
        self.exec_response.as_ref()
    }

    /// Access credentials issued at entry. Needed later to alter the
    /// transaction, so callers persist them alongside the response.
    pub fn entry_response(&self) -> Option<&EntryTranResponse> {
        self.entry_response.as_ref()
    }

    pub fn alter_response(&self) -> Option<&AlterTranResponse> {
        self.alter_response.as_ref()
    }

    pub fn error_short_code(&self) -> Option<&str> {
        self.failure.as_ref().map(|f| f.short_code.as_str())
    }

    /// Detail codes of the last failure.
    pub fn error_code(&self) -> Option<&[String]> {
        self.failure.as_ref().map(|f| f.detail_codes.as_slice())
    }

    /// Detail codes of the last failure with their catalogue descriptions.
    /// Codes the catalogue does not know map to `None`.
    pub fn errors(&self) -> BTreeMap<String, Option<String>> {
        self.error_code()
            .unwrap_or_default()
            .iter()
            .map(|code| {
                let description = self.catalogue.describe(code).map(str::to_string);
                (code.clone(), description)
            })
            .collect()
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Gives a follow-up call (a search, a refund) this transaction's shop
    /// and endpoint.
    pub fn setup_other<C: RemoteCall>(&self, call: C) -> C {
        call.with_context(self.call_context())
    }

    /// Sets up and sends a follow-up call. Its outcome is not recorded on
    /// this transaction.
    pub async fn dispatch_other<C: RemoteCall>(&self, call: C) -> Result<Response<C::Success>> {
        let call = self.setup_other(call);
        dispatch(&call, self.transport.as_ref()).await
    }

    fn call_context(&self) -> CallContext {
        self.context
            .clone()
            .unwrap_or_else(|| CallContext::resolve(&self.shop, self.sandbox.as_ref()))
    }

    fn ensure_unused(&self) -> Result<()> {
        if self.state == TransactionState::Unconfigured {
            Ok(())
        } else {
            Err(PaymentError::OperationAlreadyPerformed)
        }
    }

    fn begin(&mut self) -> CallContext {
        let context = CallContext::resolve(&self.shop, self.sandbox.as_ref());
        debug!(endpoint = ?context.endpoint, shop_id = %context.shop.shop_id, "request validated");
        self.context = Some(context.clone());
        self.state = TransactionState::Validated;
        context
    }

    /// Sends one step. `None` means the gateway answered with an error,
    /// which is recorded and ends the operation.
    async fn step<C: RemoteCall>(&mut self, call: &C) -> Result<Option<C::Success>> {
        debug!(method = %C::METHOD, "dispatching");
        let response = match dispatch(call, self.transport.as_ref()).await {
            Ok(response) => response,
            Err(e) => {
                self.state = TransactionState::Failed;
                return Err(e);
            }
        };
        match response {
            Response::Success(success) => Ok(Some(success)),
            Response::Error(error) => {
                warn!(
                    method = %C::METHOD,
                    short_code = %error.short_code,
                    detail_codes = ?error.detail_codes,
                    "gateway returned an error"
                );
                self.fail(error);
                Ok(None)
            }
        }
    }

    fn fail(&mut self, error: ErrorResponse) {
        self.failure = Some(error);
        self.state = TransactionState::Failed;
    }
}
