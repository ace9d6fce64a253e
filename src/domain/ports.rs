use super::call::CallRequest;
use super::response::ResponseFields;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Delivers one built request to the gateway and returns the reply fields.
///
/// Implementations own the wire format and network concerns. A failure to
/// obtain a reply must surface as `Err`, never as empty success fields.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn dispatch(&self, request: CallRequest) -> Result<ResponseFields>;
}

pub type SharedTransport = Arc<dyn Transport>;
