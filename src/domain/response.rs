use crate::domain::call::CallMethod;
use crate::error::{PaymentError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Named fields of one parsed gateway reply, as produced by a transport.
pub type ResponseFields = BTreeMap<String, String>;

const ERR_CODE: &str = "ErrCode";
const ERR_INFO: &str = "ErrInfo";
const SEPARATOR: char = '|';

/// Error reply: a category code plus one or more detail codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub short_code: String,
    pub detail_codes: Vec<String>,
}

impl ErrorResponse {
    pub fn new(short_code: impl Into<String>, detail_codes: Vec<String>) -> Self {
        Self {
            short_code: short_code.into(),
            detail_codes,
        }
    }
}

/// Outcome of one remote call. Exactly one of success or error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response<S> {
    Success(S),
    Error(ErrorResponse),
}

impl<S> Response<S> {
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }

    pub fn success(self) -> Option<S> {
        match self {
            Response::Success(success) => Some(success),
            Response::Error(_) => None,
        }
    }
}

impl<S: DeserializeOwned> Response<S> {
    /// Interprets raw reply fields for `method`.
    ///
    /// Any `ErrCode`/`ErrInfo` marks the reply as an error; otherwise the
    /// fields must deserialize into the method's success type.
    pub fn from_fields(method: CallMethod, mut fields: ResponseFields) -> Result<Self> {
        let err_code = fields.remove(ERR_CODE);
        let err_info = fields.remove(ERR_INFO);
        if err_code.is_some() || err_info.is_some() {
            let detail_codes = err_info
                .as_deref()
                .map(split_codes)
                .unwrap_or_default();
            return Ok(Response::Error(ErrorResponse::new(
                err_code.unwrap_or_default(),
                detail_codes,
            )));
        }

        let object: Map<String, Value> = fields
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();
        serde_json::from_value(Value::Object(object))
            .map(Response::Success)
            .map_err(|e| PaymentError::MalformedResponse {
                method,
                reason: e.to_string(),
            })
    }
}

fn split_codes(raw: &str) -> Vec<String> {
    raw.split(SEPARATOR)
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}
