use crate::error::PaymentError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A positive payment amount in the smallest currency unit (yen).
///
/// The gateway has no sub-unit decimals, so the value is a plain integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Amount(u64);

impl Amount {
    pub fn new(value: u64) -> Result<Self, PaymentError> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(PaymentError::ValidationError(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for Amount {
    type Error = PaymentError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for u64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operation selector sent as `JobCd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobCode {
    Check,
    #[default]
    Auth,
    Capture,
    Sales,
    Void,
    Return,
    Returnx,
    Cancel,
}

impl JobCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobCode::Check => "CHECK",
            JobCode::Auth => "AUTH",
            JobCode::Capture => "CAPTURE",
            JobCode::Sales => "SALES",
            JobCode::Void => "VOID",
            JobCode::Return => "RETURN",
            JobCode::Returnx => "RETURNX",
            JobCode::Cancel => "CANCEL",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        [
            JobCode::Check,
            JobCode::Auth,
            JobCode::Capture,
            JobCode::Sales,
            JobCode::Void,
            JobCode::Return,
            JobCode::Returnx,
            JobCode::Cancel,
        ]
        .into_iter()
        .find(|code| code.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for JobCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment method sent as `Method` on execution. Only lump-sum and
/// installment plans are modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentMethod {
    #[default]
    LumpSum,
    Installments(u8),
}

impl PaymentMethod {
    pub fn code(&self) -> &'static str {
        match self {
            PaymentMethod::LumpSum => "1",
            PaymentMethod::Installments(_) => "2",
        }
    }

    pub fn pay_times(&self) -> Option<u8> {
        match self {
            PaymentMethod::LumpSum => None,
            PaymentMethod::Installments(times) => Some(*times),
        }
    }
}
