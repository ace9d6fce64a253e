use crate::domain::payment::{Amount, JobCode};
use crate::error::{PaymentError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Authorize,
    Cancel,
}

/// One requested payment operation. Cancels refer to an earlier
/// authorization by its payment id.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Operation {
    pub op: OperationType,
    pub payment_id: String,
    pub amount: Option<Amount>,
    pub token: Option<String>,
    pub job_code: Option<JobCode>,
}

/// Reads operations from a CSV source with the header
/// `op,payment_id,amount,token,job_code`.
pub struct OperationReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OperationReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes operations, one `Result` per row.
    pub fn operations(self) -> impl Iterator<Item = Result<Operation>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PaymentError::from))
    }
}
