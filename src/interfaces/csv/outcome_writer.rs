use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeResult {
    Approved,
    Altered,
    Declined,
    Invalid,
}

/// Result row for one replayed operation. `errors` holds the failure's
/// detail codes separated by `|`.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct Outcome {
    pub op: String,
    pub payment_id: String,
    pub result: OutcomeResult,
    pub access_id: String,
    pub tran_id: String,
    pub errors: String,
}

pub struct OutcomeWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OutcomeWriter<W> {
    pub fn new(destination: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(destination),
        }
    }

    pub fn write_outcome(&mut self, outcome: &Outcome) -> Result<()> {
        self.writer.serialize(outcome)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
