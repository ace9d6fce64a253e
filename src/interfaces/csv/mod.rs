pub mod operation_reader;
pub mod outcome_writer;
