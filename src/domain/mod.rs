//! Gateway vocabulary: values, calls, replies, the error catalogue and the
//! transport port the application layer drives.

pub mod call;
pub mod catalogue;
pub mod context;
pub mod payment;
pub mod ports;
pub mod response;
