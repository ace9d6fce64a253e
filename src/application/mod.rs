//! Application layer containing the payment orchestration.
//!
//! This module defines `PaymentTransaction`, which sequences the gateway
//! calls of one logical payment operation and threads each step's reply into
//! the next step's request.

pub mod transaction;
