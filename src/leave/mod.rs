//! Leave request lifecycle and balance accounting.

pub mod approval;
pub mod balance;
pub mod calendar;
pub mod document_gate;
pub mod error;
pub mod policy;
pub mod wizard;
