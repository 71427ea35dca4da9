pub mod balance;
pub mod document;
pub mod leave_request;
pub mod role;
