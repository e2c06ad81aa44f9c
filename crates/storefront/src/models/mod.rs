//! Request payloads and session types.

pub mod forms;
pub mod session;
