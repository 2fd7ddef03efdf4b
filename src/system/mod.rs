//! System-level modules
//!
//! - Logging initialization
//! - Panic hook for readable crash output

pub mod logging;
pub mod panic_handler;
