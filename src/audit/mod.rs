//! Access audit log for LedgerLock
//!
//! Every authentication event is appended to a line-delimited JSON log,
//! whatever its outcome. The log is write-only from the library's point of
//! view; the trust engine reads it back to learn a user's login-time pattern.

mod entry;
mod logger;

pub use entry::AccessLogEntry;
pub use logger::AccessLogger;
