mod cache;
mod service;

pub use cache::{AttemptSnapshot, LoginAttemptCache};
pub use service::{LockNotice, LoginGuard, FALLBACK_LOCK_THRESHOLD};
