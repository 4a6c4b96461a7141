mod accounts;
pub mod db;
mod deletion;
mod expiry;
mod login;
mod login_guard;
pub mod mail;
mod recovery;
mod registration;
mod reminder;
mod services;
mod two_factor;
mod verification;

pub use accounts::*;
pub use deletion::*;
pub use expiry::*;
pub use login::*;
pub use login_guard::*;
pub use recovery::*;
pub use registration::*;
pub use reminder::*;
pub use services::*;
pub use two_factor::*;
pub use verification::*;

#[cfg(test)]
pub(crate) mod test_support;
