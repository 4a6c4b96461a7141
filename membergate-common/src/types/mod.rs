mod secret;
mod state;

pub use secret::Secret;
pub use state::AccountState;
