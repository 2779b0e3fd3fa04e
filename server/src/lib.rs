pub mod auth;
pub mod cookies;
pub mod error;
pub mod handlers;
pub mod observability;
pub mod router;
pub mod state;
pub mod textfile;
pub mod types;

pub use error::AppError;
pub use state::{AppState, build_state, build_state_with};

#[cfg(test)]
pub mod test_support;
