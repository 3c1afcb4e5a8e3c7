//! NixKnack Service
//!
//! Household inventory and decluttering API: users catalogue their items,
//! tag them, and receive a weekly plan of disposal tasks for any tag where
//! they own more than its threshold.

pub mod config;
pub mod crypto;
pub mod error;
pub mod planner;
pub mod routes;
pub mod seed;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::AppError;
pub use seed::load_seed_data;
pub use state::AppState;
pub use store::{InMemoryStore, SqliteStore, Store};
