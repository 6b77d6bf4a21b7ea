pub mod actions;
pub mod config;
pub mod error;
pub mod feature_registry;
pub mod panel_lifecycle;
pub mod persistence;
pub mod reducer;
pub mod state;
pub mod store;

pub use actions::*;
pub use reducer::*;
pub use state::*;
pub use store::*;

pub use config::Config;
pub use error::StorageError;
pub use feature_registry::*;
pub use panel_lifecycle::*;
pub use persistence::*;
