pub mod auth;
pub mod command_center;
pub mod contracts;
pub mod error;
pub mod github;
pub mod prompts;
pub mod reactions;
pub mod retry;
pub mod snapshot_writer;
pub mod stream;
pub mod structured;
pub mod view_registry;

pub use auth::*;
pub use command_center::*;
pub use contracts::*;
pub use error::*;
pub use github::*;
pub use prompts::*;
pub use reactions::*;
pub use retry::*;
pub use snapshot_writer::*;
pub use stream::*;
pub use view_registry::*;
