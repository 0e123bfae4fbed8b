//! Core types - pure abstractions shared across the codebase.

mod category;
mod mode;
mod role;
mod route;
mod state;

pub use category::WatchCategory;
pub use mode::BuildMode;
pub use role::{FileRole, MARKDOWN_EXTENSIONS, SCRIPT_EXTENSIONS, is_script, stem_without_role};
pub use route::Route;
pub use state::{is_shutdown, register_watch, setup_shutdown_handler};
