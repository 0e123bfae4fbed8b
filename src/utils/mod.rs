//! Shared helpers with no knowledge of routes or builds.

pub mod exec;
pub mod hash;
pub mod html;
pub mod path;
pub mod plural;
pub mod walk;

pub use plural::{plural_count, plural_s};
