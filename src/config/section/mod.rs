//! Configuration section definitions.
//!
//! | Section             | Purpose                                    |
//! |---------------------|--------------------------------------------|
//! | `[site]`            | Base URL and API base URL                  |
//! | `[build]`           | Paths, sidecar names, pool size, minify    |
//! | `[build.markdown]`  | Markdown extensions                        |
//! | `[build.runtime]`   | Module host / renderer command             |
//! | `[build.compiler]`  | Source compiler command                    |
//! | `[watch]`           | Debounce windows                           |
//! | `[server]`          | Host and port for the default base URL     |

mod build;
mod server;
mod site;
mod watch;

pub use build::{
    BuildSectionConfig, CompilerConfig, MarkdownConfig, PackageGraph, RuntimeConfig,
};
pub use server::ServerConfig;
pub use site::SiteSectionConfig;
pub use watch::WatchConfig;
