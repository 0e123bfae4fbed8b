//! Asset externalizer.
//!
//! Gives every third-party dependency a version-qualified home in the output
//! tree, builds the import maps pages use to find them, and copies the files.
//!
//! ```text
//! asset/
//! ├── package      # package.json lookup (name + version)
//! ├── externalize  # VersionMap, output paths
//! ├── importmap    # per-route import map + modulepreload hints
//! ├── copy         # parallel copy of packages, published modules, local files
//! └── minify       # oxc / lightningcss
//! ```

mod copy;
mod externalize;
mod importmap;
mod minify;
mod package;

pub use copy::{CopyOutcome, CopyStats, Refresh, copy_dir, copy_externalized, copy_file};
pub use externalize::{ExternalizeError, Externalized, externalize};
pub use importmap::{ImportMap, preload_urls};
pub use package::PackageCache;
