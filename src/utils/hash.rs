//! FxHash helpers for change detection.
//!
//! ```ignore
//! let h = hash::compute(content.as_bytes()); // -> u64
//! ```

use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Compute 64-bit hash from byte data.
#[inline]
pub fn compute<T: AsRef<[u8]> + ?Sized>(data: &T) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(data.as_ref());
    hasher.finish()
}

/// Hash a file's content, `0` when it cannot be read.
pub fn file(path: &std::path::Path) -> u64 {
    std::fs::read(path).map(|bytes| compute(&bytes)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_deterministic() {
        assert_eq!(compute("trellis.toml"), compute("trellis.toml"));
        assert_ne!(compute("a"), compute("b"));
    }

    #[test]
    fn test_missing_file_hashes_to_zero() {
        assert_eq!(file(std::path::Path::new("/definitely/not/here.toml")), 0);
    }
}
