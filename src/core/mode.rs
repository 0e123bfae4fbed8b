//! Build mode: decides whether structural problems abort or warn.

/// Build mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildMode {
    /// Structural conflicts, illegal imports and compiler errors abort the build.
    pub strict: bool,

    /// Consult `TRELLIS_BUILD_*` environment variants.
    pub build_env: bool,
}

impl BuildMode {
    /// One-shot build: fail fast, non-zero exit.
    pub const ONE_SHOT: Self = Self {
        strict: true,
        build_env: true,
    };

    /// Watch mode: report and keep the dev loop running.
    pub const WATCH: Self = Self {
        strict: false,
        build_env: false,
    };

    #[inline]
    pub const fn is_strict(&self) -> bool {
        self.strict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modes() {
        assert!(BuildMode::ONE_SHOT.is_strict());
        assert!(BuildMode::ONE_SHOT.build_env);
        assert!(!BuildMode::WATCH.is_strict());
    }
}
