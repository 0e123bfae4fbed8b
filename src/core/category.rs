//! Watched file categories.

/// Category of a changed file, determines rebuild scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WatchCategory {
    /// Compiled source module under the source root
    Source,
    /// Markdown document under the source root
    Markdown,
    /// Public passthrough file, mirrored verbatim
    Public,
    /// Environment definition file (`.env`)
    Env,
    /// Compiler configuration file (`tsconfig.json`)
    CompilerConfig,
    /// Site config (`trellis.toml`)
    Settings,
}

impl WatchCategory {
    #[cfg(test)]
    pub const ALL: [Self; 6] = [
        Self::Settings,
        Self::Env,
        Self::CompilerConfig,
        Self::Source,
        Self::Markdown,
        Self::Public,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Markdown => "markdown",
            Self::Public => "public",
            Self::Env => "env",
            Self::CompilerConfig => "compiler config",
            Self::Settings => "config",
        }
    }

    /// Implicit dependency of every route: any change forces a full rebuild.
    #[inline]
    pub fn is_global(self) -> bool {
        matches!(self, Self::Settings | Self::Env | Self::CompilerConfig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_categories() {
        let global: Vec<_> = WatchCategory::ALL
            .into_iter()
            .filter(|c| c.is_global())
            .collect();
        assert_eq!(
            global,
            vec![
                WatchCategory::Settings,
                WatchCategory::Env,
                WatchCategory::CompilerConfig
            ]
        );
    }
}
