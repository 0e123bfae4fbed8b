use thiserror::Error;

use crate::asset::ExternalizeError;
use crate::graph::{BoundaryViolation, CollectError};
use crate::route::ConflictError;
use crate::utils::plural_s;

/// Whole-build failures. All of them abort before any route unit runs,
/// except `Units`, which is reported after every unit has finished.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("compiler `{compiler}` failed:\n{}", .diagnostics.join("\n"))]
    Compile {
        compiler: String,
        diagnostics: Vec<String>,
    },

    #[error(transparent)]
    Collect(#[from] CollectError),

    #[error(transparent)]
    Conflicts(#[from] ConflictError),

    #[error("{}", format_violations(.0))]
    Boundary(Vec<BoundaryViolation>),

    #[error(transparent)]
    Externalize(#[from] ExternalizeError),

    #[error("{failed} of {total} route{} failed", plural_s(*total))]
    Units { failed: usize, total: usize },
}

fn format_violations(violations: &[BoundaryViolation]) -> String {
    let mut out = format!(
        "{} illegal server import{}:",
        violations.len(),
        plural_s(violations.len())
    );
    for violation in violations {
        out.push('\n');
        out.push_str(&violation.to_string());
    }
    out
}
