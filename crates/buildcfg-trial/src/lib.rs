//! Trial compile/link seam for toolchain flag probing.
//!
//! A trial compiles and links the smallest possible C program with a given
//! set of flags. The outcome only says whether the toolchain got through both
//! stages; it does not try to explain why a stage failed.

mod command;
mod scripted;

pub use command::CommandTrialCompiler;
pub use scripted::ScriptedTrialCompiler;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Source of the program every trial compiles.
pub const TRIAL_SOURCE: &str = "int main(int argc, char **argv)\n{\n    return 0;\n}\n";

/// Everything a trial needs to invoke the toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRequest {
    /// Human-readable label, e.g. `-Wall`
    pub label: String,

    /// Compiler command; may carry leading arguments (`"ccache cc"`)
    pub compiler: String,

    /// Compile flags
    #[serde(default)]
    pub cflags: Vec<String>,

    /// Preprocessor flags
    #[serde(default)]
    pub cppflags: Vec<String>,

    /// Include directories, already resolved to real paths
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,

    /// Link flags
    #[serde(default)]
    pub linkflags: Vec<String>,

    /// Directory the toolchain runs in; relative paths in `compiler` and the
    /// flags resolve against it. `None` runs in the scratch directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,
}

impl TrialRequest {
    /// Create a request with no flags
    pub fn new(label: impl Into<String>, compiler: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            compiler: compiler.into(),
            cflags: Vec::new(),
            cppflags: Vec::new(),
            include_dirs: Vec::new(),
            linkflags: Vec::new(),
            work_dir: None,
        }
    }

    /// Every flag token this request would pass to the toolchain
    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.cflags
            .iter()
            .chain(self.cppflags.iter())
            .chain(self.linkflags.iter())
            .map(String::as_str)
    }
}

/// Stage at which a trial stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialStage {
    Setup,
    Compile,
    Link,
}

/// Result of a single trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialOutcome {
    /// True iff both compile and link exited successfully
    pub passed: bool,

    /// Stage that failed, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<TrialStage>,

    /// Captured stderr of the failing stage (empty on success)
    #[serde(default)]
    pub diagnostics: String,
}

impl TrialOutcome {
    pub fn pass() -> Self {
        Self {
            passed: true,
            failed_stage: None,
            diagnostics: String::new(),
        }
    }

    pub fn fail(stage: TrialStage, diagnostics: impl Into<String>) -> Self {
        Self {
            passed: false,
            failed_stage: Some(stage),
            diagnostics: diagnostics.into(),
        }
    }
}

/// Errors raised while preparing or running a trial.
///
/// These never escape a [`TrialCompiler`]; they are folded into a failed
/// [`TrialOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum TrialError {
    #[error("Failed to prepare scratch directory: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("Empty compiler command")]
    EmptyCompiler,

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Something that can compile and link the trial program.
pub trait TrialCompiler {
    /// Compile and link [`TRIAL_SOURCE`] with the request's flags.
    fn try_link(&self, request: &TrialRequest) -> TrialOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_iterates_all_sequences_in_order() {
        let mut request = TrialRequest::new("-Wall", "cc");
        request.cflags = vec!["-Wall".to_string()];
        request.cppflags = vec!["-DHOST".to_string()];
        request.linkflags = vec!["-static".to_string()];

        let flags: Vec<&str> = request.flags().collect();
        assert_eq!(flags, vec!["-Wall", "-DHOST", "-static"]);
    }

    #[test]
    fn test_outcome_constructors() {
        let failed = TrialOutcome::fail(TrialStage::Link, "undefined reference");
        assert!(!failed.passed);
        assert_eq!(failed.failed_stage, Some(TrialStage::Link));
        assert_eq!(failed.diagnostics, "undefined reference");

        let passed = TrialOutcome::pass();
        assert!(passed.passed);
        assert!(passed.failed_stage.is_none());
        assert!(passed.diagnostics.is_empty());
    }
}
