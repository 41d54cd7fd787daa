//! Trial compiler backed by real toolchain processes.

use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::{TrialCompiler, TrialError, TrialOutcome, TrialRequest, TrialStage, TRIAL_SOURCE};

/// Runs the configured compiler driver for the compile and the link stage.
///
/// Each trial gets its own temporary directory, removed when the trial ends.
/// Both stages run in the request's `work_dir`; the source, object and
/// program paths handed to the toolchain are absolute paths in the scratch
/// directory. There is no timeout: a hung toolchain blocks the caller.
#[derive(Debug, Default, Clone)]
pub struct CommandTrialCompiler;

impl CommandTrialCompiler {
    pub fn new() -> Self {
        Self
    }

    fn run(&self, request: &TrialRequest) -> Result<TrialOutcome, TrialError> {
        let scratch = tempfile::Builder::new()
            .prefix("buildcfg-trial-")
            .tempdir()
            .map_err(TrialError::Scratch)?;

        let source = scratch.path().join("trial.c");
        let object = scratch.path().join("trial.o");
        let program = scratch.path().join("trial");
        fs::write(&source, TRIAL_SOURCE).map_err(TrialError::Scratch)?;
        let cwd = request.work_dir.as_deref().unwrap_or(scratch.path());

        let mut compile = self.driver(&request.compiler, cwd)?;
        compile
            .args(&request.cflags)
            .args(&request.cppflags)
            .args(request.include_dirs.iter().map(|dir| format!("-I{}", dir.display())))
            .arg("-c")
            .arg(&source)
            .arg("-o")
            .arg(&object);
        if let Some(outcome) = run_stage(compile, &request.compiler, TrialStage::Compile)? {
            return Ok(outcome);
        }

        let mut link = self.driver(&request.compiler, cwd)?;
        link.args(&request.linkflags).arg(&object).arg("-o").arg(&program);
        if let Some(outcome) = run_stage(link, &request.compiler, TrialStage::Link)? {
            return Ok(outcome);
        }

        Ok(TrialOutcome::pass())
    }

    /// Build a command from a compiler string such as `"ccache gcc -m32"`
    fn driver(&self, compiler: &str, cwd: &Path) -> Result<Command, TrialError> {
        let mut words = compiler.split_whitespace();
        let program = words.next().ok_or(TrialError::EmptyCompiler)?;

        let mut cmd = Command::new(program);
        cmd.args(words)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        Ok(cmd)
    }
}

/// Run one stage; `Some` means the trial stopped here.
fn run_stage(
    mut cmd: Command,
    compiler: &str,
    stage: TrialStage,
) -> Result<Option<TrialOutcome>, TrialError> {
    let output = cmd.output().map_err(|source| TrialError::Spawn {
        program: compiler.to_string(),
        source,
    })?;

    if output.status.success() {
        return Ok(None);
    }

    let diagnostics = String::from_utf8_lossy(&output.stderr).trim().to_string();
    tracing::debug!(?stage, status = ?output.status.code(), "trial stage failed");
    Ok(Some(TrialOutcome::fail(stage, diagnostics)))
}

impl TrialCompiler for CommandTrialCompiler {
    fn try_link(&self, request: &TrialRequest) -> TrialOutcome {
        match self.run(request) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::debug!(label = %request.label, error = %e, "trial could not run");
                let stage = match e {
                    TrialError::Scratch(_) => TrialStage::Setup,
                    TrialError::EmptyCompiler | TrialError::Spawn { .. } => TrialStage::Compile,
                };
                TrialOutcome::fail(stage, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_compiler_fails_without_spawning() {
        let outcome = CommandTrialCompiler::new().try_link(&TrialRequest::new("-Wall", "   "));
        assert!(!outcome.passed);
        assert_eq!(outcome.failed_stage, Some(TrialStage::Compile));
        assert!(outcome.diagnostics.contains("Empty compiler"));
    }

    #[test]
    fn test_missing_compiler_is_a_failed_trial() {
        let request = TrialRequest::new("-O2", "/nonexistent/buildcfg-cc");
        let outcome = CommandTrialCompiler::new().try_link(&request);
        assert!(!outcome.passed);
        assert!(outcome.diagnostics.contains("/nonexistent/buildcfg-cc"));
    }

    #[cfg(unix)]
    #[test]
    fn test_script_compiler_compile_and_link() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fakecc.sh");
        fs::write(
            &script,
            "#!/bin/sh\n\
             prev=\"\"\n\
             for arg in \"$@\"; do\n\
               if [ \"$arg\" = \"-fbogus\" ]; then echo 'unrecognized option' >&2; exit 1; fi\n\
               if [ \"$prev\" = \"-o\" ]; then : > \"$arg\"; fi\n\
               prev=\"$arg\"\n\
             done\n\
             exit 0\n",
        )
        .unwrap();
        let compiler = format!("sh {}", script.display());

        let mut good = TrialRequest::new("-Wall", compiler.clone());
        good.cflags = vec!["-Wall".to_string()];
        good.linkflags = vec!["-Wall".to_string()];
        assert!(CommandTrialCompiler::new().try_link(&good).passed);

        let mut bad = TrialRequest::new("-fbogus", compiler);
        bad.linkflags = vec!["-fbogus".to_string()];
        let outcome = CommandTrialCompiler::new().try_link(&bad);
        assert!(!outcome.passed);
        assert_eq!(outcome.failed_stage, Some(TrialStage::Link));
        assert_eq!(outcome.diagnostics, "unrecognized option");
    }

    #[cfg(unix)]
    #[test]
    fn test_relative_compiler_resolves_against_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("bin")).unwrap();
        fs::write(
            dir.path().join("bin/cc.sh"),
            r#"#!/bin/sh
prev=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then : > "$arg"; fi
  prev="$arg"
done
exit 0
"#,
        )
        .unwrap();

        let mut request = TrialRequest::new("-O2", "sh bin/cc.sh");
        request.cflags = vec!["-O2".to_string()];
        assert!(!CommandTrialCompiler::new().try_link(&request).passed);

        request.work_dir = Some(dir.path().to_path_buf());
        let outcome = CommandTrialCompiler::new().try_link(&request);
        assert!(outcome.passed, "{}", outcome.diagnostics);
    }
}
