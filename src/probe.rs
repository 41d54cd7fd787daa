//! Flag probing
//!
//! A probe asks the toolchain whether it accepts one flag by compiling and
//! linking a trivial program with that flag alone. Probes never touch the
//! environment they are asked about; they run against a throwaway clone.

use buildcfg_trial::{TrialCompiler, TrialOutcome, TrialRequest};
use serde::Serialize;

use crate::env::{vars, Environment, Value};

/// Outcome of probing one flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub flag: String,
    pub passed: bool,

    /// e.g. `Checking for -Wall ... yes`
    pub label: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub diagnostics: String,
}

impl ProbeResult {
    fn new(flag: &str, outcome: TrialOutcome) -> Self {
        let answer = if outcome.passed { "yes" } else { "no" };
        Self {
            flag: flag.to_string(),
            passed: outcome.passed,
            label: format!("Checking for {} ... {}", flag, answer),
            diagnostics: outcome.diagnostics,
        }
    }
}

/// Probes single flags through a [`TrialCompiler`].
pub struct FlagProbe<'a> {
    compiler: &'a dyn TrialCompiler,
}

impl<'a> FlagProbe<'a> {
    pub fn new(compiler: &'a dyn TrialCompiler) -> Self {
        Self { compiler }
    }

    /// Try `flag` as the only compile flag and the only link flag
    pub fn probe(&self, env: &Environment, flag: &str) -> ProbeResult {
        let mut trial = env.clone_named(format!("{}-probe", env.name()));
        trial.set(vars::CFLAGS, Value::List(vec![flag.to_string()]));
        trial.set(vars::LINKFLAGS, Value::List(vec![flag.to_string()]));

        let outcome = self.compiler.try_link(&trial_request(&trial, flag));
        let result = ProbeResult::new(flag, outcome);
        tracing::debug!(env = env.name(), "{}", result.label);
        result
    }
}

/// Toolchain invocation described by an environment
pub fn trial_request(env: &Environment, label: &str) -> TrialRequest {
    let mut request = TrialRequest::new(label, env.get_str(vars::CC).unwrap_or_default());
    request.cflags = env.get_list(vars::CFLAGS);
    request.cppflags = env.get_list(vars::CPPFLAGS);
    request.include_dirs = env
        .get_list(vars::CPPPATH)
        .iter()
        .map(|dir| env.resolve_dir(dir))
        .collect();
    request.linkflags = env.get_list(vars::LINKFLAGS);
    request.work_dir = Some(env.root().to_path_buf());
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildcfg_trial::ScriptedTrialCompiler;
    use std::path::PathBuf;

    fn target() -> Environment {
        let mut env = Environment::new("target", "/src");
        env.set(vars::CC, "i686-elf-gcc");
        env.set(vars::CFLAGS, Value::List(vec!["-Wall".into(), "-fbogus".into()]));
        env.set(vars::LINKFLAGS, Value::List(vec!["-static".into()]));
        env.append(vars::CPPPATH, ["#include"]);
        env
    }

    #[test]
    fn test_probe_uses_only_the_candidate_flag() {
        let compiler = ScriptedTrialCompiler::accepting();
        let env = target();
        FlagProbe::new(&compiler).probe(&env, "-O2");

        let requests = compiler.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].compiler, "i686-elf-gcc");
        assert_eq!(requests[0].cflags, vec!["-O2"]);
        assert_eq!(requests[0].linkflags, vec!["-O2"]);
        assert_eq!(requests[0].include_dirs, vec![PathBuf::from("/src/include")]);
    }

    #[test]
    fn test_trial_runs_from_project_root() {
        let compiler = ScriptedTrialCompiler::accepting();
        FlagProbe::new(&compiler).probe(&target(), "-O2");
        assert_eq!(compiler.requests()[0].work_dir, Some(PathBuf::from("/src")));
    }

    #[test]
    fn test_probe_leaves_environment_untouched() {
        let compiler = ScriptedTrialCompiler::accepting();
        let env = target();
        let before = env.clone();
        FlagProbe::new(&compiler).probe(&env, "-O2");
        assert_eq!(env, before);
    }

    #[test]
    fn test_probe_result_labels() {
        let compiler = ScriptedTrialCompiler::rejecting(["-fbogus"]);
        let probe = FlagProbe::new(&compiler);
        let env = target();

        let ok = probe.probe(&env, "-Wall");
        assert!(ok.passed);
        assert_eq!(ok.label, "Checking for -Wall ... yes");

        let bad = probe.probe(&env, "-fbogus");
        assert!(!bad.passed);
        assert_eq!(bad.label, "Checking for -fbogus ... no");
        assert!(!bad.diagnostics.is_empty());
    }
}
