//! Flag set validation
//!
//! Filters a flag sequence down to the flags the toolchain accepts. Every
//! flag is probed on its own against the unmodified environment, so the
//! verdict for one flag never depends on the verdict for another.

use serde::Serialize;

use crate::env::Environment;
use crate::probe::{FlagProbe, ProbeResult};

/// Probe results for one flag variable of one environment
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub environment: String,
    pub variable: String,
    pub results: Vec<ProbeResult>,
}

impl ValidationReport {
    pub fn kept(&self) -> impl Iterator<Item = &str> {
        self.results.iter().filter(|r| r.passed).map(|r| r.flag.as_str())
    }

    pub fn dropped(&self) -> impl Iterator<Item = &str> {
        self.results.iter().filter(|r| !r.passed).map(|r| r.flag.as_str())
    }
}

/// Remove every flag of `variable` whose probe fails.
///
/// The surviving flags keep their relative order. Duplicates are probed and
/// kept or dropped individually. An empty result is not an error.
pub fn validate_flags(
    env: &mut Environment,
    variable: &str,
    probe: &FlagProbe<'_>,
) -> ValidationReport {
    let flags = env.get_list(variable);
    let results: Vec<ProbeResult> = flags.iter().map(|flag| probe.probe(env, flag)).collect();

    let list = env.list_mut(variable);
    list.clear();
    list.extend(results.iter().filter(|r| r.passed).map(|r| r.flag.clone()));

    let report = ValidationReport {
        environment: env.name().to_string(),
        variable: variable.to_string(),
        results,
    };
    for flag in report.dropped() {
        tracing::info!(env = %report.environment, variable, flag, "dropping unsupported flag");
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{vars, Value};
    use buildcfg_trial::ScriptedTrialCompiler;

    fn env_with(flags: &[&str]) -> Environment {
        let mut env = Environment::new("target", "/src");
        env.set(vars::CFLAGS, Value::List(flags.iter().map(|f| f.to_string()).collect()));
        env
    }

    #[test]
    fn test_drops_rejected_flags_keeping_order() {
        let compiler = ScriptedTrialCompiler::rejecting(["-fbogus", "-mnope"]);
        let mut env = env_with(&["-Wall", "-fbogus", "-O2", "-mnope", "-g"]);

        let report = validate_flags(&mut env, vars::CFLAGS, &FlagProbe::new(&compiler));

        assert_eq!(env.get_list(vars::CFLAGS), vec!["-Wall", "-O2", "-g"]);
        assert_eq!(report.dropped().collect::<Vec<_>>(), vec!["-fbogus", "-mnope"]);
        assert_eq!(report.kept().count(), 3);
        assert_eq!(compiler.calls(), 5);
    }

    #[test]
    fn test_all_rejected_yields_empty_sequence() {
        let compiler = ScriptedTrialCompiler::rejecting(["-a", "-b"]);
        let mut env = env_with(&["-a", "-b"]);

        validate_flags(&mut env, vars::CFLAGS, &FlagProbe::new(&compiler));

        assert_eq!(env.get(vars::CFLAGS), Some(&Value::List(Vec::new())));
    }

    #[test]
    fn test_duplicates_are_probed_individually() {
        let compiler = ScriptedTrialCompiler::accepting();
        let mut env = env_with(&["-Wall", "-Wall"]);

        validate_flags(&mut env, vars::CFLAGS, &FlagProbe::new(&compiler));

        assert_eq!(env.get_list(vars::CFLAGS), vec!["-Wall", "-Wall"]);
        assert_eq!(compiler.calls(), 2);
    }

    #[test]
    fn test_probes_are_isolated_from_each_other() {
        let compiler = ScriptedTrialCompiler::rejecting(["-fbogus"]);
        let mut env = env_with(&["-fbogus", "-Wall"]);

        validate_flags(&mut env, vars::CFLAGS, &FlagProbe::new(&compiler));

        for request in compiler.requests() {
            assert_eq!(request.cflags.len(), 1);
            assert_eq!(request.cflags, request.linkflags);
        }
    }

    #[test]
    fn test_string_variable_is_split_first() {
        let compiler = ScriptedTrialCompiler::rejecting(["-x"]);
        let mut env = Environment::new("host", "/src");
        env.set(vars::LINKFLAGS, "-static -x");

        let report = validate_flags(&mut env, vars::LINKFLAGS, &FlagProbe::new(&compiler));

        assert_eq!(env.get(vars::LINKFLAGS), Some(&Value::List(vec!["-static".into()])));
        assert_eq!(report.environment, "host");
        assert_eq!(report.variable, "LINKFLAGS");
    }
}
