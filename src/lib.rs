//! buildcfg - toolchain-aware build environment setup
//!
//! Loads the global and system configuration, drops compiler and linker
//! flags the toolchain rejects, and assembles the target, host and kernel
//! environments the build description is written against.

pub mod config;
pub mod env;
pub mod hierarchy;
pub mod probe;
pub mod symlink;
pub mod validate;

pub use buildcfg_trial::{CommandTrialCompiler, ScriptedTrialCompiler, TrialCompiler};
pub use config::{ConfigError, ConfigSource, ConfigVariable, VariableKind, Variables};
pub use env::{append_libraries, BuildStep, Environment, Value};
pub use hierarchy::{setup, BuildEnvironments, SetupOptions};
pub use probe::{FlagProbe, ProbeResult};
pub use validate::{validate_flags, ValidationReport};
