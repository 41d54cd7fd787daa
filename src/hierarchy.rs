//! Target, host and kernel environments
//!
//! `setup` runs the whole configuration sequence once:
//! 1. Base target (generic and extension steps) and base host (generic only)
//! 2. Global variables into target and host
//! 3. System variables, from the file named by `COMPILER`, into target
//! 4. Short progress templates unless `VERBOSE`
//! 5. Flag validation unless cleaning
//! 6. Kernel cloned from target; linker script flags split between them
//! 7. Host diverged from the target baseline
//! 8. Help text and the architecture header link
//!
//! A configuration error aborts the sequence and no environment escapes.

use buildcfg_trial::TrialCompiler;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

use crate::config::{
    global_variables, system_variables, ConfigError, ConfigSource, SourceOrigin,
    GLOBAL_CONFIG_FILE,
};
use crate::env::{vars, BuildStep, Environment};
use crate::probe::FlagProbe;
use crate::symlink::{refresh_arch_link, ARCH_LINK};
use crate::validate::{validate_flags, ValidationReport};

/// Host sentinel for `ARCH` and `SYSTEM`; never a valid target value
pub const HOST_SENTINEL: &str = "host";

/// Output root of host builds
pub const HOST_BUILDROOT: &str = "build/host";

/// Preprocessor definition marking host builds
pub const HOST_DEFINE: &str = "-DHOST";

/// Extra include directory of host builds
pub const HOST_INCLUDE: &str = "#include";

/// Where target extension steps are looked up
pub const TOOL_PATH: &str = "tools";

/// Flag variables checked against the toolchain
pub const VALIDATED_FLAGS: &[&str] = &[vars::CFLAGS, vars::LINKFLAGS];

/// Inputs to [`setup`]
#[derive(Debug, Clone)]
pub struct SetupOptions {
    /// Project root
    pub root: PathBuf,

    /// Global source; defaults to `<root>/build.conf`
    pub global_config: Option<PathBuf>,

    /// Only tearing down outputs: skip every toolchain probe
    pub clean: bool,
}

impl SetupOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            global_config: None,
            clean: false,
        }
    }

    pub fn with_global_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config = Some(path.into());
        self
    }

    pub fn clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    pub fn global_config_path(&self) -> PathBuf {
        self.global_config
            .clone()
            .unwrap_or_else(|| self.root.join(GLOBAL_CONFIG_FILE))
    }
}

/// The configured environments, built once by [`setup`].
#[derive(Debug, Clone, Serialize)]
pub struct BuildEnvironments {
    pub target: Environment,
    pub host: Environment,
    pub kernel: Environment,

    /// Every recognized variable with its description and values
    pub help: String,

    /// Sources the configuration was loaded from
    pub sources: Vec<ConfigSource>,

    /// Probe results; empty in clean mode
    pub reports: Vec<ValidationReport>,
}

impl BuildEnvironments {
    /// Look an environment up by name
    pub fn get(&self, name: &str) -> Option<&Environment> {
        match name {
            "target" => Some(&self.target),
            "host" => Some(&self.host),
            "kernel" => Some(&self.kernel),
            _ => None,
        }
    }
}

/// Build target, host and kernel from the configuration under
/// `options.root`, probing flags through `compiler`.
pub fn setup(
    options: &SetupOptions,
    compiler: &dyn TrialCompiler,
) -> Result<BuildEnvironments, ConfigError> {
    let root = options.root.as_path();

    let mut target = Environment::new("target", root);
    for step in BuildStep::EXTENSIONS {
        target.attach(*step);
    }
    target.add_tool_path(TOOL_PATH);
    let mut host = Environment::new("host", root);

    let global_vars = global_variables();
    let global = ConfigSource::load(SourceOrigin::Global, &options.global_config_path())?;
    global_vars.update(&global, &mut [&mut target, &mut host])?;
    check_buildroot(&target)?;

    let system_vars = system_variables();
    let system_path = resolve_path(root, &target.get_str(vars::COMPILER).unwrap_or_default());
    let system = ConfigSource::load(SourceOrigin::System, &system_path)?;
    system_vars.update(&system, &mut [&mut target])?;

    if !target.get_bool(vars::VERBOSE) {
        install_short_progress(&mut target);
        install_short_progress(&mut host);
    }

    let mut reports = Vec::new();
    if options.clean {
        tracing::info!("clean mode: skipping toolchain flag probes");
    } else {
        let probe = FlagProbe::new(compiler);
        for env in [&mut target, &mut host] {
            for variable in VALIDATED_FLAGS {
                reports.push(validate_flags(env, variable, &probe));
            }
        }
    }

    let mut kernel = target.clone_named("kernel");
    let linkkern = target.get_list(vars::LINKKERN);
    let linkuser = target.get_list(vars::LINKUSER);
    kernel.append(vars::LINKFLAGS, linkkern);
    target.append(vars::LINKFLAGS, linkuser);

    diverge_host(&mut host);

    let help = format!("{}{}", global_vars.help_text(&target), system_vars.help_text(&target));

    let arch = target.get_str(vars::ARCH).unwrap_or_default();
    refresh_arch_link(&root.join(ARCH_LINK), &arch);

    tracing::debug!(
        arch = %arch,
        system = %target.get_str(vars::SYSTEM).unwrap_or_default(),
        "build environments configured"
    );

    Ok(BuildEnvironments {
        target,
        host,
        kernel,
        help,
        sources: vec![global, system],
        reports,
    })
}

fn install_short_progress(env: &mut Environment) {
    for step in BuildStep::GENERIC {
        if let Some(template) = step.short_progress() {
            env.set(step.progress_var(), template);
        }
    }
}

fn diverge_host(host: &mut Environment) {
    host.set(vars::ARCH, HOST_SENTINEL);
    host.set(vars::SYSTEM, HOST_SENTINEL);
    host.set(vars::BUILDROOT, HOST_BUILDROOT);
    host.append(vars::CPPFLAGS, [HOST_DEFINE]);
    host.append(vars::CPPPATH, [HOST_INCLUDE]);
}

/// The target may not build into the host output root
fn check_buildroot(target: &Environment) -> Result<(), ConfigError> {
    let buildroot = target.get_str(vars::BUILDROOT).unwrap_or_default();
    let normalized: PathBuf = Path::new(buildroot.trim_start_matches('#'))
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if normalized == Path::new(HOST_BUILDROOT) {
        return Err(ConfigError::ReservedValue {
            key: vars::BUILDROOT.to_string(),
            value: buildroot,
        });
    }
    Ok(())
}

fn resolve_path(root: &Path, path: &str) -> PathBuf {
    root.join(path)
}
