//! Build environments
//!
//! An environment is a named bag of typed variables plus the build steps it
//! can describe. Cloning an environment deep-copies every value, so a clone
//! can be diverged freely without touching its origin.

mod library;
mod step;
mod subst;

pub use library::append_libraries;
pub use step::BuildStep;
pub use subst::subst;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Well-known variable names
pub mod vars {
    pub const VERSION: &str = "VERSION";
    pub const ARCH: &str = "ARCH";
    pub const SYSTEM: &str = "SYSTEM";
    pub const COMPILER: &str = "COMPILER";
    pub const BUILDROOT: &str = "BUILDROOT";
    pub const VERBOSE: &str = "VERBOSE";

    pub const CC: &str = "CC";
    pub const AS: &str = "AS";
    pub const LD: &str = "LD";
    pub const AR: &str = "AR";
    pub const RANLIB: &str = "RANLIB";
    pub const CFLAGS: &str = "CFLAGS";
    pub const ASFLAGS: &str = "ASFLAGS";
    pub const ARFLAGS: &str = "ARFLAGS";
    pub const LINKFLAGS: &str = "LINKFLAGS";
    pub const LINKKERN: &str = "LINKKERN";
    pub const LINKUSER: &str = "LINKUSER";
    pub const CPPFLAGS: &str = "CPPFLAGS";
    pub const CPPPATH: &str = "CPPPATH";
    pub const LIBPATH: &str = "LIBPATH";
    pub const LIBS: &str = "LIBS";

    pub const MKIMAGE: &str = "MKIMAGE";
    pub const MKISOFS: &str = "MKISOFS";
    pub const OBJCOPY: &str = "OBJCOPY";
}

/// A single variable value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Str(String),
    List(Vec<String>),
    Path(PathBuf),
}

impl Value {
    /// Render the value the way a command line would see it
    pub fn render(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Str(s) => s.clone(),
            Value::List(items) => items.join(" "),
            Value::Path(p) => p.display().to_string(),
        }
    }

    /// View the value as a sequence; scalars become one-element lists
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Value::List(items) => items.clone(),
            Value::Str(s) => s.split_whitespace().map(str::to_string).collect(),
            other => vec![other.render()],
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<PathBuf> for Value {
    fn from(p: PathBuf) -> Self {
        Value::Path(p)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

/// A named, mutable build configuration record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Environment {
    name: String,

    /// Project root; `#`-prefixed directories resolve against it
    root: PathBuf,

    vars: BTreeMap<String, Value>,

    /// Build steps this environment can describe
    steps: Vec<BuildStep>,

    /// Where extension steps are looked up
    tool_path: Vec<PathBuf>,
}

impl Environment {
    /// Create an environment carrying the generic build steps and their
    /// default toolchain and command templates.
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        let mut env = Self {
            name: name.into(),
            root: root.into(),
            vars: BTreeMap::new(),
            steps: Vec::new(),
            tool_path: Vec::new(),
        };

        env.set(vars::CC, "cc");
        env.set(vars::AS, "as");
        env.set(vars::LD, "ld");
        env.set(vars::AR, "ar");
        env.set(vars::RANLIB, "ranlib");
        env.set(vars::ARFLAGS, Value::List(vec!["rc".to_string()]));
        for name in [
            vars::CFLAGS,
            vars::ASFLAGS,
            vars::LINKFLAGS,
            vars::CPPFLAGS,
            vars::CPPPATH,
            vars::LIBPATH,
            vars::LIBS,
        ] {
            env.set(name, Value::List(Vec::new()));
        }

        for step in BuildStep::GENERIC {
            env.attach(*step);
        }
        env
    }

    /// Clone under a new name. Every value is copied; nothing is shared.
    pub fn clone_named(&self, name: impl Into<String>) -> Self {
        let mut env = self.clone();
        env.name = name.into();
        env
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Attach a build step and install its default command template
    pub fn attach(&mut self, step: BuildStep) {
        if self.steps.contains(&step) {
            return;
        }
        for (name, value) in step.defaults() {
            self.vars
                .entry((*name).to_string())
                .or_insert_with(|| Value::from(*value));
        }
        self.vars
            .insert(step.command_var().to_string(), Value::from(step.command_template()));
        self.steps.push(step);
    }

    pub fn has_step(&self, step: BuildStep) -> bool {
        self.steps.contains(&step)
    }

    pub fn steps(&self) -> &[BuildStep] {
        &self.steps
    }

    pub fn add_tool_path(&mut self, path: impl Into<PathBuf>) {
        self.tool_path.push(path.into());
    }

    pub fn tool_path(&self) -> &[PathBuf] {
        &self.tool_path
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// String form of a variable, if set
    pub fn get_str(&self, name: &str) -> Option<String> {
        self.vars.get(name).map(Value::render)
    }

    /// Boolean variable; anything but `Bool(true)` is false
    pub fn get_bool(&self, name: &str) -> bool {
        matches!(self.vars.get(name), Some(Value::Bool(true)))
    }

    /// Sequence form of a variable; unset variables are empty
    pub fn get_list(&self, name: &str) -> Vec<String> {
        self.vars.get(name).map(Value::to_list).unwrap_or_default()
    }

    /// Replace a variable
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.vars.insert(name.to_string(), value.into());
    }

    /// Append entries to a sequence variable.
    ///
    /// An unset variable starts empty; a scalar is converted to a sequence
    /// first.
    pub fn append<I, S>(&mut self, name: &str, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = self.list_mut(name);
        list.extend(items.into_iter().map(Into::into));
    }

    /// Mutable access to a sequence variable, converting it if needed
    pub fn list_mut(&mut self, name: &str) -> &mut Vec<String> {
        let value = self
            .vars
            .entry(name.to_string())
            .or_insert_with(|| Value::List(Vec::new()));
        if !matches!(value, Value::List(_)) {
            *value = Value::List(value.to_list());
        }
        match value {
            Value::List(items) => items,
            _ => unreachable!("value was just converted to a list"),
        }
    }

    /// Iterate over all variables in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Resolve a directory entry: `#x` is relative to the project root,
    /// other relative paths too, absolute paths stay as they are.
    pub fn resolve_dir(&self, dir: &str) -> PathBuf {
        let dir = dir.strip_prefix('#').unwrap_or(dir);
        self.root.join(dir)
    }

    /// Expand `$NAME` references against this environment
    pub fn subst(&self, template: &str, bindings: &BTreeMap<String, String>) -> String {
        subst(template, |name| {
            bindings
                .get(name)
                .cloned()
                .or_else(|| self.get_str(name))
        })
    }

    /// Progress line printed when a build step produces `target`.
    ///
    /// Uses the step's short progress template if one is installed,
    /// otherwise the full command.
    pub fn progress_line(&self, step: BuildStep, target: &str, sources: &[&str]) -> String {
        let template = self
            .get_str(step.progress_var())
            .filter(|t| !t.is_empty())
            .or_else(|| self.get_str(step.command_var()))
            .unwrap_or_default();

        let mut bindings = BTreeMap::new();
        bindings.insert("TARGET".to_string(), target.to_string());
        bindings.insert("SOURCES".to_string(), sources.join(" "));
        bindings.insert(
            "SOURCE".to_string(),
            sources.first().map(|s| s.to_string()).unwrap_or_default(),
        );
        self.subst(&template, &bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_environment_has_generic_defaults() {
        let env = Environment::new("host", "/src");
        assert_eq!(env.name(), "host");
        assert_eq!(env.get_str(vars::CC).as_deref(), Some("cc"));
        assert!(env.get_list(vars::CFLAGS).is_empty());
        assert!(env.has_step(BuildStep::Compile));
        assert!(env.has_step(BuildStep::Link));
        assert!(!env.has_step(BuildStep::BootImage));
        assert!(env.tool_path().is_empty());
    }

    #[test]
    fn test_clone_does_not_alias_sequences() {
        let mut origin = Environment::new("target", "/src");
        origin.append(vars::LINKFLAGS, ["-static"]);

        let mut clone = origin.clone_named("kernel");
        clone.append(vars::LINKFLAGS, ["-Tkernel.ld"]);
        origin.append(vars::LINKFLAGS, ["-Tuser.ld"]);

        assert_eq!(clone.name(), "kernel");
        assert_eq!(clone.get_list(vars::LINKFLAGS), vec!["-static", "-Tkernel.ld"]);
        assert_eq!(origin.get_list(vars::LINKFLAGS), vec!["-static", "-Tuser.ld"]);
    }

    #[test]
    fn test_append_converts_scalar_to_sequence() {
        let mut env = Environment::new("target", "/src");
        env.set(vars::CPPFLAGS, "-DA -DB");
        env.append(vars::CPPFLAGS, ["-DC"]);
        let expected = Value::List(vec!["-DA".into(), "-DB".into(), "-DC".into()]);
        assert_eq!(env.get(vars::CPPFLAGS), Some(&expected));

        env.append("NEW", ["x"]);
        assert_eq!(env.get_list("NEW"), vec!["x"]);
    }

    #[test]
    fn test_get_bool() {
        let mut env = Environment::new("target", "/src");
        assert!(!env.get_bool(vars::VERBOSE));
        env.set(vars::VERBOSE, true);
        assert!(env.get_bool(vars::VERBOSE));
        env.set(vars::VERBOSE, "true");
        assert!(!env.get_bool(vars::VERBOSE));
    }

    #[test]
    fn test_resolve_dir() {
        let env = Environment::new("target", "/src");
        assert_eq!(env.resolve_dir("#lib/libc"), PathBuf::from("/src/lib/libc"));
        assert_eq!(env.resolve_dir("include"), PathBuf::from("/src/include"));
        assert_eq!(env.resolve_dir("/usr/include"), PathBuf::from("/usr/include"));
    }

    #[test]
    fn test_attach_is_idempotent() {
        let mut env = Environment::new("target", "/src");
        env.attach(BuildStep::Iso);
        env.attach(BuildStep::Iso);
        let isos = env.steps().iter().filter(|s| **s == BuildStep::Iso).count();
        assert_eq!(isos, 1);
        assert!(env.contains(BuildStep::Iso.command_var()));
    }

    #[test]
    fn test_progress_line_uses_full_command_by_default() {
        let mut env = Environment::new("target", "/src");
        env.set(vars::CFLAGS, Value::List(vec!["-Wall".to_string(), "-O2".to_string()]));

        let line = env.progress_line(BuildStep::Compile, "main.o", &["main.c"]);
        assert_eq!(line, "cc -o main.o -c -Wall -O2  main.c");
    }

    #[test]
    fn test_progress_line_prefers_short_template() {
        let mut env = Environment::new("target", "/src");
        env.set(BuildStep::Link.progress_var(), "  LD  $TARGET");

        let line = env.progress_line(BuildStep::Link, "kernel", &["a.o", "b.o"]);
        assert_eq!(line, "  LD  kernel");
    }
}
