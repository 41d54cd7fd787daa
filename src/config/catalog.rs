//! Recognized configuration variables

use super::{ConfigVariable, VariableKind, Variables};
use crate::env::vars;

pub const ARCHITECTURES: &[&str] = &["x86", "mips"];
pub const SYSTEMS: &[&str] = &["pc", "mipssim", "adm5120"];

/// Variables read from the global source into target and host
pub fn global_variables() -> Variables {
    let mut v = Variables::new();
    v.add(ConfigVariable::new(vars::VERSION, "Release version number", VariableKind::String));
    v.add(
        ConfigVariable::new(
            vars::ARCH,
            "Target machine CPU architecture",
            VariableKind::enumeration(ARCHITECTURES),
        )
        .with_default("x86"),
    );
    v.add(
        ConfigVariable::new(
            vars::SYSTEM,
            "Target machine system type",
            VariableKind::enumeration(SYSTEMS),
        )
        .with_default("pc"),
    );
    v.add(ConfigVariable::new(vars::COMPILER, "Target compiler chain", VariableKind::Path));
    v.add(ConfigVariable::new(
        vars::BUILDROOT,
        "Object output directory",
        VariableKind::String,
    ));
    v.add(
        ConfigVariable::new(
            vars::VERBOSE,
            "Output verbose compilation commands",
            VariableKind::Bool,
        )
        .with_default(false),
    );
    v
}

/// Variables read from the system source into target only
pub fn system_variables() -> Variables {
    let mut v = Variables::new();
    v.add(ConfigVariable::new(vars::CC, "C Compiler", VariableKind::String));
    v.add(ConfigVariable::new(vars::AS, "Assembler", VariableKind::String));
    v.add(ConfigVariable::new(vars::LD, "Linker", VariableKind::String));
    for (key, help) in [
        (vars::CFLAGS, "C Compiler flags"),
        (vars::ASFLAGS, "Assembler flags"),
        (vars::LINKFLAGS, "Linker flags"),
        (vars::LINKKERN, "Linker flags for the kernel linker script"),
        (vars::LINKUSER, "Linker flags for user programs linker script"),
        (vars::CPPPATH, "C Preprocessor include directories"),
    ] {
        v.add(
            ConfigVariable::new(key, help, VariableKind::List).with_default(Vec::<String>::new()),
        );
    }
    v
}
