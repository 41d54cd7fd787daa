//! Build steps an environment can describe.
//!
//! Steps are executed by the build system this crate configures. Here they
//! only carry their command template, the variable holding their progress
//! template and the tool defaults they need.

use serde::{Deserialize, Serialize};

use super::vars;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStep {
    Compile,
    Assemble,
    AssemblePreprocessed,
    Archive,
    ArchiveIndex,
    Link,
    BootImage,
    Iso,
    Binary,
}

impl BuildStep {
    /// Steps every environment carries
    pub const GENERIC: &'static [BuildStep] = &[
        BuildStep::Compile,
        BuildStep::Assemble,
        BuildStep::AssemblePreprocessed,
        BuildStep::Archive,
        BuildStep::ArchiveIndex,
        BuildStep::Link,
    ];

    /// Extension steps only the target environment carries
    pub const EXTENSIONS: &'static [BuildStep] =
        &[BuildStep::BootImage, BuildStep::Iso, BuildStep::Binary];

    /// Variable holding the full command template
    pub fn command_var(&self) -> &'static str {
        match self {
            BuildStep::Compile => "CCCOM",
            BuildStep::Assemble => "ASCOM",
            BuildStep::AssemblePreprocessed => "ASPPCOM",
            BuildStep::Archive => "ARCOM",
            BuildStep::ArchiveIndex => "RANLIBCOM",
            BuildStep::Link => "LINKCOM",
            BuildStep::BootImage => "BOOTIMAGECOM",
            BuildStep::Iso => "ISOCOM",
            BuildStep::Binary => "BINARYCOM",
        }
    }

    /// Variable holding the progress template
    pub fn progress_var(&self) -> &'static str {
        match self {
            BuildStep::Compile => "CCCOMSTR",
            BuildStep::Assemble => "ASCOMSTR",
            BuildStep::AssemblePreprocessed => "ASPPCOMSTR",
            BuildStep::Archive => "ARCOMSTR",
            BuildStep::ArchiveIndex => "RANLIBCOMSTR",
            BuildStep::Link => "LINKCOMSTR",
            BuildStep::BootImage => "BOOTIMAGECOMSTR",
            BuildStep::Iso => "ISOCOMSTR",
            BuildStep::Binary => "BINARYCOMSTR",
        }
    }

    pub fn command_template(&self) -> &'static str {
        match self {
            BuildStep::Compile => "$CC -o $TARGET -c $CFLAGS $CPPFLAGS $SOURCES",
            BuildStep::Assemble => "$AS $ASFLAGS -o $TARGET $SOURCES",
            BuildStep::AssemblePreprocessed => "$CC $ASFLAGS $CPPFLAGS -c -o $TARGET $SOURCES",
            BuildStep::Archive => "$AR $ARFLAGS $TARGET $SOURCES",
            BuildStep::ArchiveIndex => "$RANLIB $TARGET",
            BuildStep::Link => "$CC -o $TARGET $LINKFLAGS $SOURCES $LIBS",
            BuildStep::BootImage => "$MKIMAGE $TARGET $SOURCES",
            BuildStep::Iso => "$MKISOFS -o $TARGET $SOURCES",
            BuildStep::Binary => "$OBJCOPY -O binary $SOURCE $TARGET",
        }
    }

    /// Short progress template installed when verbose output is off.
    ///
    /// Extension steps keep their full command.
    pub fn short_progress(&self) -> Option<&'static str> {
        match self {
            BuildStep::Compile => Some("  CC  $TARGET"),
            BuildStep::Assemble | BuildStep::AssemblePreprocessed => Some("  AS  $TARGET"),
            BuildStep::Archive => Some("  AR  $TARGET"),
            BuildStep::ArchiveIndex => Some("  LIB $TARGET"),
            BuildStep::Link => Some("  LD  $TARGET"),
            BuildStep::BootImage | BuildStep::Iso | BuildStep::Binary => None,
        }
    }

    /// Tool variables the step needs, with their defaults
    pub fn defaults(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            BuildStep::BootImage => &[(vars::MKIMAGE, "mkimage")],
            BuildStep::Iso => &[(vars::MKISOFS, "mkisofs")],
            BuildStep::Binary => &[(vars::OBJCOPY, "objcopy")],
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_generic_step_has_short_progress() {
        for step in BuildStep::GENERIC {
            assert!(step.short_progress().is_some(), "{:?}", step);
        }
        for step in BuildStep::EXTENSIONS {
            assert!(step.short_progress().is_none(), "{:?}", step);
        }
    }

    #[test]
    fn test_progress_var_pairs_with_command_var() {
        for step in BuildStep::GENERIC.iter().chain(BuildStep::EXTENSIONS) {
            assert_eq!(step.progress_var(), format!("{}STR", step.command_var()));
        }
    }
}
