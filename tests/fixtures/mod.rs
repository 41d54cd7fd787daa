//! Scratch project fixtures
//!
//! Writes a global `build.conf` and a system config into a temporary project
//! root so setup can run end to end without a real toolchain.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Global config used by most tests
pub const GLOBAL_X86: &str = "\
VERSION = '1.0'
ARCH = 'x86'
SYSTEM = 'pc'
COMPILER = 'config/x86/pc/build.conf'
BUILDROOT = 'build'
";

/// System config matching [`GLOBAL_X86`]
pub const SYSTEM_X86: &str = "\
CC = 'i686-elf-gcc'
AS = 'i686-elf-as'
LD = 'i686-elf-ld'
CFLAGS = ['-Wall', '-fbogus', '-O2']
ASFLAGS = ['--32']
LINKFLAGS = ['-static', '-nostdlib']
LINKKERN = ['-Tkernel/x86/pc/kernel.ld']
LINKUSER = ['-Tlib/libposix/user.ld']
CPPPATH = ['#include']
";

/// A scratch project root
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    /// Project with the given global and system configs and an `include/`
    /// directory for the architecture link
    pub fn new(global: &str, system: &str) -> Self {
        let dir = tempfile::tempdir().expect("create project dir");
        write(dir.path(), "build.conf", global);
        write(dir.path(), "config/x86/pc/build.conf", system);
        fs::create_dir_all(dir.path().join("include")).expect("create include dir");
        Self { dir }
    }

    pub fn x86() -> Self {
        Self::new(GLOBAL_X86, SYSTEM_X86)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, contents: &str) {
        write(self.root(), relative, contents);
    }
}

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write fixture");
}
