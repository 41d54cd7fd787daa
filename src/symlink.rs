//! Architecture header link
//!
//! `include/buildcfg` points at the header directory of the configured
//! architecture. Refreshing it is best effort: failures are logged and setup
//! carries on.

use std::fs;
use std::io;
use std::path::Path;

/// Location of the link, relative to the project root
pub const ARCH_LINK: &str = "include/buildcfg";

/// Replace the link at `link` with one pointing at `arch`.
///
/// Removal and creation fail independently; neither failure is returned.
pub fn refresh_arch_link(link: &Path, arch: &str) {
    if let Err(e) = fs::remove_file(link) {
        if e.kind() == io::ErrorKind::NotFound {
            tracing::debug!(link = %link.display(), "no previous link to remove");
        } else {
            tracing::warn!(link = %link.display(), error = %e, "failed to remove link");
        }
    }

    if let Err(e) = create_link(arch, link) {
        tracing::warn!(
            link = %link.display(),
            points_to = arch,
            error = %e,
            "failed to create link"
        );
    }
}

#[cfg(unix)]
fn create_link(target: &str, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_link(target: &str, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(not(any(unix, windows)))]
fn create_link(_target: &str, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "symbolic links are not supported"))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_creates_link_when_none_exists() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("buildcfg");

        refresh_arch_link(&link, "x86");

        assert_eq!(fs::read_link(&link).unwrap(), Path::new("x86"));
    }

    #[test]
    fn test_replaces_existing_link() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("buildcfg");
        std::os::unix::fs::symlink("mips", &link).unwrap();

        refresh_arch_link(&link, "x86");

        assert_eq!(fs::read_link(&link).unwrap(), Path::new("x86"));
    }

    #[test]
    fn test_missing_parent_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("no/such/dir/buildcfg");

        refresh_arch_link(&link, "x86");

        assert!(fs::symlink_metadata(&link).is_err());
    }
}
