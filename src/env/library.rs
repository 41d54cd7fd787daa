//! Library dependencies for build environments

use super::{vars, Environment};

/// Make `libs` available to code built in `env`.
///
/// For each library, in order: its source directory `#lib/<name>` joins the
/// include path, its output directory `#<BUILDROOT>/lib/<name>` joins the
/// library path, and the name joins the link libraries. Nothing is
/// de-duplicated.
pub fn append_libraries<S: AsRef<str>>(env: &mut Environment, libs: &[S]) {
    let buildroot = env.get_str(vars::BUILDROOT).unwrap_or_default();

    for lib in libs {
        let lib = lib.as_ref();
        env.append(vars::CPPPATH, [format!("#lib/{}", lib)]);
        env.append(vars::LIBPATH, [format!("#{}/lib/{}", buildroot, lib)]);
        env.append(vars::LIBS, [lib]);
    }
}
