pub mod package;
pub mod qmgr;

use std::path::PathBuf;

/// Finds an executable by name. Used to detect installed tools.
pub trait BinaryLookup {
    fn find(&self, name: &str) -> Option<PathBuf>;
}

/// Looks up executables in `PATH`.
pub struct PathLookup;

impl BinaryLookup for PathLookup {
    fn find(&self, name: &str) -> Option<PathBuf> {
        match which::which(name) {
            Ok(path) => Some(path),
            Err(error) => {
                log::debug!("Cannot find `{name}` in PATH: {error}");
                None
            }
        }
    }
}
