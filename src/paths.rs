//! Repository layout and root detection.

use std::path::{Path, PathBuf};

use anyhow::Result;
use snafu::ResultExt as _;

use crate::error::NotARepositorySnafu;

pub const GRAMMARS_DIR: &str = "vendor/grammars";
pub const LICENSES_CONFIG: &str = "vendor/licenses/config.yml";

pub const GRAMMAR_COMPILER: &str = "script/grammar-compiler";
pub const NORMALISE_URL: &str = "script/normalise-url";
pub const SORT_SUBMODULES: &str = "script/sort-submodules";
pub const LIST_GRAMMARS: &str = "script/list-grammars";

/// Locate the top of the work tree enclosing `start`.
pub fn find_repo_root(start: &Path) -> Result<PathBuf> {
    let repo = git2::Repository::discover(start).context(NotARepositorySnafu)?;
    let root = repo.workdir().unwrap_or_else(|| repo.path());
    Ok(dunce::canonicalize(root)?)
}

/// `vendor/grammars/<name>`, relative to the repository root.
pub fn grammar_path(name: &str) -> PathBuf {
    Path::new(GRAMMARS_DIR).join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_root_from_a_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        git2::Repository::init(dir.path()).unwrap();
        let nested = dir.path().join("vendor/grammars");
        std::fs::create_dir_all(&nested).unwrap();

        let root = find_repo_root(&nested).unwrap();
        assert_eq!(root, dunce::canonicalize(dir.path()).unwrap());
    }

    #[test]
    fn outside_a_repository_is_a_precondition_failure() {
        let dir = tempfile::tempdir().unwrap();
        let error = find_repo_root(dir.path()).unwrap_err();
        let error = error.downcast_ref::<crate::error::Error>();
        assert!(matches!(
            error,
            Some(crate::error::Error::NotARepository { .. })
        ));
    }

    #[test]
    fn grammar_paths_live_under_vendor() {
        assert_eq!(grammar_path("bar"), PathBuf::from("vendor/grammars/bar"));
    }
}
