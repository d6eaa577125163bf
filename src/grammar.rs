use std::path::PathBuf;

use anyhow::Result;
use snafu::{OptionExt as _, ensure};

use crate::app::RepoContext;
use crate::error::{InvalidUrlSnafu, SubmoduleExistsSnafu};
use crate::paths;

/// A grammar repository resolved to its canonical URL and vendored location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grammar {
    pub url: String,
    /// Relative to the repository root.
    pub path: PathBuf,
}

impl Grammar {
    /// Canonicalize `url` to HTTPS with the normalizer script and derive the
    /// submodule path from it.
    pub fn resolve(context: &RepoContext, url: &str) -> Result<Self> {
        let normalized = context.capture(
            context.root().join(paths::NORMALISE_URL),
            ["--protocol=https", url],
        )?;
        debug!("Normalized {url} to {normalized}");
        Self::from_url(&normalized)
    }

    pub fn from_url(url: &str) -> Result<Self> {
        let name = repository_name(url).context(InvalidUrlSnafu { url })?;
        Ok(Self {
            url: url.to_string(),
            path: paths::grammar_path(name),
        })
    }

    /// Refuse to register over anything already at the submodule path.
    pub fn ensure_absent(&self, context: &RepoContext) -> Result<()> {
        let full_path = context.root().join(&self.path);
        ensure!(
            !full_path.exists() && !full_path.is_symlink(),
            SubmoduleExistsSnafu { path: &self.path }
        );
        Ok(())
    }
}

/// Last path segment of a repository URL, without any `.git` suffix.
pub fn repository_name(url: &str) -> Option<&str> {
    let last = url.trim_end_matches('/').rsplit('/').next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);
    (!name.is_empty() && !name.contains(':')).then_some(name)
}
