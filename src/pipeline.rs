use std::path::PathBuf;

use anyhow::Result;

use crate::app::RepoContext;
use crate::paths;

/// One post-registration task, run from the repository root.
#[derive(Debug, PartialEq, Eq)]
pub struct Step {
    pub message: &'static str,
    pub program: &'static str,
    pub args: &'static [&'static str],
}

impl Step {
    const fn new(
        message: &'static str,
        program: &'static str,
        args: &'static [&'static str],
    ) -> Self {
        Self {
            message,
            program,
            args,
        }
    }

    /// Scripts are resolved against the root; plain tools go through `PATH`.
    fn executable(&self, context: &RepoContext) -> PathBuf {
        if self.program.contains('/') {
            context.root().join(self.program)
        } else {
            PathBuf::from(self.program)
        }
    }
}

/// License cache, samples, submodule order and grammar list, in that order.
pub fn steps() -> Vec<Step> {
    vec![
        Step::new(
            "Caching grammar license",
            "bundle",
            &["exec", "licensed", "cache", "-c", paths::LICENSES_CONFIG],
        ),
        Step::new("Updating samples", "bundle", &["exec", "rake", "samples"]),
        Step::new("Sorting submodules", paths::SORT_SUBMODULES, &[]),
        Step::new("Updating grammar documentation", paths::LIST_GRAMMARS, &[]),
    ]
}

/// Run every step, stopping at the first failure.
pub fn run(context: &RepoContext) -> Result<()> {
    for step in steps() {
        info!("{}", step.message);
        context.run_silently(
            step.executable(context),
            step.args,
            step.message,
        )?;
    }
    Ok(())
}
