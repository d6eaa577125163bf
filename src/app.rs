use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context as _, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;

use crate::error::CommandFailedSnafu;

pub const PROGRAM: &str = env!("CARGO_PKG_NAME");

static VERBOSITY: OnceLock<LevelFilter> = OnceLock::new();

pub fn verbosity() -> LevelFilter {
    VERBOSITY.get().copied().unwrap_or(LevelFilter::Info)
}

pub fn set_global_verbosity(verbosity: LevelFilter) {
    let _ = VERBOSITY.set(verbosity);
}

/// Where a run operates and how loud it is allowed to be.
///
/// Every external command is spawned from `root`; the process never changes
/// its own working directory.
#[derive(Clone, Debug)]
pub struct RepoContext {
    root: PathBuf,
    quiet: bool,
}

impl RepoContext {
    pub fn new(root: impl Into<PathBuf>, quiet: bool) -> Self {
        Self {
            root: root.into(),
            quiet,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn command(&self, program: impl AsRef<OsStr>) -> Command {
        let mut command = Command::new(program);
        command.current_dir(&self.root);
        command
    }

    /// Run a command with its output shown, or captured when quiet.
    pub fn run<I, S>(&self, program: impl AsRef<OsStr>, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = self.command(program);
        command.args(args);
        if self.quiet {
            command.check_output().map(drop)
        } else {
            command.check_run()
        }
    }

    /// Run a command whose output is never shown, behind a spinner unless quiet.
    pub fn run_silently<I, S>(
        &self,
        program: impl AsRef<OsStr>,
        args: I,
        message: impl Into<Cow<'static, str>>,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = self.command(program);
        command.args(args);
        command.wait(message, self.quiet)
    }

    /// Run a command and return its trimmed standard output.
    pub fn capture<I, S>(&self, program: impl AsRef<OsStr>, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = self.command(program);
        command.args(args);
        Ok(command.check_output()?.trim().to_string())
    }
}

/// Adds checked execution to `std::process::Command`.
pub trait CommandExt {
    fn check_run(&mut self) -> Result<()>;
    fn check_output(&mut self) -> Result<String>;
    fn wait(&mut self, message: impl Into<Cow<'static, str>>, hidden: bool) -> Result<()>;
}

impl CommandExt for Command {
    /// Run the command with inherited stdio and fail on a non-zero exit.
    fn check_run(&mut self) -> Result<()> {
        trace!("Running: {}", render_command(self));
        let status = self
            .status()
            .with_context(|| format!("could not run `{}`", render_command(self)))?;
        if status.success() {
            Ok(())
        } else {
            Err(CommandFailedSnafu {
                command: render_command(self),
                code: status.code().unwrap_or(1),
                stderr: String::new(),
            }
            .build()
            .into())
        }
    }

    /// Run the command capturing stdout and stderr, returning stdout on success.
    fn check_output(&mut self) -> Result<String> {
        trace!("Running: {}", render_command(self));
        let output = self
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("could not run `{}`", render_command(self)))?;
        checked(self, output)
    }

    /// Like `check_output`, with a spinner naming the step while it runs.
    fn wait(&mut self, message: impl Into<Cow<'static, str>>, hidden: bool) -> Result<()> {
        trace!("Running: {}", render_command(self));
        let progress_bar = get_progress_bar(hidden)?;
        progress_bar.set_message(message);

        let result = self.stdin(Stdio::null()).output();
        progress_bar.finish_and_clear();
        let output = result.with_context(|| format!("could not run `{}`", render_command(self)))?;
        checked(self, output).map(drop)
    }
}

fn checked(command: &Command, output: Output) -> Result<String> {
    if output.status.success() {
        Ok(String::from_utf8(output.stdout)?)
    } else {
        Err(CommandFailedSnafu {
            command: render_command(command),
            code: output.status.code().unwrap_or(1),
            stderr: String::from_utf8_lossy(&output.stderr),
        }
        .build()
        .into())
    }
}

fn get_progress_bar(hidden: bool) -> Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }

    let progress_bar = ProgressBar::new_spinner();
    progress_bar.enable_steady_tick(Duration::from_millis(125));
    progress_bar.set_style(
        ProgressStyle::with_template("{spinner} {msg:.magenta.bold}")?
            // https://github.com/sindresorhus/cli-spinners/blob/master/spinners.json
            .tick_strings(&["∙∙∙", "●∙∙", "∙●∙", "∙∙●", "∙∙∙"]),
    );

    Ok(progress_bar)
}

pub fn render_command(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(OsStr::to_string_lossy)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn commands_start_in_the_repository_root() {
        let context = RepoContext::new("/tmp/linguist", false);
        let command = context.command("git");
        assert_eq!(command.get_current_dir(), Some(Path::new("/tmp/linguist")));
    }

    #[test]
    fn renders_program_and_arguments() {
        let mut command = Command::new("git");
        command.args(["submodule", "add", "-f", "https://example.com/a/b"]);
        assert_eq!(
            render_command(&command),
            "git submodule add -f https://example.com/a/b"
        );
    }

    #[cfg(unix)]
    #[test]
    fn failing_commands_report_their_status() {
        let dir = tempfile::tempdir().unwrap();
        let context = RepoContext::new(dir.path(), true);
        let error = context.run("sh", ["-c", "echo nope >&2; exit 3"]).unwrap_err();
        let error = error.downcast_ref::<Error>().unwrap();
        assert_eq!(error.exit_code(), 3);
        assert!(error.to_string().contains("nope"));
    }

    #[cfg(unix)]
    #[test]
    fn capture_trims_output() {
        let dir = tempfile::tempdir().unwrap();
        let context = RepoContext::new(dir.path(), true);
        let output = context.capture("sh", ["-c", "echo '  hello  '"]).unwrap();
        assert_eq!(output, "hello");
    }

    #[cfg(unix)]
    #[test]
    fn silent_runs_discard_output() {
        let dir = tempfile::tempdir().unwrap();
        let context = RepoContext::new(dir.path(), true);
        context
            .run_silently("sh", ["-c", "echo hidden"], "Waiting")
            .unwrap();
    }
}
