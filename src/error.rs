use std::path::PathBuf;

use snafu::Snafu;

pub const SETUP_DOCS: &str =
    "https://github.com/github-linguist/linguist/blob/main/CONTRIBUTING.md#dependencies";

/// Failures that stop a run before or while it touches the repository.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("required command `{command}` was not found on PATH; see {SETUP_DOCS}"))]
    MissingCommand { command: String },

    #[snafu(display("`{tool}` is not running or its daemon is unreachable"))]
    ContainerEngineUnreachable { tool: String },

    #[snafu(display("not inside a git work tree: {source}"))]
    NotARepository { source: git2::Error },

    #[snafu(display("could not derive a grammar name from URL {url:?}"))]
    InvalidUrl { url: String },

    #[snafu(display(
        "submodule '{}' already exists; pass --replace to swap it for a new one",
        path.display()
    ))]
    SubmoduleExists { path: PathBuf },

    #[snafu(display("no submodule registered under vendor/grammars matches '{target}'"))]
    ReplaceTargetNotFound { target: String },

    #[snafu(display("command `{command}` failed with exit code {code}{}", details(stderr)))]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },
}

fn details(stderr: &str) -> String {
    let stderr = stderr.trim_end();
    if stderr.is_empty() {
        String::new()
    } else {
        format!("\n{stderr}")
    }
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CommandFailed { code, .. } => *code,
            _ => 1,
        }
    }
}

/// Exit status for any error bubbled up to `main`.
pub fn exit_code(error: &anyhow::Error) -> i32 {
    error.downcast_ref::<Error>().map_or(1, Error::exit_code)
}
