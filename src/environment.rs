use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::Result;
use snafu::ensure;

use crate::error::{ContainerEngineUnreachableSnafu, MissingCommandSnafu};

/// Tools the run shells out to, besides the container engine.
pub const REQUIRED_TOOLS: &[&str] = &["git", "sed", "bundle"];

/// Fail if any required tool, or the container engine, is not on `PATH`.
pub fn check_tools(container_tool: &str) -> Result<()> {
    let path = env::var_os("PATH").unwrap_or_default();
    for tool in std::iter::once(container_tool).chain(REQUIRED_TOOLS.iter().copied()) {
        ensure!(
            find_in_path(tool, &path).is_some(),
            MissingCommandSnafu { command: tool }
        );
        debug!("Found `{tool}`");
    }
    Ok(())
}

/// Ask the container engine for its status; a stopped daemon fails the run.
pub fn check_container_engine(container_tool: &str) -> Result<()> {
    trace!("Running: {container_tool} info");
    let reachable = Command::new(container_tool)
        .arg("info")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success());
    ensure!(
        reachable,
        ContainerEngineUnreachableSnafu {
            tool: container_tool
        }
    );
    Ok(())
}

/// Resolve `program` the way a shell would, against a `PATH`-style list.
pub fn find_in_path(program: &str, path: &OsStr) -> Option<PathBuf> {
    if program.contains(std::path::MAIN_SEPARATOR) {
        let candidate = PathBuf::from(program);
        return is_executable(&candidate).then_some(candidate);
    }
    env::split_paths(path)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt as _;

    path.metadata()
        .is_ok_and(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs;
    use std::os::unix::fs::PermissionsExt as _;

    use super::*;
    use crate::error::Error;

    fn install(dir: &Path, name: &str, mode: u32) {
        let file = dir.join(name);
        fs::write(&file, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn resolves_executables_across_path_entries() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        install(second.path(), "bundle", 0o755);

        let path = env::join_paths([first.path(), second.path()]).unwrap();
        assert_eq!(
            find_in_path("bundle", &path),
            Some(second.path().join("bundle"))
        );
    }

    #[test]
    fn skips_files_without_execute_permission() {
        let dir = tempfile::tempdir().unwrap();
        install(dir.path(), "sed", 0o644);

        let path = env::join_paths([dir.path()]).unwrap();
        assert_eq!(find_in_path("sed", &path), None);
    }

    #[test]
    fn missing_tool_is_reported_by_name() {
        let error = check_tools("definitely-not-a-container-engine").unwrap_err();
        match error.downcast_ref::<Error>() {
            Some(Error::MissingCommand { command }) => {
                assert_eq!(command, "definitely-not-a-container-engine");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unreachable_engine_fails() {
        let error = check_container_engine("false").unwrap_err();
        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::ContainerEngineUnreachable { .. })
        ));
    }
}
