// ============================================================================
// bagcheck-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Availability Checks for Command-Line Collaborators
//
// The only external tool the core talks to is ffprobe, through the
// `metadata::FfprobeInspector`. Before it is used, the CLI confirms the binary
// can be started at all so a missing tool is reported once, up front, instead
// of as one inspection failure per file.

use std::io;
use std::process::{Command, Stdio};

use crate::error::{CoreError, CoreResult};

/// Checks if a required external command is available and executable.
///
/// Runs `<cmd_name> -version` with output discarded. Any exit status counts
/// as available; only failing to start the process does not.
///
/// # Returns
///
/// * `Ok(())` - the command could be started
/// * `Err(CoreError::DependencyNotFound)` - the command is not on `PATH`
/// * `Err(CoreError::Io)` - the command exists but could not be started
pub fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", cmd_name);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", cmd_name);
            Err(CoreError::DependencyNotFound(cmd_name.to_string()))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{}': {}", cmd_name, e);
            Err(CoreError::Io(e))
        }
    }
}
