use crate::ChangesError;
use std::{ffi::OsStr, path::Path};
use tokio::process::Command;
use tracing::{debug, instrument};

/// Run `program` to completion and return its stdout.
///
/// A non-zero exit status is an error carrying stderr.
#[instrument(skip_all, fields(program = %program.display()))]
pub(crate) async fn run_command<I, S>(
    program: &Path,
    args: I,
    current_dir: Option<&Path>,
) -> Result<String, ChangesError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args).kill_on_drop(true);
    if let Some(dir) = current_dir {
        command.current_dir(dir);
    }

    let description = format!("{:?}", command.as_std());
    debug!(command = description, "running");

    let output = command
        .output()
        .await
        .map_err(|source| ChangesError::Spawn {
            command: description.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(ChangesError::CommandFailed {
            command: description,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
