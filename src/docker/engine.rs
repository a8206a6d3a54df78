use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};

/// Verify that the engine daemon behind `program` is reachable.
pub fn ensure_available(program: &str) -> Result<()> {
    let status = Command::new(program)
        .args(["version", "--format", "{{.Server.Version}}"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .with_context(|| format!("failed to invoke `{program}`; is it installed and on PATH?"))?;

    if !status.success() {
        bail!("{program} daemon is not running (exit {})", status);
    }
    Ok(())
}
