use serde::Deserialize;
use simple_error::SimpleError;
use std::collections::HashMap;
use std::error::Error;
use std::fs::read_to_string;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use which::which_in;

/// Describes how to launch vendor tools on this machine.
///
/// Loaded from a TOML file such as:
///
/// ```toml
/// use_wine = false
///
/// [env]
/// PATH = "/usr/local/diamond/3.13/bin/lin64:/usr/bin"
/// FOUNDRY = "/usr/local/diamond/3.13/ispfpga"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Toolchain {
    #[serde(default)]
    pub use_wine: bool,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Toolchain {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let s = read_to_string(path)?;
        Self::from_toml(&s)
    }

    pub fn from_toml(s: &str) -> Result<Self, Box<dyn Error>> {
        Ok(toml::from_str(s)?)
    }

    pub fn command(&self, cmd: &str) -> Command {
        let mut res: Command;
        if self.use_wine {
            res = Command::new("wine");
            res.arg(cmd);
        } else if let Some(path) = self.env.get("PATH") {
            // if the lookup fails, let spawn report the missing binary.
            res = match which_in(cmd, Some(path), "/") {
                Ok(rcmd) => Command::new(rcmd),
                Err(_) => Command::new(cmd),
            };
        } else {
            res = Command::new(cmd);
        }
        for (k, v) in self.env.iter() {
            res.env(k, v);
        }
        res
    }

    /// Runs a tool to completion inside `dir`, failing on a non-zero exit status.
    ///
    /// On failure, the tool's stdout and stderr are echoed to our stderr when `verbose` is set,
    /// and the tail of its stderr is included in the returned error.
    pub fn run(
        &self,
        cmd: &str,
        args: &[&str],
        dir: &Path,
        verbose: bool,
    ) -> Result<Output, SimpleError> {
        let mut command = self.command(cmd);
        command.current_dir(dir.as_os_str());
        command.stdin(Stdio::null());
        command.args(args);
        let output = command
            .output()
            .map_err(|e| SimpleError::new(format!("failed to run {cmd}: {e}")))?;
        if !output.status.success() {
            if verbose {
                let _ = std::io::stderr().write_all(&output.stdout);
                let _ = std::io::stderr().write_all(&output.stderr);
            }
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail = stderr.lines().last().unwrap_or("").trim();
            return Err(SimpleError::new(format!(
                "non-zero {cmd} exit status ({status}): {tail}",
                status = output.status
            )));
        }
        Ok(output)
    }
}
