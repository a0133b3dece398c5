//! Subprocess execution utilities.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_os_string()));
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// Spawn the process with inherited stdio.
    ///
    /// Compiler diagnostics go straight to the user's terminal.
    pub fn spawn_scoped(&self) -> io::Result<ScopedChild> {
        let child = self
            .build_command()
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()?;
        Ok(ScopedChild { child: Some(child) })
    }

    /// Display the command for logs and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().map(|a| a.to_string_lossy().into_owned()));
        parts.join(" ")
    }
}

/// A child process that is always reaped.
///
/// [`ScopedChild::wait`] blocks until exit. If the handle is dropped
/// before that (an early return on an error path) the child is killed
/// and reaped so no zombie outlives the caller.
#[derive(Debug)]
pub struct ScopedChild {
    child: Option<Child>,
}

impl ScopedChild {
    /// OS process id.
    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().map(|c| c.id())
    }

    /// Block until the child exits, retrying interrupted waits.
    pub fn wait(mut self) -> io::Result<ExitStatus> {
        let Some(mut child) = self.child.take() else {
            return Err(io::Error::new(io::ErrorKind::Other, "child already reaped"));
        };

        loop {
            match child.wait() {
                Ok(status) => return Ok(status),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    // put it back so Drop still reaps it
                    self.child = Some(child);
                    return Err(e);
                }
            }
        }
    }
}

impl Drop for ScopedChild {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                tracing::debug!("failed to kill child {}: {}", child.id(), e);
            }
            let _ = child.wait();
        }
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}
