//! Post-install restart hooks.
//!
//! A hook runs exactly once, only after the new binary is in place. It is how
//! a supervising process (systemd, a launcher, a parent over IPC) learns that
//! a restart is required.

use crate::error::HookError;
use std::process::Command;

/// Notified after a successful binary replacement.
pub trait RestartHook: Send + Sync {
    /// Signal that the binary changed.
    ///
    /// # Errors
    ///
    /// Returns a [`HookError`] if the notification could not be delivered.
    fn notify(&self) -> Result<(), HookError>;
}

/// Hook that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl RestartHook for NoopHook {
    fn notify(&self) -> Result<(), HookError> {
        Ok(())
    }
}

/// Hook that runs an external command and waits for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandHook {
    program: String,
    args: Vec<String>,
}

impl CommandHook {
    /// Run `program` with `args`.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// `systemctl restart <unit>`.
    pub fn systemd(unit: impl Into<String>) -> Self {
        Self::new("systemctl", ["restart".to_owned(), unit.into()])
    }

    /// Program that will be executed.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the program.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl RestartHook for CommandHook {
    fn notify(&self) -> Result<(), HookError> {
        tracing::info!(program = %self.program, args = ?self.args, "running restart hook");

        // stdout/stderr are inherited so supervisor output reaches the operator.
        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .map_err(|source| HookError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(HookError::Failed {
                program: self.program.clone(),
                status,
            });
        }
        Ok(())
    }
}

/// Hook backed by a closure.
pub struct FnHook<F>(pub F);

impl<F> RestartHook for FnHook<F>
where
    F: Fn() -> Result<(), HookError> + Send + Sync,
{
    fn notify(&self) -> Result<(), HookError> {
        (self.0)()
    }
}

impl<F> std::fmt::Debug for FnHook<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnHook(..)")
    }
}
