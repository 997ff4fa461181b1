use std::{
    ffi::OsString,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    process::Stdio,
};

use tokio::process::Command;

use crate::error::Result;

/// Result of handing the service to one boot facility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub tool: String,
    pub succeeded: bool,
}

/// Platform facility that starts services at boot.
#[async_trait::async_trait]
pub trait BootRegistrar: Send + Sync {
    /// Register `app` with every facility found. An empty result means no
    /// known facility exists on this system.
    async fn register(&mut self, app: &str) -> Result<Vec<Registration>>;
}

/// SysV style registration through `chkconfig` and `update-rc.d`.
#[derive(Debug, Clone, Default)]
pub struct SystemRegistrar {
    search_path: Option<OsString>,
}

impl SystemRegistrar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look tools up in `path` instead of `$PATH`.
    #[must_use]
    pub fn with_search_path(path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(path.into()),
        }
    }

    fn find(&self, tool: &str) -> Option<PathBuf> {
        let path = self
            .search_path
            .clone()
            .or_else(|| std::env::var_os("PATH"))?;
        std::env::split_paths(&path)
            .map(|dir| dir.join(tool))
            .find(|candidate| is_executable(candidate))
    }
}

fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[async_trait::async_trait]
impl BootRegistrar for SystemRegistrar {
    async fn register(&mut self, app: &str) -> Result<Vec<Registration>> {
        let tools: [(&str, Vec<&str>); 2] = [
            ("chkconfig", vec!["--add", app]),
            ("update-rc.d", vec![app, "defaults"]),
        ];

        let mut registrations = Vec::new();
        for (tool, args) in tools {
            let Some(program) = self.find(tool) else {
                tracing::debug!("{tool} not found");
                continue;
            };

            tracing::info!("Registering {app:?} with {program:?}");
            let status = Command::new(&program)
                .args(&args)
                .stdout(Stdio::null())
                .status()
                .await?;
            if !status.success() {
                tracing::warn!("{tool} exited with {status}");
            }

            registrations.push(Registration {
                tool: tool.to_owned(),
                succeeded: status.success(),
            });
        }

        Ok(registrations)
    }
}
