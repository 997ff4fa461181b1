use std::{fs::OpenOptions, process::Stdio};

use libc::{getpgid, kill, killpg, setsid, EPERM, ESRCH};
use tokio::process::{Child, Command};

use crate::{
    error::{Error, Result},
    process_manager::{
        base::ProcessManager,
        types::{CommandSpec, Pgid, Signal, Spawned},
    },
};

#[derive(Debug)]
struct ChildRec {
    child: Child,
    pid: u32,
}

/// Unix-specific process manager.
///
/// Children spawned by this manager are reaped on probe so an exited child
/// is never mistaken for a live zombie. Other pids are probed with signal 0.
#[derive(Debug)]
pub struct UnixProcessManager {
    processes: Vec<ChildRec>,
}

impl Default for UnixProcessManager {
    fn default() -> Self {
        Self::new()
    }
}

impl UnixProcessManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            processes: Vec::new(),
        }
    }

    fn probe(pid: u32) -> bool {
        let Ok(pid) = libc::pid_t::try_from(pid) else {
            return false;
        };
        if pid <= 0 {
            return false;
        }

        #[allow(unsafe_code)]
        let rc = unsafe { kill(pid, 0) };
        if rc == 0 {
            return true;
        }
        // The process exists but belongs to someone else.
        std::io::Error::last_os_error().raw_os_error() == Some(EPERM)
    }
}

fn output_sink(spec: &CommandSpec) -> Result<(Stdio, Stdio)> {
    let Some(path) = &spec.output else {
        return Ok((Stdio::null(), Stdio::null()));
    };
    let stdout = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(Error::IOError)?;
    let stderr = stdout.try_clone().map_err(Error::IOError)?;

    Ok((Stdio::from(stdout), Stdio::from(stderr)))
}

#[async_trait::async_trait]
impl ProcessManager for UnixProcessManager {
    async fn spawn(&mut self, spec: CommandSpec) -> Result<Spawned> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args).current_dir(&spec.cwd);
        for (k, v) in &spec.env {
            cmd.env(k, v);
        }

        #[allow(unsafe_code)]
        unsafe {
            cmd.pre_exec(|| {
                if setsid() == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }

        let (stdout, stderr) = output_sink(&spec)?;
        cmd.stdin(Stdio::null()).stdout(stdout).stderr(stderr);

        let child = cmd.spawn().map_err(Error::IOError)?;
        let pid = child
            .id()
            .ok_or_else(|| Error::IOError(std::io::Error::other("pid not available")))?;

        tracing::debug!("Spawned {:?} as pid {pid}", spec.name);
        self.processes.push(ChildRec { child, pid });

        Ok(Spawned { pid })
    }

    async fn is_alive(&mut self, pid: u32) -> bool {
        if let Some(index) = self.processes.iter().position(|p| p.pid == pid) {
            match self.processes[index].child.try_wait() {
                Ok(Some(status)) => {
                    tracing::debug!("Reaped pid {pid}: {status}");
                    self.processes.swap_remove(index);
                    return false;
                }
                Ok(None) => return true,
                Err(err) => tracing::warn!("Cannot poll child {pid}: {err}"),
            }
        }

        Self::probe(pid)
    }

    async fn process_group(&mut self, pid: u32) -> Result<Pgid> {
        let pid = libc::pid_t::try_from(pid)
            .map_err(|_| Error::IOError(std::io::Error::other("pid out of range")))?;

        #[allow(unsafe_code)]
        let pgid = unsafe { getpgid(pid) };
        if pgid == -1 {
            return Err(Error::IOError(std::io::Error::last_os_error()));
        }

        Ok(Pgid(pgid))
    }

    async fn signal_group(&mut self, group: Pgid, signal: Signal) -> Result<()> {
        #[allow(unsafe_code)]
        let rc = unsafe { killpg(group.0, signal.as_raw()) };
        if rc == -1 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() == Some(ESRCH) {
                tracing::debug!("Process group {group} already gone before {signal}");
                return Ok(());
            }
            return Err(Error::Signal {
                pgid: group.0,
                source: err,
            });
        }

        tracing::debug!("Sent {signal} to process group {group}");
        Ok(())
    }
}
