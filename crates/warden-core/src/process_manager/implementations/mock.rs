use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::{
    error::{Error, Result},
    process_manager::{
        base::ProcessManager,
        types::{CommandSpec, Pgid, Signal, Spawned},
    },
};

/// How a scripted process reacts to one kind of signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Exit,
    ExitAfter(Duration),
    Ignore,
}

#[derive(Debug, Clone, Copy)]
pub struct Script {
    /// Exits on its own this long after spawn.
    pub lifetime: Option<Duration>,
    pub on_graceful: Reaction,
    pub on_secondary: Reaction,
    pub on_force: Reaction,
    /// Exits right as its process group is looked up.
    pub exits_on_group_lookup: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            lifetime: None,
            on_graceful: Reaction::Exit,
            on_secondary: Reaction::Exit,
            on_force: Reaction::Exit,
            exits_on_group_lookup: false,
        }
    }
}

#[derive(Debug)]
struct MockProc {
    pid: u32,
    script: Script,
    dies_at: Option<Instant>,
}

impl MockProc {
    fn alive(&self) -> bool {
        self.dies_at.is_none_or(|at| Instant::now() < at)
    }

    fn die_at(&mut self, at: Instant) {
        self.dies_at = Some(self.dies_at.map_or(at, |current| current.min(at)));
    }
}

/// In-memory process table driven by tokio time, so tests can run with
/// paused time.
#[derive(Debug)]
pub struct MockProcessManager {
    next_pid: u32,
    script: Script,
    processes: Vec<MockProc>,
    pub spawned: Vec<CommandSpec>,
    pub signals: Vec<(Pgid, Signal, Instant)>,
}

impl Default for MockProcessManager {
    fn default() -> Self {
        Self::new(Script::default())
    }
}

impl MockProcessManager {
    pub fn new(script: Script) -> Self {
        Self {
            next_pid: 5000,
            script,
            processes: Vec::new(),
            spawned: Vec::new(),
            signals: Vec::new(),
        }
    }

    pub fn signals_sent(&self) -> Vec<Signal> {
        self.signals.iter().map(|(_, signal, _)| *signal).collect()
    }
}

#[async_trait]
impl ProcessManager for MockProcessManager {
    async fn spawn(&mut self, spec: CommandSpec) -> Result<Spawned> {
        let pid = self.next_pid;
        self.next_pid += 1;
        self.spawned.push(spec);

        let dies_at = self.script.lifetime.map(|lifetime| Instant::now() + lifetime);
        self.processes.push(MockProc {
            pid,
            script: self.script,
            dies_at,
        });

        Ok(Spawned { pid })
    }

    async fn is_alive(&mut self, pid: u32) -> bool {
        self.processes
            .iter()
            .any(|proc| proc.pid == pid && proc.alive())
    }

    async fn process_group(&mut self, pid: u32) -> Result<Pgid> {
        let gone = || Error::IOError(std::io::Error::from_raw_os_error(libc::ESRCH));
        let proc = self
            .processes
            .iter_mut()
            .find(|proc| proc.pid == pid)
            .ok_or_else(gone)?;
        if proc.script.exits_on_group_lookup {
            proc.die_at(Instant::now());
        }
        if !proc.alive() {
            return Err(gone());
        }

        Ok(Pgid(i32::try_from(proc.pid).unwrap_or_default()))
    }

    async fn signal_group(&mut self, group: Pgid, signal: Signal) -> Result<()> {
        let now = Instant::now();
        self.signals.push((group, signal, now));

        for proc in &mut self.processes {
            if i32::try_from(proc.pid).ok() != Some(group.0) || !proc.alive() {
                continue;
            }
            let reaction = match signal {
                Signal::Graceful => proc.script.on_graceful,
                Signal::Secondary => proc.script.on_secondary,
                Signal::Force => proc.script.on_force,
            };
            match reaction {
                Reaction::Exit => proc.die_at(now),
                Reaction::ExitAfter(delay) => proc.die_at(now + delay),
                Reaction::Ignore => {}
            }
        }

        Ok(())
    }
}
