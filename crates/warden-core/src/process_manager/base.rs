use crate::{
    error::Result,
    process_manager::types::{CommandSpec, Pgid, Signal, Spawned},
};

#[async_trait::async_trait]
pub trait ProcessManager: Send + Sync {
    /// Spawn a new process in its own session.
    async fn spawn(&mut self, spec: CommandSpec) -> Result<Spawned>;
    /// Probe whether `pid` still names a live process.
    async fn is_alive(&mut self, pid: u32) -> bool;
    /// Look up the process group `pid` belongs to.
    async fn process_group(&mut self, pid: u32) -> Result<Pgid>;
    /// Deliver `signal` to every member of `group`.
    async fn signal_group(&mut self, group: Pgid, signal: Signal) -> Result<()>;
}
