//! Lifecycle supervision of a single long-running process.
//!
//! A [`LifecycleSupervisor`] starts the process in its own session, keeps
//! its pid in a [`PidStore`], observes status by probing the OS and stops it
//! by escalating from `SIGTERM` through `SIGALRM` to `SIGKILL` on the whole
//! process group.
//!
//! Unix only: sessions, process groups and signals come straight from libc.

#[cfg(not(unix))]
compile_error!("warden-core supports Unix targets only");

mod error;
mod lock;
mod narrative;
mod process_manager;
mod record;
mod registrar;
mod supervisor;

pub use error::{Error, Result};
pub use lock::ServiceLock;
pub use narrative::{Narrative, NarrativeSink};
pub use process_manager::{
    CommandSpec, Pgid, ProcessManager, Signal, Spawned, UnixProcessManager,
};
pub use record::{FilePidStore, MemoryPidStore, PidStore};
pub use registrar::{BootRegistrar, Registration, SystemRegistrar};
pub use supervisor::{ActionReport, LifecycleSupervisor, Outcome};
pub use warden_types::{Action, ObservedStatus, ServiceConfig, ServiceName};
