use warden_types::{Action, ObservedStatus};

/// What an action ended up doing. Failures here are reported, not raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Status(ObservedStatus),
    /// A record already exists; nothing was spawned.
    AlreadyRunning(ObservedStatus),
    Started {
        pid: u32,
    },
    /// The process did not survive the startup window. The record is kept.
    StartTimeout {
        pid: u32,
    },
    AlreadyStopped,
    /// The record named a dead process.
    NothingToKill {
        pid: u32,
    },
    Stopped {
        pid: u32,
    },
    /// Needed the secondary signal, and with `forced` also `SIGKILL`.
    StopEscalated {
        pid: u32,
        forced: bool,
    },
    /// `SIGKILL` did not take under strict kill. The record is kept.
    StopFailed {
        pid: u32,
    },
    Restarted {
        stop: Box<Outcome>,
        start: Box<Outcome>,
    },
    Registered {
        tools: Vec<String>,
    },
    NoRegistrar,
}

impl Outcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            Self::StartTimeout { .. } | Self::StopFailed { .. } | Self::NoRegistrar => false,
            Self::Restarted { stop, start } => stop.is_success() && start.is_success(),
            _ => true,
        }
    }

    /// Succeeded, but not the way an operator would hope.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        match self {
            Self::StopEscalated { .. } => true,
            Self::Restarted { stop, start } => stop.is_warning() || start.is_warning(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    pub action: Action,
    pub outcome: Outcome,
    pub narrative: Vec<String>,
}

impl ActionReport {
    #[must_use]
    pub fn success(&self) -> bool {
        self.outcome.is_success()
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.success())
    }
}
