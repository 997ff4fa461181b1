use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

pub const DEFAULT_MAX_START_WAIT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_STOP_WAIT: Duration = Duration::from_secs(5);
pub const DEFAULT_RUN_DIR: &str = "/var/run";
pub const DEFAULT_CONSOLE_LOG: &str = "console.log";

/// Identity of the supervised service.
///
/// The full name (`company-app`, or just `app` without a company) keys the
/// process record, the bare app name is what gets registered for boot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceName {
    pub company: Option<String>,
    pub app: String,
}

impl ServiceName {
    #[must_use]
    pub fn new(company: Option<String>, app: impl Into<String>) -> Self {
        Self {
            company: company.filter(|c| !c.trim().is_empty()),
            app: app.into(),
        }
    }

    #[must_use]
    pub fn full(&self) -> String {
        match &self.company {
            Some(company) => format!("{company}-{}", self.app),
            None => self.app.clone(),
        }
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full())
    }
}

/// Everything one supervisor invocation needs to know about its service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub name: ServiceName,
    pub executable: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub env: Vec<(String, String)>,
    /// Whole seconds. Zero means the first probe decides.
    pub max_start_wait: Duration,
    /// Whole seconds. Zero means the first probe decides.
    pub max_stop_wait: Duration,
    pub run_dir: PathBuf,
    /// Sink for the managed process stdout and stderr.
    pub console_log: PathBuf,
    /// Append-only audit trail of start/stop requests.
    pub service_log: Option<PathBuf>,
    /// Keep the record after `SIGKILL` unless death is confirmed.
    pub strict_kill: bool,
    /// Serialize invocations through an advisory lock next to the record.
    pub lock: bool,
}

impl ServiceConfig {
    /// Config with default waits and sinks. The working directory is the
    /// executable's directory, or `.` when it has none.
    #[must_use]
    pub fn new(name: ServiceName, executable: impl Into<PathBuf>) -> Self {
        let executable = executable.into();
        let working_dir = executable
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let console_log = working_dir.join(DEFAULT_CONSOLE_LOG);

        Self {
            name,
            executable,
            args: Vec::new(),
            working_dir,
            env: Vec::new(),
            max_start_wait: DEFAULT_MAX_START_WAIT,
            max_stop_wait: DEFAULT_MAX_STOP_WAIT,
            run_dir: PathBuf::from(DEFAULT_RUN_DIR),
            console_log,
            service_log: None,
            strict_kill: false,
            lock: false,
        }
    }

    /// Path of the process record for this service.
    #[must_use]
    pub fn record_path(&self) -> PathBuf {
        self.run_dir.join(format!("{}.pid", self.name.full()))
    }
}

/// Status derived from the record and a liveness probe. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservedStatus {
    Stopped,
    Running(u32),
    Crashed(u32),
}

impl ObservedStatus {
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        match self {
            Self::Stopped => None,
            Self::Running(pid) | Self::Crashed(pid) => Some(*pid),
        }
    }
}

impl fmt::Display for ObservedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => f.write_str("stopped"),
            Self::Running(_) => f.write_str("running"),
            Self::Crashed(_) => f.write_str("crashed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Start,
    Stop,
    Status,
    Restart,
    Autostart,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Start,
        Action::Stop,
        Action::Status,
        Action::Restart,
        Action::Autostart,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Status => "status",
            Self::Restart => "restart",
            Self::Autostart => "autostart",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown action `{0}`, expected one of start|stop|restart|status|autostart")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_owned()))
    }
}
