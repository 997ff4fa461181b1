use std::{fmt, path::PathBuf};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
    /// File that receives both stdout and stderr, appended to.
    pub output: Option<PathBuf>,
}

/// Process group identifier.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Pgid(pub i32);

impl fmt::Display for Pgid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Spawned {
    pub pid: u32,
}

/// The three escalation steps of a shutdown.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Signal {
    /// Polite request, may be ignored.
    Graceful,
    /// Unusual follow-up for processes that ignored the first one.
    Secondary,
    /// Cannot be caught or ignored.
    Force,
}

impl Signal {
    #[must_use]
    pub fn as_raw(self) -> libc::c_int {
        match self {
            Self::Graceful => libc::SIGTERM,
            Self::Secondary => libc::SIGALRM,
            Self::Force => libc::SIGKILL,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Graceful => "SIGTERM",
            Self::Secondary => "SIGALRM",
            Self::Force => "SIGKILL",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
