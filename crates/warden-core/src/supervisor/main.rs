use std::{fs::OpenOptions, io::Write, path::PathBuf, time::Duration};

use tokio::time::sleep;
use warden_types::{Action, ObservedStatus, ServiceConfig};

use crate::{
    error::{Error, Result},
    lock::ServiceLock,
    narrative::Narrative,
    process_manager::{CommandSpec, ProcessManager, Signal, UnixProcessManager},
    record::{FilePidStore, PidStore},
    registrar::{BootRegistrar, SystemRegistrar},
    supervisor::report::{ActionReport, Outcome},
};

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Drives one service through start, stop, status, restart and autostart.
///
/// State lives only in the process record and the OS process table; every
/// status is observed fresh.
#[derive(Debug)]
pub struct LifecycleSupervisor<P, S, R> {
    config: ServiceConfig,
    process_manager: P,
    store: S,
    registrar: R,
    narrative: Narrative,
}

impl LifecycleSupervisor<UnixProcessManager, FilePidStore, SystemRegistrar> {
    /// Supervisor backed by real processes, pid files under the configured
    /// run directory, and the SysV boot registrars.
    #[must_use]
    pub fn system(config: ServiceConfig) -> Self {
        let store = FilePidStore::new(&config.run_dir);
        Self::new(config, UnixProcessManager::new(), store, SystemRegistrar::new())
    }
}

impl<P: ProcessManager, S: PidStore, R: BootRegistrar> LifecycleSupervisor<P, S, R> {
    pub fn new(config: ServiceConfig, process_manager: P, store: S, registrar: R) -> Self {
        Self {
            config,
            process_manager,
            store,
            registrar,
            narrative: Narrative::default(),
        }
    }

    /// Forward every narrative line to `sink` as soon as it is said.
    #[must_use]
    pub fn on_narrative(mut self, sink: impl FnMut(&str) + Send + 'static) -> Self {
        self.narrative.set_sink(Box::new(sink));
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn process_manager(&self) -> &P {
        &self.process_manager
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn lock_path(&self) -> PathBuf {
        self.config
            .run_dir
            .join(format!("{}.lock", self.config.name.full()))
    }

    /// Run one named action, holding the advisory lock when configured.
    ///
    /// # Errors
    /// Returns an error for invalid configuration, record or log IO
    /// failures, undeliverable signals, or a lock held elsewhere.
    pub async fn run(&mut self, action: Action) -> Result<ActionReport> {
        validate(&self.config)?;
        let _lock = if self.config.lock {
            Some(ServiceLock::acquire(&self.lock_path())?)
        } else {
            None
        };

        tracing::debug!("Running {action} for {}", self.config.name);
        match action {
            Action::Start => self.start().await,
            Action::Stop => self.stop().await,
            Action::Status => {
                let status = self.describe_status().await?;
                Ok(self.finish(Action::Status, Outcome::Status(status)))
            }
            Action::Restart => self.restart().await,
            Action::Autostart => self.autostart().await,
        }
    }

    /// Observe the current status. Has no effect on the record.
    ///
    /// # Errors
    /// Returns an error if the record cannot be read.
    pub async fn status(&mut self) -> Result<ObservedStatus> {
        let Some(pid) = self.store.read(&self.config.name.full())? else {
            return Ok(ObservedStatus::Stopped);
        };

        if self.process_manager.is_alive(pid).await {
            Ok(ObservedStatus::Running(pid))
        } else {
            Ok(ObservedStatus::Crashed(pid))
        }
    }

    /// Spawn the service unless a record exists, then watch it for the
    /// startup window.
    ///
    /// # Errors
    /// Returns an error for invalid configuration, or if spawning or
    /// writing the record fails.
    pub async fn start(&mut self) -> Result<ActionReport> {
        validate(&self.config)?;
        let name = self.config.name.full();

        if self.store.read(&name)?.is_some() {
            self.narrative
                .say(format!("{} exists, cannot start", self.store.location(&name)));
            let status = self.describe_status().await?;
            return Ok(self.finish(Action::Start, Outcome::AlreadyRunning(status)));
        }

        if !self.config.working_dir.is_dir() {
            return Err(Error::Config(format!(
                "working directory {:?} does not exist",
                self.config.working_dir
            )));
        }

        self.narrative.say(format!("starting {name}.."));
        if self.config.args.is_empty() {
            self.audit(&format!("starting {name} now.."));
        } else {
            self.audit(&format!(
                "starting {name} {} now..",
                self.config.args.join(" ")
            ));
        }

        let spec = self.command_spec();
        let spawned = self.process_manager.spawn(spec).await?;
        if let Err(err) = self.store.write(&name, spawned.pid) {
            self.abandon(&name, spawned.pid).await;
            return Err(err);
        }

        let outcome = if self.await_startup(&name, spawned.pid).await? {
            self.narrative
                .say(format!("started {name} with pid {}", spawned.pid));
            Outcome::Started { pid: spawned.pid }
        } else {
            self.narrative.say(format!(
                "process didn't start in {} seconds",
                self.config.max_start_wait.as_secs()
            ));
            Outcome::StartTimeout { pid: spawned.pid }
        };

        self.describe_status().await?;
        Ok(self.finish(Action::Start, outcome))
    }

    /// Shut the service down: graceful signal to the process group, then
    /// the secondary signal, then `SIGKILL`.
    ///
    /// # Errors
    /// Returns an error if the record cannot be read or removed, or a
    /// signal cannot be delivered.
    pub async fn stop(&mut self) -> Result<ActionReport> {
        let name = self.config.name.full();
        self.narrative.say(format!("stopping {name}.."));
        self.audit(&format!("stopping {name} now.."));

        let Some(pid) = self.store.read(&name)? else {
            self.describe_status().await?;
            return Ok(self.finish(Action::Stop, Outcome::AlreadyStopped));
        };

        if !self.process_manager.is_alive(pid).await {
            return self.nothing_to_kill(&name, pid);
        }

        // Read once; the group is not looked up again after signaling.
        let group = match self.process_manager.process_group(pid).await {
            Ok(group) => group,
            Err(err) => {
                if self.process_manager.is_alive(pid).await {
                    return Err(err);
                }
                tracing::debug!("Process {pid} exited before its group was read: {err}");
                return self.nothing_to_kill(&name, pid);
            }
        };

        self.narrative.say(format!(
            "sending {} to process group {group} of pid {pid}..",
            Signal::Graceful
        ));
        self.process_manager
            .signal_group(group, Signal::Graceful)
            .await?;

        let bound = self.config.max_stop_wait.as_secs();
        if self.await_exit(pid, bound).await {
            self.narrative.say(format!("process {pid} stopped"));
            self.forget(&name)?;
            return Ok(self.finish(Action::Stop, Outcome::Stopped { pid }));
        }

        self.narrative.say(format!(
            "process {pid} didn't stop after {bound} seconds, sending {}",
            Signal::Secondary
        ));
        self.process_manager
            .signal_group(group, Signal::Secondary)
            .await?;
        sleep(POLL_INTERVAL).await;

        if !self.process_manager.is_alive(pid).await {
            self.narrative.say("looks like it finally shut down");
            self.forget(&name)?;
            return Ok(self.finish(
                Action::Stop,
                Outcome::StopEscalated { pid, forced: false },
            ));
        }

        self.narrative
            .say(format!("have to use {}...", Signal::Force));
        self.process_manager
            .signal_group(group, Signal::Force)
            .await?;

        if self.config.strict_kill {
            sleep(POLL_INTERVAL).await;
            if self.process_manager.is_alive(pid).await {
                self.narrative.say(format!(
                    "process {pid} survived {}, keeping {}",
                    Signal::Force,
                    self.store.location(&name)
                ));
                return Ok(self.finish(Action::Stop, Outcome::StopFailed { pid }));
            }
        }

        self.forget(&name)?;
        Ok(self.finish(
            Action::Stop,
            Outcome::StopEscalated { pid, forced: true },
        ))
    }

    /// Stop followed by start.
    ///
    /// # Errors
    /// Propagates errors from either half.
    pub async fn restart(&mut self) -> Result<ActionReport> {
        self.narrative
            .say(format!("restarting {}..", self.config.name));

        let stopped = self.stop().await?;
        let started = self.start().await?;

        let mut narrative = stopped.narrative;
        narrative.extend(started.narrative);

        Ok(ActionReport {
            action: Action::Restart,
            outcome: Outcome::Restarted {
                stop: Box::new(stopped.outcome),
                start: Box::new(started.outcome),
            },
            narrative,
        })
    }

    /// Register the service with the platform's boot facilities.
    ///
    /// # Errors
    /// Returns an error if a registrar cannot be executed.
    pub async fn autostart(&mut self) -> Result<ActionReport> {
        self.narrative.say(format!(
            "service {} will run on system startup now..",
            self.config.name
        ));

        let registrations = self.registrar.register(&self.config.name.app).await?;
        if registrations.is_empty() {
            self.narrative
                .say("no known boot registrar found (chkconfig, update-rc.d)");
            return Ok(self.finish(Action::Autostart, Outcome::NoRegistrar));
        }

        for registration in &registrations {
            if registration.succeeded {
                self.narrative
                    .say(format!("registered with {}", registration.tool));
            } else {
                self.narrative
                    .say(format!("{} reported a failure", registration.tool));
            }
        }

        let tools = registrations.into_iter().map(|r| r.tool).collect();
        Ok(self.finish(Action::Autostart, Outcome::Registered { tools }))
    }

    async fn describe_status(&mut self) -> Result<ObservedStatus> {
        let status = self.status().await?;
        match status {
            ObservedStatus::Crashed(_) => self.narrative.say("not running but pid file exists"),
            ObservedStatus::Running(pid) => self.narrative.say(format!("running with pid {pid}")),
            ObservedStatus::Stopped => self.narrative.say("not running currently"),
        }
        Ok(status)
    }

    /// Probe once per second for the full startup window. Fails as soon as
    /// the record disappears or the process is gone.
    async fn await_startup(&mut self, name: &str, pid: u32) -> Result<bool> {
        let bound = self.config.max_start_wait.as_secs();
        let mut elapsed = 0;
        loop {
            if self.store.read(name)?.is_none() {
                tracing::warn!("Record of {name} disappeared during startup");
                return Ok(false);
            }
            if !self.process_manager.is_alive(pid).await {
                tracing::warn!("Process {pid} exited during startup");
                return Ok(false);
            }
            if elapsed >= bound {
                return Ok(true);
            }
            sleep(POLL_INTERVAL).await;
            elapsed += 1;
        }
    }

    /// Probe once per second until `pid` is gone or `bound` seconds passed.
    async fn await_exit(&mut self, pid: u32, bound: u64) -> bool {
        let mut elapsed = 0;
        loop {
            if !self.process_manager.is_alive(pid).await {
                return true;
            }
            if elapsed >= bound {
                return false;
            }
            tracing::debug!("Waiting for process ({pid}) to exit..");
            sleep(POLL_INTERVAL).await;
            elapsed += 1;
        }
    }

    fn nothing_to_kill(&mut self, name: &str, pid: u32) -> Result<ActionReport> {
        self.narrative
            .say(format!("process {pid} does not exist, nothing to kill"));
        self.forget(name)?;
        Ok(self.finish(Action::Stop, Outcome::NothingToKill { pid }))
    }

    /// Kill a freshly spawned process whose record could not be written, so
    /// nothing runs untracked.
    async fn abandon(&mut self, name: &str, pid: u32) {
        self.narrative.say(format!(
            "cannot record pid {pid} at {}, sending {}",
            self.store.location(name),
            Signal::Force
        ));
        let killed = match self.process_manager.process_group(pid).await {
            Ok(group) => self.process_manager.signal_group(group, Signal::Force).await,
            Err(err) => Err(err),
        };
        if let Err(err) = killed {
            tracing::warn!("Cannot kill unrecorded process {pid}: {err}");
        } else if !self.await_exit(pid, 1).await {
            tracing::warn!("Unrecorded process {pid} is still alive");
        }
        self.narrative.take();
    }

    fn forget(&mut self, name: &str) -> Result<()> {
        self.store.delete(name)?;
        self.narrative
            .say(format!("removed {}", self.store.location(name)));
        Ok(())
    }

    fn finish(&mut self, action: Action, outcome: Outcome) -> ActionReport {
        ActionReport {
            action,
            outcome,
            narrative: self.narrative.take(),
        }
    }

    fn command_spec(&self) -> CommandSpec {
        CommandSpec {
            name: self.config.name.full(),
            program: self.config.executable.clone(),
            args: self.config.args.clone(),
            cwd: self.config.working_dir.clone(),
            env: self.config.env.clone(),
            output: Some(self.config.console_log.clone()),
        }
    }

    fn audit(&self, line: &str) {
        let Some(path) = &self.config.service_log else {
            return;
        };
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| writeln!(file, "{line}"));
        if let Err(err) = result {
            tracing::warn!("Cannot append to service log {path:?}: {err}");
        }
    }
}

fn validate(config: &ServiceConfig) -> Result<()> {
    if config.name.app.trim().is_empty() {
        return Err(Error::Config("service name is empty".into()));
    }
    // The full name becomes a file name under the run directory.
    let mut parts =
        std::iter::once(config.name.app.as_str()).chain(config.name.company.as_deref());
    if let Some(part) = parts.find(|part| part.contains('/')) {
        return Err(Error::Config(format!(
            "service `{}`: `{part}` must not contain `/`",
            config.name
        )));
    }
    if config.executable.as_os_str().is_empty() {
        return Err(Error::Config(format!(
            "service `{}`: no executable",
            config.name
        )));
    }
    Ok(())
}
