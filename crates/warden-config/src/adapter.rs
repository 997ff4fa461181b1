use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use warden_types::{ServiceConfig, ServiceName};

use crate::{
    raw::{RawFile, RawService},
    ConfigError,
};

const SUPPORTED_VERSION: u32 = 1;

fn resolve(base: &Path, path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

impl RawFile {
    /// Validate the raw file and resolve relative paths against `base`.
    pub fn to_config(&self, base: &Path) -> Result<ServiceConfig, ConfigError> {
        if self.version != SUPPORTED_VERSION {
            return Err(ConfigError::Validation(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.service.to_config(base)
    }
}

impl RawService {
    fn to_config(&self, base: &Path) -> Result<ServiceConfig, ConfigError> {
        if self.app.trim().is_empty() {
            return Err(ConfigError::Validation("service: app is empty".into()));
        }
        if self.app.contains('/') {
            return Err(ConfigError::Validation(format!(
                "service `{}`: app must not contain `/`",
                self.app
            )));
        }
        if let Some(company) = self.company.as_deref().filter(|c| c.contains('/')) {
            return Err(ConfigError::Validation(format!(
                "service `{}`: company `{company}` must not contain `/`",
                self.app
            )));
        }
        if self.executable.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "service `{}`: executable is empty",
                self.app
            )));
        }
        let args = self.args.clone().unwrap_or_default();
        if args.iter().any(|a| a.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "service `{}`: args contain empty element",
                self.app
            )));
        }

        let name = ServiceName::new(self.company.clone(), self.app.clone());
        let mut config = ServiceConfig::new(name, resolve(base, &self.executable));
        config.args = args;

        if let Some(cwd) = &self.cwd {
            config.working_dir = resolve(base, cwd);
        }
        config.console_log = resolve(
            &config.working_dir,
            self.console_log
                .as_deref()
                .unwrap_or(warden_types::DEFAULT_CONSOLE_LOG),
        );
        config.service_log = match self.service_log.as_deref() {
            None => Some(PathBuf::from(format!("/var/log/service-{}.log", self.app))),
            Some("") => None,
            Some(path) => Some(resolve(base, path)),
        };
        if let Some(run_dir) = &self.run_dir {
            config.run_dir = resolve(base, run_dir);
        }
        if let Some(env) = &self.env {
            config.env = env.clone().into_iter().collect();
        }
        if let Some(secs) = self.max_start_wait {
            config.max_start_wait = Duration::from_secs(secs);
        }
        if let Some(secs) = self.max_stop_wait {
            config.max_stop_wait = Duration::from_secs(secs);
        }
        config.strict_kill = self.strict_kill.unwrap_or_default();
        config.lock = self.lock.unwrap_or_default();

        Ok(config)
    }
}
