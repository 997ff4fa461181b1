use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawFile {
    #[serde(default = "default_version")]
    pub version: u32,
    pub service: RawService,
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawService {
    pub app: String,
    pub company: Option<String>,
    pub executable: String,
    pub args: Option<Vec<String>>,
    pub cwd: Option<String>,
    pub env: Option<BTreeMap<String, String>>,
    pub max_start_wait: Option<u64>,
    pub max_stop_wait: Option<u64>,
    pub run_dir: Option<String>,
    pub console_log: Option<String>,
    pub service_log: Option<String>,
    pub strict_kill: Option<bool>,
    pub lock: Option<bool>,
}
