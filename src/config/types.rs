use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Tool commands for the `%{tool.*}` context.
    ///
    /// Values are full command prefixes, e.g. `ffmpeg = "/opt/ffmpeg/bin/ffmpeg -y"`.
    #[serde(default)]
    pub tools: IndexMap<String, String>,

    /// Free-form values for the `%{tmp.*}` context.
    #[serde(default)]
    pub tmp: IndexMap<String, String>,

    #[serde(default)]
    pub conversion: ConversionConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConversionConfig {
    /// Directory external processes run in (default: current directory)
    #[serde(default = "default_working_dir")]
    pub working_dir: String,

    /// Process log directory, relative paths resolved under the working
    /// directory (default: "logs")
    #[serde(default = "default_logs_dir")]
    pub logs_dir: String,
}

fn default_working_dir() -> String {
    ".".to_string()
}

fn default_logs_dir() -> String {
    "logs".to_string()
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            working_dir: default_working_dir(),
            logs_dir: default_logs_dir(),
        }
    }
}

impl ConversionConfig {
    /// Working directory with `~` expanded.
    pub fn working_dir_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.working_dir).as_ref())
    }

    /// Logs directory with `~` expanded, joined under the working directory
    /// when relative.
    pub fn logs_dir_path(&self) -> PathBuf {
        let logs = PathBuf::from(shellexpand::tilde(&self.logs_dir).as_ref());
        if logs.is_absolute() {
            logs
        } else {
            self.working_dir_path().join(logs)
        }
    }
}
