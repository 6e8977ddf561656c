//! Configuration settings for ScaleLib
//!
//! Defines the autoscale configuration document, default lock file
//! resolution, and the CLI arguments of the `scalelib` binary.

use crate::error::{IoResultExt, Result, ScaleError};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Deserializer};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the installation root
pub const INSTALL_ROOT_ENV: &str = "CYCLECLOUD_HOME";

/// Installation root used when the environment variable is unset
#[cfg(windows)]
pub const DEFAULT_INSTALL_ROOT: &str = r"C:\cycle\jetpack";

/// Installation root used when the environment variable is unset
#[cfg(not(windows))]
pub const DEFAULT_INSTALL_ROOT: &str = "/opt/cycle/jetpack";

/// Lock file name, both under the installation root and in the working directory
pub const LOCK_FILE_NAME: &str = "scalelib.lock";

/// ScaleLib - scheduler node tooling for HPC autoscalers
#[derive(Parser, Debug, Clone)]
#[command(name = "scalelib")]
#[command(author = "ScaleLib Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scheduler node inspection and singleton locking for HPC autoscalers")]
pub struct CliArgs {
    /// Autoscale configuration file (JSON)
    #[arg(short = 'c', long, env = "SCALELIB_CONFIG", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build scheduler nodes for the given hostnames and print them grouped by bucket
    Nodes {
        /// Hostnames reported by the scheduler (defaults to this host)
        #[arg(value_name = "HOSTNAME")]
        hostnames: Vec<String>,

        /// Bucket id shared by every node (generated per node if omitted)
        #[arg(long, value_name = "ID")]
        bucket: Option<String>,

        /// Scheduler resource, repeatable (e.g. --resource slots=4)
        #[arg(short = 'r', long = "resource", value_name = "KEY=VALUE")]
        resources: Vec<String>,

        /// Skip private address lookup
        #[arg(long)]
        no_dns: bool,

        /// Generate readable, incrementing ids instead of random UUIDs
        #[arg(long)]
        deterministic_ids: bool,
    },

    /// Acquire the singleton lock and hold it
    Lock {
        /// Seconds to hold the lock before releasing it
        #[arg(long, default_value = "0", value_name = "SECS")]
        hold_secs: u64,
    },

    /// Print the default lock file path
    LockPath,
}

/// Where the singleton lock lives
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LockFileSetting {
    /// Key absent: use the installation default
    #[default]
    Default,
    /// Key explicitly `null` (or empty): locking disabled
    Disabled,
    /// Explicit path
    Path(PathBuf),
}

fn deserialize_lock_file<'de, D>(deserializer: D) -> std::result::Result<LockFileSetting, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<PathBuf> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(path) if !path.as_os_str().is_empty() => LockFileSetting::Path(path),
        _ => LockFileSetting::Disabled,
    })
}

/// The parts of the autoscale configuration this crate reads
///
/// Unknown keys are ignored; the document is shared with the rest of the
/// autoscaler.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutoscaleConfig {
    /// `lock_file` key
    #[serde(default, deserialize_with = "deserialize_lock_file")]
    pub lock_file: LockFileSetting,
}

impl AutoscaleConfig {
    /// Parse from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| ScaleError::config(format!("invalid autoscale config: {}", e)))
    }

    /// Parse from an already-loaded JSON document
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        Self::deserialize(value)
            .map_err(|e| ScaleError::config(format!("invalid autoscale config: {}", e)))
    }

    /// Load from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_path(path)?;
        Self::from_json_str(&text)
    }

    /// Resolve the lock file path, `None` when locking is disabled
    pub fn lock_path(&self) -> Result<Option<PathBuf>> {
        match &self.lock_file {
            LockFileSetting::Disabled => Ok(None),
            LockFileSetting::Path(path) => Ok(Some(path.clone())),
            LockFileSetting::Default => default_lock_path().map(Some),
        }
    }
}

/// Default lock path for this process' environment and working directory
pub fn default_lock_path() -> Result<PathBuf> {
    let cwd = env::current_dir().with_path(".")?;
    Ok(default_lock_path_from(env::var_os(INSTALL_ROOT_ENV), &cwd))
}

/// Default lock path for an explicit installation root and working directory
///
/// The lock goes under `<root>/system/bootstrap` when the root exists on
/// disk, otherwise into `cwd`.
pub fn default_lock_path_from(install_root: Option<OsString>, cwd: &Path) -> PathBuf {
    let root = install_root
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INSTALL_ROOT));

    let path = if root.exists() {
        root.join("system").join("bootstrap").join(LOCK_FILE_NAME)
    } else {
        cwd.join(LOCK_FILE_NAME)
    };
    debug!(path = %path.display(), "Default lock path");
    path
}

/// Parse a `KEY=VALUE` resource argument
///
/// Values that parse as JSON (numbers, booleans) keep their type, anything
/// else is taken as a string.
pub fn parse_resource(arg: &str) -> Result<(String, serde_json::Value)> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| ScaleError::config(format!("resource must be KEY=VALUE, got {:?}", arg)))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(ScaleError::config(format!("resource name missing in {:?}", arg)));
    }

    let value = serde_json::from_str(value.trim())
        .unwrap_or_else(|_| serde_json::Value::String(value.trim().to_string()));
    Ok((key.to_string(), value))
}
