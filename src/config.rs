//! Runtime configuration
//!
//! The CLI takes its store path from the command line, with environment
//! variables as the fallback so the tool can run unattended in a maintenance
//! window the way the original migration read its DATABASE_* variables.

use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Environment variable naming the store snapshot file.
pub const ENV_DB: &str = "REGMIGRATE_DB";

/// Environment variable forcing dry-run mode ("1" or "true").
pub const ENV_DRY_RUN: &str = "REGMIGRATE_DRY_RUN";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrateConfig {
    /// Snapshot file of the store; None means in-memory.
    pub db_path: Option<PathBuf>,

    /// Validate everything, then roll back instead of committing.
    pub dry_run: bool,
}

impl MigrateConfig {
    /// Build a config from the environment alone.
    pub fn from_env() -> Result<MigrateConfig> {
        let db_path = env::var_os(ENV_DB).map(PathBuf::from);

        let dry_run = match env::var(ENV_DRY_RUN) {
            Ok(raw) => parse_bool(ENV_DRY_RUN, &raw)?,
            Err(env::VarError::NotPresent) => false,
            Err(e) => {
                return Err(Error::Config(format!("{ENV_DRY_RUN}: {e}")));
            }
        };

        Ok(MigrateConfig { db_path, dry_run })
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw {
        "1" | "true" => Ok(true),
        "0" | "false" | "" => Ok(false),
        other => Err(Error::Config(format!(
            "{name}: expected 1/0/true/false, got \"{other}\""
        ))),
    }
}
