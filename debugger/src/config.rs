//! Debugger configuration (TOML).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Shell configuration, edited by humans. Missing fields default to
/// sensible values; a missing file is the all-defaults configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DebuggerConfig {
    /// Folder holding the agent `*.log` traces when no `--folder` is given.
    pub log_folder: Option<PathBuf>,

    /// Skip achievement-goal instructions (`!`/`!!`) during instruction
    /// localization; their correctness is covered by the goal-tree search.
    pub auto_trust_goal_instructions: bool,

    /// Cap the number of beliefs printed per state snapshot.
    pub max_displayed_beliefs: usize,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            log_folder: None,
            auto_trust_goal_instructions: true,
            max_displayed_beliefs: 50,
        }
    }
}

impl DebuggerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_displayed_beliefs == 0 {
            return Err(anyhow!("max_displayed_beliefs must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `DebuggerConfig::default()`.
pub fn load_config(path: &Path) -> Result<DebuggerConfig> {
    if !path.exists() {
        let cfg = DebuggerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: DebuggerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, DebuggerConfig::default());
    }

    #[test]
    fn load_parses_and_validates() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "log_folder = \"/tmp/traces\"\nauto_trust_goal_instructions = false\nmax_displayed_beliefs = 10\n",
        )
        .expect("write");

        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.log_folder, Some(PathBuf::from("/tmp/traces")));
        assert!(!cfg.auto_trust_goal_instructions);
        assert_eq!(cfg.max_displayed_beliefs, 10);
    }

    #[test]
    fn zero_belief_cap_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "max_displayed_beliefs = 0\n").expect("write");

        let err = load_config(&path).expect_err("should fail");
        assert!(err.to_string().contains("max_displayed_beliefs"));
    }
}
