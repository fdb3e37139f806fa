//! Per-agent trace cache over a folder of `*.log` files.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::TraceError;
use crate::ingest::builder::parse_trace;
use crate::model::AgentTrace;

/// Builds each agent's trace once and hands out shared read-only copies.
///
/// The cache lock is held across the first build, so concurrent first
/// requests for the same agent serialize instead of duplicating work.
/// Invalidation is explicit only (e.g. when the log folder changed).
pub struct AgentRepository {
    folder: PathBuf,
    cache: Mutex<HashMap<String, Arc<AgentTrace>>>,
}

impl AgentRepository {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// List the agents in the folder (file stems of `*.log` files), sorted.
    pub fn agents(&self) -> Result<Vec<String>, TraceError> {
        let entries = fs::read_dir(&self.folder).map_err(|source| TraceError::Io {
            path: self.folder.display().to_string(),
            source,
        })?;
        let mut agents = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| TraceError::Io {
                path: self.folder.display().to_string(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "log")
                && let Some(stem) = path.file_stem().and_then(|stem| stem.to_str())
            {
                agents.push(stem.to_string());
            }
        }
        agents.sort();
        Ok(agents)
    }

    /// Load an agent's trace, building it on first request.
    pub fn load(&self, agent: &str) -> Result<Arc<AgentTrace>, TraceError> {
        let mut cache = self.cache.lock().expect("trace cache poisoned");
        if let Some(trace) = cache.get(agent) {
            debug!(agent, "trace cache hit");
            return Ok(Arc::clone(trace));
        }

        let path = self.folder.join(format!("{agent}.log"));
        debug!(agent, path = %path.display(), "building trace");
        let text = fs::read_to_string(&path).map_err(|source| TraceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let trace = Arc::new(parse_trace(&text)?);
        cache.insert(agent.to_string(), Arc::clone(&trace));
        Ok(trace)
    }

    /// Drop all cached traces; the next `load` rebuilds from disk.
    pub fn invalidate(&self) {
        self.cache.lock().expect("trace cache poisoned").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{LogDir, sample_log};

    #[test]
    fn lists_agents_sorted_by_name() {
        let logs = LogDir::new();
        logs.add_agent("zoe", &sample_log());
        logs.add_agent("bob", &sample_log());

        let repo = AgentRepository::new(logs.path());
        assert_eq!(repo.agents().expect("agents"), vec!["bob", "zoe"]);
    }

    #[test]
    fn load_caches_per_agent() {
        let logs = LogDir::new();
        logs.add_agent("bob", &sample_log());

        let repo = AgentRepository::new(logs.path());
        let first = repo.load("bob").expect("load");
        let second = repo.load("bob").expect("load again");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn invalidate_forces_rebuild() {
        let logs = LogDir::new();
        logs.add_agent("bob", &sample_log());

        let repo = AgentRepository::new(logs.path());
        let first = repo.load("bob").expect("load");
        repo.invalidate();
        let second = repo.load("bob").expect("reload");
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.agent, second.agent);
    }

    #[test]
    fn load_missing_agent_is_an_io_error() {
        let logs = LogDir::new();
        let repo = AgentRepository::new(logs.path());
        let err = repo.load("ghost").expect_err("should fail");
        assert!(matches!(err, TraceError::Io { .. }));
    }

    #[test]
    fn load_surfaces_integrity_faults() {
        let logs = LogDir::new();
        logs.add_agent(
            "bad",
            "{\"agent\":\"bad\",\"plans\":{}}\n{\"nr\":1,\"B-\":[\"never_held\"]}\n",
        );

        let repo = AgentRepository::new(logs.path());
        let err = repo.load("bad").expect_err("should fail");
        assert!(matches!(err, TraceError::AbsentBelief { .. }));
    }
}
