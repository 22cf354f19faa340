//! Builds the council [`Topology`] from configuration.
//!
//! Two sources, in order of preference:
//!
//! 1. Inline `[[workers]]` entries in the TOML config
//! 2. A JSON topology file in the legacy deployment shape:
//!
//! ```json
//! {
//!   "council": [{"name": "alpha", "url": "http://10.0.0.1:8002"}],
//!   "chairman": {"name": "chair", "url": "http://10.0.0.9:8003"},
//!   "title_generator": "alpha"
//! }
//! ```
//!
//! Legacy URLs point at the worker host; its endpoints live under `/api`.

use super::error::ConfigError;
use super::file_config::FileConfig;
use council_domain::{Topology, WorkerDescriptor};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Path prefix of worker endpoints behind a legacy host URL
const LEGACY_API_PREFIX: &str = "/api";

#[derive(Debug, Deserialize)]
struct LegacyEndpoint {
    name: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct LegacyTopology {
    council: Vec<LegacyEndpoint>,
    chairman: LegacyEndpoint,
    #[serde(default)]
    title_generator: Option<String>,
}

impl LegacyEndpoint {
    fn api_base(&self) -> String {
        let base = self.url.trim().trim_end_matches('/');
        if base.ends_with(LEGACY_API_PREFIX) {
            base.to_string()
        } else {
            format!("{}{}", base, LEGACY_API_PREFIX)
        }
    }
}

/// Build and validate the topology described by `config`.
///
/// `title_generator` in the TOML config wins over the one in a legacy file.
pub fn build_topology(config: &FileConfig) -> Result<Topology, ConfigError> {
    let (workers, file_title_generator) = if !config.workers.is_empty() {
        let workers = config
            .workers
            .iter()
            .map(|w| {
                let role = w.parse_role().map_err(|reason| ConfigError::InvalidRole {
                    worker: w.name.clone(),
                    reason,
                })?;
                Ok(WorkerDescriptor::new(&w.name, &w.url, role))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        (workers, None)
    } else if let Some(path) = &config.topology_file {
        load_legacy_workers(path)?
    } else {
        return Err(ConfigError::NoWorkers);
    };

    let mut topology = Topology::new(workers)?;
    if let Some(name) = config.title_generator.clone().or(file_title_generator) {
        topology = topology.with_title_generator(name)?;
    }

    debug!(
        "Topology: {} reviewers, synthesizer '{}'",
        topology.reviewer_count(),
        topology.synthesizer().name
    );
    Ok(topology)
}

/// Read a legacy JSON topology file.
fn load_legacy_workers(path: &Path) -> Result<(Vec<WorkerDescriptor>, Option<String>), ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::TopologyFileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let legacy: LegacyTopology =
        serde_json::from_str(&raw).map_err(|source| ConfigError::TopologyFileParse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut workers: Vec<WorkerDescriptor> = legacy
        .council
        .iter()
        .map(|w| WorkerDescriptor::reviewer(&w.name, w.api_base()))
        .collect();
    workers.push(WorkerDescriptor::synthesizer(
        &legacy.chairman.name,
        legacy.chairman.api_base(),
    ));
    Ok((workers, legacy.title_generator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::file_config::FileWorkerConfig;
    use council_domain::{TopologyError, WorkerRole};
    use std::io::Write;

    fn worker(name: &str, url: &str, role: &str) -> FileWorkerConfig {
        FileWorkerConfig {
            name: name.to_string(),
            url: url.to_string(),
            role: role.to_string(),
        }
    }

    #[test]
    fn test_inline_workers() {
        let config = FileConfig {
            workers: vec![
                worker("alpha", "http://10.0.0.1:8002/api/", "reviewer"),
                worker("beta", "http://10.0.0.2:8002/api", "council"),
                worker("chair", "http://10.0.0.9:8003/api", "synthesizer"),
            ],
            title_generator: Some("beta".to_string()),
            ..Default::default()
        };

        let topology = build_topology(&config).unwrap();
        assert_eq!(topology.reviewer_count(), 2);
        assert_eq!(topology.synthesizer().name, "chair");
        assert_eq!(topology.title_worker().unwrap().name, "beta");
        assert_eq!(
            topology.get("alpha").unwrap().endpoint("/chat"),
            "http://10.0.0.1:8002/api/chat"
        );
    }

    #[test]
    fn test_inline_unknown_role() {
        let config = FileConfig {
            workers: vec![worker("alpha", "http://10.0.0.1:8002", "judge")],
            ..Default::default()
        };
        assert!(matches!(
            build_topology(&config),
            Err(ConfigError::InvalidRole { worker, .. }) if worker == "alpha"
        ));
    }

    #[test]
    fn test_inline_topology_rules_apply() {
        let config = FileConfig {
            workers: vec![
                worker("alpha", "http://10.0.0.1:8002", "reviewer"),
                worker("beta", "http://10.0.0.2:8002", "reviewer"),
            ],
            ..Default::default()
        };
        assert!(matches!(
            build_topology(&config),
            Err(ConfigError::Topology(TopologyError::NoSynthesizer))
        ));
    }

    #[test]
    fn test_legacy_topology_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
  "council": [
    {{"name": "alpha", "url": "http://10.0.0.1:8002"}},
    {{"name": "beta", "url": "http://10.0.0.2:8002/"}}
  ],
  "chairman": {{"name": "chair", "url": "http://10.0.0.9:8003"}},
  "title_generator": "beta"
}}"#
        )
        .unwrap();

        let config = FileConfig {
            topology_file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let topology = build_topology(&config).unwrap();
        assert_eq!(topology.reviewer_count(), 2);
        assert_eq!(topology.title_worker().unwrap().name, "beta");

        let chair = topology.synthesizer();
        assert_eq!(chair.role, WorkerRole::Synthesizer);
        assert_eq!(chair.endpoint("/synthesize"), "http://10.0.0.9:8003/api/synthesize");
        assert_eq!(
            topology.get("beta").unwrap().address,
            "http://10.0.0.2:8002/api"
        );
    }

    #[test]
    fn test_legacy_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = FileConfig {
            topology_file: Some(dir.path().join("council_config.json")),
            ..Default::default()
        };
        assert!(matches!(
            build_topology(&config),
            Err(ConfigError::TopologyFileRead { .. })
        ));
    }

    #[test]
    fn test_legacy_file_without_chairman() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"council": [{{"name": "alpha", "url": "http://a:1"}}]}}"#).unwrap();
        let config = FileConfig {
            topology_file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        assert!(matches!(
            build_topology(&config),
            Err(ConfigError::TopologyFileParse { .. })
        ));
    }

    #[test]
    fn test_title_generator_must_be_reviewer() {
        let config = FileConfig {
            workers: vec![
                worker("alpha", "http://10.0.0.1:8002", "reviewer"),
                worker("chair", "http://10.0.0.9:8003", "synthesizer"),
            ],
            title_generator: Some("chair".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            build_topology(&config),
            Err(ConfigError::Topology(TopologyError::InvalidTitleGenerator(_)))
        ));
    }

    #[test]
    fn test_no_workers() {
        assert!(matches!(
            build_topology(&FileConfig::default()),
            Err(ConfigError::NoWorkers)
        ));
    }
}
