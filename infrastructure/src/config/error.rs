//! Errors raised while turning configuration into a topology

use council_domain::TopologyError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No workers configured: add [[workers]] entries or set topology_file")]
    NoWorkers,

    #[error("Worker '{worker}': {reason}")]
    InvalidRole { worker: String, reason: String },

    #[error("Failed to read topology file {}: {source}", path.display())]
    TopologyFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid topology file {}: {source}", path.display())]
    TopologyFileParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Topology(#[from] TopologyError),
}
