//! Worker topology from TOML (`[[workers]]` entries)

use council_domain::WorkerRole;
use serde::{Deserialize, Serialize};

/// One `[[workers]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileWorkerConfig {
    pub name: String,
    /// Base URL; endpoint paths are appended to it
    pub url: String,
    /// `reviewer` or `synthesizer` (`council` / `chairman` also accepted)
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    WorkerRole::Reviewer.as_str().to_string()
}

impl FileWorkerConfig {
    pub fn parse_role(&self) -> Result<WorkerRole, String> {
        self.role.parse()
    }
}
