//! Worker descriptor value object

use serde::{Deserialize, Serialize};

/// Role a worker is registered with.
///
/// The role is checked at dispatch time: only a [`WorkerRole::Synthesizer`]
/// worker may receive the final synthesis call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerRole {
    /// Answers the query (round 1) and reviews peers (round 2)
    Reviewer,
    /// Writes the final synthesis (round 3) and nothing else
    Synthesizer,
}

impl WorkerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerRole::Reviewer => "reviewer",
            WorkerRole::Synthesizer => "synthesizer",
        }
    }
}

impl std::fmt::Display for WorkerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WorkerRole {
    type Err = String;

    /// Accepts the legacy `council` / `chairman` spellings as well.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reviewer" | "council" => Ok(WorkerRole::Reviewer),
            "synthesizer" | "chairman" => Ok(WorkerRole::Synthesizer),
            other => Err(format!(
                "unknown worker role '{}' (expected 'reviewer' or 'synthesizer')",
                other
            )),
        }
    }
}

/// A remote worker service (Value Object)
///
/// Identity is the worker `name`; the `address` is the base URL that
/// endpoint paths are appended to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerDescriptor {
    pub name: String,
    pub address: String,
    pub role: WorkerRole,
}

impl WorkerDescriptor {
    /// Create a descriptor; trailing slashes are stripped from the address.
    pub fn new(name: impl Into<String>, address: impl Into<String>, role: WorkerRole) -> Self {
        let address: String = address.into();
        Self {
            name: name.into(),
            address: address.trim().trim_end_matches('/').to_string(),
            role,
        }
    }

    pub fn reviewer(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self::new(name, address, WorkerRole::Reviewer)
    }

    pub fn synthesizer(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self::new(name, address, WorkerRole::Synthesizer)
    }

    /// Worker identity used in results and health records
    pub fn identity(&self) -> &str {
        &self.name
    }

    pub fn is_synthesizer(&self) -> bool {
        self.role == WorkerRole::Synthesizer
    }

    /// Full URL of an endpoint on this worker, e.g. `endpoint("/chat")`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.address, path.trim_start_matches('/'))
    }

    /// Whether the address is an absolute `http`/`https` URL with a host.
    pub fn has_valid_address(&self) -> bool {
        let rest = self
            .address
            .strip_prefix("http://")
            .or_else(|| self.address.strip_prefix("https://"));
        match rest {
            Some(rest) => {
                let host = rest.split('/').next().unwrap_or_default();
                !host.is_empty() && !host.contains(char::is_whitespace)
            }
            None => false,
        }
    }
}

impl std::fmt::Display for WorkerDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.role, self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_paths() {
        let worker = WorkerDescriptor::reviewer("alpha", "http://10.0.0.2:8002/api/");
        assert_eq!(worker.address, "http://10.0.0.2:8002/api");
        assert_eq!(worker.endpoint("/chat"), "http://10.0.0.2:8002/api/chat");
        assert_eq!(worker.endpoint("health"), "http://10.0.0.2:8002/api/health");
    }

    #[test]
    fn test_role_parsing_accepts_legacy_names() {
        assert_eq!("council".parse::<WorkerRole>(), Ok(WorkerRole::Reviewer));
        assert_eq!("Chairman".parse::<WorkerRole>(), Ok(WorkerRole::Synthesizer));
        assert_eq!("reviewer".parse::<WorkerRole>(), Ok(WorkerRole::Reviewer));
        assert!("judge".parse::<WorkerRole>().is_err());
    }

    #[test]
    fn test_role_serde_is_snake_case() {
        let json = serde_json::to_string(&WorkerRole::Synthesizer).unwrap();
        assert_eq!(json, "\"synthesizer\"");
    }

    #[test]
    fn test_address_validation() {
        assert!(WorkerDescriptor::reviewer("a", "http://host:1").has_valid_address());
        assert!(WorkerDescriptor::reviewer("a", "https://host").has_valid_address());
        assert!(!WorkerDescriptor::reviewer("a", "host:8002").has_valid_address());
        assert!(!WorkerDescriptor::reviewer("a", "http://").has_valid_address());
    }
}
