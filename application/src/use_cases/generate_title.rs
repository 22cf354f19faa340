//! Generate Title use case
//!
//! Asks one reviewer for a short conversation title. Never the synthesizer,
//! and never fatal: any failure yields [`FALLBACK_TITLE`].

use crate::ports::worker_gateway::{ChatRequest, WorkerGateway};
use council_domain::{PromptTemplate, Topology};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const FALLBACK_TITLE: &str = "New Conversation";

/// Longest title kept, ellipsis included
pub const MAX_TITLE_LEN: usize = 50;

/// Use case for generating a conversation title
pub struct GenerateTitleUseCase<G: WorkerGateway + 'static> {
    gateway: Arc<G>,
    topology: Arc<Topology>,
    timeout: Duration,
}

impl<G: WorkerGateway + 'static> GenerateTitleUseCase<G> {
    pub fn new(gateway: Arc<G>, topology: Arc<Topology>, timeout: Duration) -> Self {
        Self {
            gateway,
            topology,
            timeout,
        }
    }

    pub async fn execute(&self, question: &str) -> String {
        let Some(worker) = self.topology.title_worker() else {
            return FALLBACK_TITLE.to_string();
        };
        debug!("Generating title with {}", worker.name);

        let request = ChatRequest::user_only(PromptTemplate::title_prompt(question), self.timeout);
        let reply =
            match tokio::time::timeout(self.timeout, self.gateway.chat(worker, &request)).await {
                Ok(Ok(reply)) => reply,
                Ok(Err(e)) => {
                    warn!("Title generation on {} failed: {}", worker.name, e);
                    return FALLBACK_TITLE.to_string();
                }
                Err(_) => {
                    warn!("Title generation on {} timed out", worker.name);
                    return FALLBACK_TITLE.to_string();
                }
            };

        clean_title(&reply.text).unwrap_or_else(|| FALLBACK_TITLE.to_string())
    }
}

/// Trim, strip surrounding quotes and cap the length. `None` if nothing is
/// left.
pub fn clean_title(raw: &str) -> Option<String> {
    let title = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    if title.is_empty() {
        return None;
    }
    if title.chars().count() <= MAX_TITLE_LEN {
        return Some(title.to_string());
    }
    let keep: String = title.chars().take(MAX_TITLE_LEN - 3).collect();
    Some(format!("{}...", keep))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::worker_gateway::GatewayError;
    use crate::use_cases::test_support::{Script, ScriptedGateway, council_topology};

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("  \"Rust Ownership Basics\"\n").as_deref(), Some("Rust Ownership Basics"));
        assert_eq!(clean_title("'quoted'").as_deref(), Some("quoted"));
        assert_eq!(clean_title("  \"\" "), None);

        let long = "word ".repeat(20);
        let title = clean_title(&long).unwrap();
        assert_eq!(title.chars().count(), MAX_TITLE_LEN);
        assert!(title.ends_with("..."));
    }

    #[tokio::test]
    async fn test_uses_first_reviewer_by_default() {
        let gateway = Arc::new(ScriptedGateway::new().chat("alpha", Script::reply("\"Rust Basics\"")));
        let uc = GenerateTitleUseCase::new(
            Arc::clone(&gateway),
            Arc::new(council_topology(&["alpha", "beta"])),
            Duration::from_secs(1),
        );
        assert_eq!(uc.execute("What is Rust?").await, "Rust Basics");
        assert_eq!(gateway.chat_prompts("alpha").len(), 1);
        assert!(gateway.synthesis_calls().is_empty());
    }

    #[tokio::test]
    async fn test_uses_configured_title_generator() {
        let gateway = Arc::new(ScriptedGateway::new().chat("beta", Script::reply("Lifetimes")));
        let topology = council_topology(&["alpha", "beta"])
            .with_title_generator("beta")
            .unwrap();
        let uc = GenerateTitleUseCase::new(Arc::clone(&gateway), Arc::new(topology), Duration::from_secs(1));
        assert_eq!(uc.execute("How do lifetimes work?").await, "Lifetimes");
        assert!(gateway.chat_prompts("alpha").is_empty());
    }

    #[tokio::test]
    async fn test_failure_falls_back() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .chat("alpha", Script::fail(GatewayError::ConnectionError("refused".to_string()))),
        );
        let uc = GenerateTitleUseCase::new(
            gateway,
            Arc::new(council_topology(&["alpha"])),
            Duration::from_secs(1),
        );
        assert_eq!(uc.execute("anything").await, FALLBACK_TITLE);
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let gateway = Arc::new(ScriptedGateway::new().chat("alpha", Script::hang()));
        let uc = GenerateTitleUseCase::new(
            gateway,
            Arc::new(council_topology(&["alpha"])),
            Duration::from_millis(30),
        );
        assert_eq!(uc.execute("anything").await, FALLBACK_TITLE);
    }
}
