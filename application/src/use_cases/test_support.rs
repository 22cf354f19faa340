//! Scripted worker gateway shared by the use case tests.

use crate::ports::worker_gateway::{
    ChatRequest, GatewayError, SynthesisRequest, WorkerGateway, WorkerReply,
};
use async_trait::async_trait;
use council_domain::{BackendStatus, Topology, WorkerDescriptor};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// What a scripted worker does for one call
#[derive(Debug, Clone)]
pub enum Script {
    Reply { text: String, delay: Duration },
    Fail(GatewayError),
    /// Never answers within any test timeout
    Hang,
}

impl Script {
    pub fn reply(text: &str) -> Self {
        Script::Reply {
            text: text.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(delay: Duration, text: &str) -> Self {
        Script::Reply {
            text: text.to_string(),
            delay,
        }
    }

    pub fn fail(error: GatewayError) -> Self {
        Script::Fail(error)
    }

    pub fn hang() -> Self {
        Script::Hang
    }

    async fn play(self) -> Result<WorkerReply, GatewayError> {
        match self {
            Script::Reply { text, delay } => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(WorkerReply::new(text, delay.as_millis() as u64))
            }
            Script::Fail(error) => Err(error),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(GatewayError::Other("hang ended".to_string()))
            }
        }
    }
}

/// Gateway whose workers follow per-worker scripts, one entry per call.
#[derive(Default)]
pub struct ScriptedGateway {
    chat: Mutex<HashMap<String, VecDeque<Script>>>,
    synthesis: Mutex<VecDeque<Script>>,
    health: Mutex<HashMap<String, VecDeque<Result<BackendStatus, GatewayError>>>>,
    chat_log: Mutex<Vec<(String, String)>>,
    synthesis_log: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chat(self, worker: &str, script: Script) -> Self {
        self.chat
            .lock()
            .unwrap()
            .entry(worker.to_string())
            .or_default()
            .push_back(script);
        self
    }

    pub fn synthesis(self, script: Script) -> Self {
        self.synthesis.lock().unwrap().push_back(script);
        self
    }

    pub fn health(self, worker: &str, result: Result<BackendStatus, GatewayError>) -> Self {
        self.health
            .lock()
            .unwrap()
            .entry(worker.to_string())
            .or_default()
            .push_back(result);
        self
    }

    /// User prompts received by `worker`, in call order
    pub fn chat_prompts(&self, worker: &str) -> Vec<String> {
        self.chat_log
            .lock()
            .unwrap()
            .iter()
            .filter(|(w, _)| w == worker)
            .map(|(_, p)| p.clone())
            .collect()
    }

    /// Workers that received a synthesis call
    pub fn synthesis_calls(&self) -> Vec<String> {
        self.synthesis_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkerGateway for ScriptedGateway {
    async fn chat(
        &self,
        worker: &WorkerDescriptor,
        request: &ChatRequest,
    ) -> Result<WorkerReply, GatewayError> {
        self.chat_log
            .lock()
            .unwrap()
            .push((worker.name.clone(), request.user_content().to_string()));
        let script = self
            .chat
            .lock()
            .unwrap()
            .get_mut(&worker.name)
            .and_then(|q| q.pop_front())
            .ok_or_else(|| GatewayError::Other(format!("no script left for {}", worker.name)))?;
        script.play().await
    }

    async fn synthesize(
        &self,
        worker: &WorkerDescriptor,
        _request: &SynthesisRequest,
    ) -> Result<WorkerReply, GatewayError> {
        self.synthesis_log.lock().unwrap().push(worker.name.clone());
        let script = self
            .synthesis
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GatewayError::Other("no synthesis script left".to_string()))?;
        script.play().await
    }

    async fn health(
        &self,
        worker: &WorkerDescriptor,
        _timeout: Duration,
    ) -> Result<BackendStatus, GatewayError> {
        let mut health = self.health.lock().unwrap();
        let queue = health
            .get_mut(&worker.name)
            .ok_or_else(|| GatewayError::ConnectionError("connection refused".to_string()))?;
        // The last scripted result repeats
        if queue.len() > 1 {
            queue
                .pop_front()
                .unwrap_or_else(|| Err(GatewayError::Other("empty".to_string())))
        } else {
            queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(GatewayError::Other("empty".to_string())))
        }
    }
}

/// Reviewers `names` plus a synthesizer called `chair`
pub fn council_topology(names: &[&str]) -> Topology {
    let mut workers: Vec<WorkerDescriptor> = names
        .iter()
        .map(|n| WorkerDescriptor::reviewer(*n, format!("http://{}.test:8002", n)))
        .collect();
    workers.push(WorkerDescriptor::synthesizer("chair", "http://chair.test:8003"));
    Topology::new(workers).unwrap()
}
