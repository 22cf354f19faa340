//! Run Council use case
//!
//! Orchestrates the three council rounds for one query:
//!
//! 1. every reviewer answers
//! 2. every answering reviewer ranks the other answers, anonymized
//! 3. the registered synthesizer writes the final answer
//!
//! Rounds are strictly sequential and each round only sees the successes of
//! the previous one. Progress is pushed to a [`ProgressEmitter`] as each
//! call settles.

use crate::config::BehaviorConfig;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::progress::{CouncilEvent, ProgressEmitter, StageError};
use crate::ports::worker_gateway::{ChatRequest, SynthesisRequest, WorkerGateway};
use crate::use_cases::fan_out::{FanOut, RoundOutcome};
use council_domain::{
    Aggregates, CouncilMetadata, CouncilResult, DomainError, LabelMapping, PromptTemplate,
    Question, ReviewRecord, Round, RoundResponse, Topology, TopologyError, WorkerDescriptor,
    WorkerFailure, parse_review,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can end a council run
#[derive(Error, Debug)]
pub enum RunCouncilError {
    /// A whole round produced nothing usable. Later rounds were skipped.
    #[error("{round} failed: {reason}")]
    Stage {
        round: Round,
        reason: String,
        failures: Vec<WorkerFailure>,
    },

    /// Synthesis was dispatched to a worker the registry does not hold as
    /// the synthesizer.
    #[error("Configuration error: {0}")]
    RoleViolation(#[from] TopologyError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The event consumer went away. Not a failure of the council.
    #[error("Event consumer disconnected")]
    Disconnected,
}

impl RunCouncilError {
    pub fn round(&self) -> Option<Round> {
        match self {
            RunCouncilError::Stage { round, .. } => Some(*round),
            RunCouncilError::RoleViolation(_) => Some(Round::Synthesis),
            _ => None,
        }
    }

    pub fn is_disconnect(&self) -> bool {
        matches!(self, RunCouncilError::Disconnected)
    }

    fn stage(round: Round, failures: Vec<WorkerFailure>) -> Self {
        let reason = if failures.is_empty() {
            "no worker succeeded".to_string()
        } else {
            let details: Vec<String> = failures
                .iter()
                .map(|f| format!("{}: {}", f.worker, f.reason))
                .collect();
            format!("no worker succeeded ({})", details.join("; "))
        };
        RunCouncilError::Stage {
            round,
            reason,
            failures,
        }
    }
}

/// Round-1 output handed to round 2
struct ResponsesRound {
    responses: Vec<RoundResponse>,
    failures: Vec<WorkerFailure>,
}

/// Round-2 output handed to round 3
struct ReviewRound {
    reviews: Vec<ReviewRecord>,
    failures: Vec<WorkerFailure>,
}

/// Use case for running a council deliberation
pub struct RunCouncilUseCase<G: WorkerGateway + 'static> {
    gateway: Arc<G>,
    topology: Arc<Topology>,
    config: BehaviorConfig,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl<G: WorkerGateway + 'static> RunCouncilUseCase<G> {
    pub fn new(gateway: Arc<G>, topology: Arc<Topology>) -> Self {
        Self {
            gateway,
            topology,
            config: BehaviorConfig::default(),
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_config(mut self, config: BehaviorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Execute without a progress consumer
    pub async fn execute(&self, question: Question) -> Result<CouncilResult, RunCouncilError> {
        self.execute_with_progress(question, &ProgressEmitter::disabled())
            .await
    }

    /// Execute, pushing one event per settled call to `progress`.
    ///
    /// On success the last event is `done`; on a round-level failure it is
    /// `error`. If the consumer disconnects, emission stops and the run ends
    /// with [`RunCouncilError::Disconnected`] before the next round starts.
    pub async fn execute_with_progress(
        &self,
        question: Question,
        progress: &ProgressEmitter,
    ) -> Result<CouncilResult, RunCouncilError> {
        info!(
            "Starting council with {} reviewers, synthesizer '{}'",
            self.topology.reviewer_count(),
            self.topology.synthesizer().name
        );
        self.conversation_logger.log(ConversationEvent::new(
            "council_started",
            json!({
                "question": question.content(),
                "reviewers": self.topology.reviewers().map(|w| w.name.as_str()).collect::<Vec<_>>(),
                "synthesizer": self.topology.synthesizer().name,
            }),
        ));

        match self.run_rounds(&question, progress).await {
            Ok(result) => {
                self.conversation_logger.log(ConversationEvent::new(
                    "council_finished",
                    json!({
                        "round1_count": result.round1.len(),
                        "round2_count": result.round2.len(),
                        "partial": result.is_partial(),
                    }),
                ));
                progress
                    .emit(CouncilEvent::Done(Box::new(result.clone())))
                    .await;
                Ok(result)
            }
            Err(RunCouncilError::Disconnected) => {
                info!("Event consumer disconnected; remaining rounds skipped");
                Err(RunCouncilError::Disconnected)
            }
            Err(e) => {
                warn!("Council run failed: {}", e);
                self.conversation_logger.log(ConversationEvent::new(
                    "round_failed",
                    json!({
                        "round": e.round().map(|r| r.as_str()),
                        "error": e.to_string(),
                    }),
                ));
                progress
                    .emit(CouncilEvent::Error(StageError {
                        round: e.round(),
                        message: e.to_string(),
                    }))
                    .await;
                Err(e)
            }
        }
    }

    async fn run_rounds(
        &self,
        question: &Question,
        progress: &ProgressEmitter,
    ) -> Result<CouncilResult, RunCouncilError> {
        let round1 = self.round_responses(question, progress).await?;
        if progress.is_closed() {
            return Err(RunCouncilError::Disconnected);
        }

        let label_mapping =
            LabelMapping::assign(round1.responses.iter().map(|r| r.worker.clone()))?;
        debug!("Label mapping: {:?}", label_mapping);

        let round2 = self
            .round_review(question, &round1.responses, &label_mapping, progress)
            .await?;
        if progress.is_closed() {
            return Err(RunCouncilError::Disconnected);
        }

        let aggregates = Aggregates::compute(&round2.reviews, &label_mapping);
        for tie in &aggregates.ties {
            info!(
                "Average rank {:.2} shared by {}",
                tie.average_rank,
                tie.identities.join(", ")
            );
        }

        let request = SynthesisRequest {
            question: question.clone(),
            round1: round1.responses.clone(),
            round2: round2.reviews.clone(),
            label_mapping: label_mapping.clone(),
            aggregates: aggregates.clone(),
            timeout: self.config.request_timeout,
        };
        let round3 = self
            .synthesize(self.topology.synthesizer(), &request)
            .await?;

        if !progress
            .emit(CouncilEvent::Round3Response(round3.clone()))
            .await
        {
            return Err(RunCouncilError::Disconnected);
        }

        Ok(CouncilResult {
            question: question.clone(),
            round1: round1.responses,
            round2: round2.reviews,
            round3,
            metadata: CouncilMetadata {
                label_mapping,
                aggregate_ranks: aggregates.ranks,
                aggregate_scores: aggregates.scores,
                rank_ties: aggregates.ties,
            },
            round1_failures: round1.failures,
            round2_failures: round2.failures,
        })
    }

    /// Round 1: every reviewer answers the query
    async fn round_responses(
        &self,
        question: &Question,
        progress: &ProgressEmitter,
    ) -> Result<ResponsesRound, RunCouncilError> {
        info!("{}", Round::Responses);

        let request = ChatRequest::new(
            PromptTemplate::initial_system(),
            PromptTemplate::initial_query(question.content()),
            self.config.request_timeout,
        );

        let mut fan_out = FanOut::new(self.config.request_timeout);
        for worker in self.topology.reviewers() {
            let gateway = Arc::clone(&self.gateway);
            let target = worker.clone();
            let request = request.clone();
            fan_out.spawn(worker.clone(), async move {
                gateway.chat(&target, &request).await
            });
        }

        let mut outcome = RoundOutcome::default();
        while let Some(settled) = fan_out.next_settled().await {
            match settled.result {
                Ok(reply) => {
                    let response = reply.into_response(&settled.worker);
                    info!(
                        "Worker {} answered in {}ms",
                        response.worker, response.latency_ms
                    );
                    self.conversation_logger.log(ConversationEvent::new(
                        "round1_response",
                        json!({
                            "worker": response.worker,
                            "model": response.model,
                            "latency_ms": response.latency_ms,
                            "text": response.text,
                        }),
                    ));
                    progress
                        .emit(CouncilEvent::Round1Response(response.clone()))
                        .await;
                    outcome.succeed(settled.index, response);
                }
                Err(e) => {
                    warn!("Worker {} failed in round 1: {}", settled.worker.name, e);
                    outcome.fail(
                        settled.index,
                        WorkerFailure::new(&settled.worker.name, e.to_string()),
                    );
                }
            }
        }

        let (responses, failures) = outcome.finish();
        if responses.is_empty() {
            return Err(RunCouncilError::stage(Round::Responses, failures));
        }
        info!(
            "{} complete: {} answered, {} failed",
            Round::Responses,
            responses.len(),
            failures.len()
        );
        Ok(ResponsesRound {
            responses,
            failures,
        })
    }

    /// Round 2: each answering reviewer ranks every other answer
    async fn round_review(
        &self,
        question: &Question,
        responses: &[RoundResponse],
        mapping: &LabelMapping,
        progress: &ProgressEmitter,
    ) -> Result<ReviewRound, RunCouncilError> {
        info!("{}", Round::Review);

        let mut fan_out = FanOut::new(self.config.request_timeout);
        let mut assignments = Vec::new();

        for response in responses {
            let Some(assignment) = mapping.assignment_for(&response.worker) else {
                continue;
            };
            if assignment.reviewed.is_empty() {
                debug!(
                    "Worker {} has no other response to review",
                    assignment.reviewer
                );
            }
            let Some(worker) = self.topology.get(&assignment.reviewer).cloned() else {
                continue;
            };

            let shown: Vec<_> = assignment
                .reviewed
                .iter()
                .filter_map(|label| {
                    let identity = mapping.identity_of(*label)?;
                    let text = responses.iter().find(|r| r.worker == identity)?;
                    Some((*label, text.text.as_str()))
                })
                .collect();
            let request = ChatRequest::new(
                PromptTemplate::review_system(),
                PromptTemplate::review_prompt(question.content(), &shown),
                self.config.request_timeout,
            );

            let gateway = Arc::clone(&self.gateway);
            let target = worker.clone();
            fan_out.spawn(worker, async move { gateway.chat(&target, &request).await });
            assignments.push(assignment);
        }

        // With a single answer nobody has anything to rank; a failed call
        // then costs no votes and does not end the run.
        let trivial = assignments.iter().all(|a| a.reviewed.is_empty());

        let mut outcome = RoundOutcome::default();
        while let Some(settled) = fan_out.next_settled().await {
            let assignment = &assignments[settled.index];
            match settled.result {
                Ok(reply) => {
                    let parsed = parse_review(&reply.text, &assignment.reviewed);
                    if parsed.is_failed() {
                        warn!(
                            "Review by {} could not be parsed; keeping raw text",
                            assignment.reviewer
                        );
                    }
                    let record = ReviewRecord {
                        reviewer: assignment.reviewer.clone(),
                        raw_text: reply.text,
                        reviewed_labels: assignment.reviewed.clone(),
                        excluded_label: assignment.excluded,
                        latency_ms: reply.latency_ms,
                        parsed,
                    };
                    info!(
                        "Worker {} reviewed in {}ms ({})",
                        record.reviewer,
                        record.latency_ms,
                        record.parsed.status()
                    );
                    self.conversation_logger.log(ConversationEvent::new(
                        "round2_review",
                        json!({
                            "reviewer": record.reviewer,
                            "excluded_label": record.excluded_label,
                            "status": record.parsed.status(),
                            "ranking": record.ranking(),
                            "latency_ms": record.latency_ms,
                            "text": record.raw_text,
                        }),
                    ));
                    progress
                        .emit(CouncilEvent::Round2Review(record.clone()))
                        .await;
                    outcome.succeed(settled.index, record);
                }
                Err(e) => {
                    warn!("Worker {} failed in round 2: {}", settled.worker.name, e);
                    outcome.fail(
                        settled.index,
                        WorkerFailure::new(&settled.worker.name, e.to_string()),
                    );
                }
            }
        }

        let (reviews, failures) = outcome.finish();
        if reviews.is_empty() && !trivial {
            return Err(RunCouncilError::stage(Round::Review, failures));
        }
        info!(
            "{} complete: {} reviews, {} failed",
            Round::Review,
            reviews.len(),
            failures.len()
        );
        Ok(ReviewRound { reviews, failures })
    }

    /// Round 3: the single synthesis call.
    ///
    /// `target` must be the synthesizer as registered in the topology; the
    /// registry entry, not the descriptor passed in, decides. Anything else
    /// is a configuration error raised before any network call.
    pub async fn synthesize(
        &self,
        target: &WorkerDescriptor,
        request: &SynthesisRequest,
    ) -> Result<RoundResponse, RunCouncilError> {
        let synthesizer = self.topology.verify_synthesizer(target)?.clone();
        info!("{} on {}", Round::Synthesis, synthesizer.name);

        let mut fan_out = FanOut::new(self.config.request_timeout);
        let gateway = Arc::clone(&self.gateway);
        let worker = synthesizer.clone();
        let request = request.clone();
        fan_out.spawn(synthesizer.clone(), async move {
            gateway.synthesize(&worker, &request).await
        });

        let result = match fan_out.next_settled().await {
            Some(settled) => settled.result,
            None => return Err(RunCouncilError::stage(Round::Synthesis, Vec::new())),
        };

        match result {
            Ok(reply) => {
                let response = reply.into_response(&synthesizer);
                info!(
                    "Synthesizer {} answered in {}ms",
                    response.worker, response.latency_ms
                );
                self.conversation_logger.log(ConversationEvent::new(
                    "round3_response",
                    json!({
                        "worker": response.worker,
                        "model": response.model,
                        "latency_ms": response.latency_ms,
                        "text": response.text,
                    }),
                ));
                Ok(response)
            }
            Err(e) => {
                warn!("Synthesizer {} failed: {}", synthesizer.name, e);
                Err(RunCouncilError::stage(
                    Round::Synthesis,
                    vec![WorkerFailure::new(&synthesizer.name, e.to_string())],
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::progress::progress_channel;
    use crate::ports::worker_gateway::GatewayError;
    use crate::use_cases::test_support::{Script, ScriptedGateway, council_topology};
    use council_domain::{Label, WorkerRole};
    use std::time::Duration;

    const REVIEW_BY_ALPHA: &str = "Good answers.\n\nSCORES:\nResponse B | accuracy=8 | insight=7 | total=15\nResponse C | accuracy=6 | insight=5 | total=11\n\nFINAL RANKING:\n1. Response B\n2. Response C\n";
    const REVIEW_BY_BETA: &str = "SCORES:\nResponse A | accuracy=9 | insight=8 | total=17\nResponse C | accuracy=5 | insight=5 | total=10\n\nFINAL RANKING:\n1. Response A\n2. Response C\n";

    fn use_case(gateway: Arc<ScriptedGateway>, topology: Topology) -> RunCouncilUseCase<ScriptedGateway> {
        RunCouncilUseCase::new(gateway, Arc::new(topology))
            .with_config(BehaviorConfig::default().with_request_timeout(Duration::from_millis(200)))
    }

    fn question() -> Question {
        Question::new("What is Rust?").unwrap()
    }

    #[tokio::test]
    async fn test_full_run_with_round2_timeout() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .chat("alpha", Script::reply("Alpha answer"))
                .chat("beta", Script::reply("Beta answer"))
                .chat("gamma", Script::reply("Gamma answer"))
                .chat("alpha", Script::reply(REVIEW_BY_ALPHA))
                .chat("beta", Script::reply(REVIEW_BY_BETA))
                .chat("gamma", Script::hang())
                .synthesis(Script::reply("Final answer")),
        );
        let uc = use_case(Arc::clone(&gateway), council_topology(&["alpha", "beta", "gamma"]));

        let result = uc.execute(question()).await.unwrap();

        assert_eq!(result.round1.len(), 3);
        assert_eq!(result.metadata.label_mapping.len(), 3);
        let names: Vec<_> = result.round1.iter().map(|r| r.worker.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);

        // gamma timed out: absent from round 2, listed as a failure
        assert_eq!(result.round2.len(), 2);
        assert!(result.round2.iter().all(|r| r.reviewer != "gamma"));
        assert_eq!(result.round2_failures.len(), 1);
        assert_eq!(result.round2_failures[0].worker, "gamma");
        assert!(result.round2_failures[0].reason.contains("Timed out"));

        for review in &result.round2 {
            assert!(!review.reviewed_labels.contains(&review.excluded_label));
            assert_eq!(review.reviewed_labels.len(), 2);
        }

        // Aggregates only count alpha's and beta's reviews
        let ranks = &result.metadata.aggregate_ranks;
        let total_votes: usize = ranks.iter().map(|r| r.vote_count).sum();
        assert_eq!(total_votes, 4);
        let gamma = ranks.iter().find(|r| r.identity == "gamma").unwrap();
        assert_eq!(gamma.average_rank, 2.0);
        assert_eq!(gamma.vote_count, 2);

        assert_eq!(result.round3.worker, "chair");
        assert_eq!(result.round3.text, "Final answer");
        assert!(result.is_partial());
        assert_eq!(gateway.synthesis_calls(), vec!["chair"]);
    }

    #[tokio::test]
    async fn test_review_prompt_excludes_own_response() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .chat("alpha", Script::reply("ALPHA-TEXT"))
                .chat("beta", Script::reply("BETA-TEXT"))
                .chat("alpha", Script::reply("FINAL RANKING:\n1. Response B"))
                .chat("beta", Script::reply("FINAL RANKING:\n1. Response A"))
                .synthesis(Script::reply("done")),
        );
        let uc = use_case(Arc::clone(&gateway), council_topology(&["alpha", "beta"]));
        uc.execute(question()).await.unwrap();

        let prompts = gateway.chat_prompts("alpha");
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("BETA-TEXT"));
        assert!(!prompts[1].contains("ALPHA-TEXT"));
        assert!(!prompts[1].contains("Response A"));
    }

    #[tokio::test]
    async fn test_two_workers_tie_on_rank() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .chat("alpha", Script::reply("a"))
                .chat("beta", Script::reply("b"))
                .chat(
                    "alpha",
                    Script::reply("SCORES:\nResponse B | accuracy=4 | insight=4 | total=8\nFINAL RANKING:\n1. Response B"),
                )
                .chat(
                    "beta",
                    Script::reply("SCORES:\nResponse A | accuracy=9 | insight=9 | total=18\nFINAL RANKING:\n1. Response A"),
                )
                .synthesis(Script::reply("done")),
        );
        let uc = use_case(gateway, council_topology(&["alpha", "beta"]));
        let result = uc.execute(question()).await.unwrap();

        let ranks = &result.metadata.aggregate_ranks;
        assert_eq!(ranks.len(), 2);
        assert!(ranks.iter().all(|r| r.average_rank == 1.0 && r.tied));
        assert_eq!(result.metadata.rank_ties.len(), 1);
        assert_eq!(result.metadata.rank_ties[0].by_aggregate_score, vec!["alpha", "beta"]);
        assert_eq!(result.metadata.aggregate_scores[0].identity, "alpha");
    }

    #[tokio::test]
    async fn test_unparseable_review_is_kept_raw() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .chat("alpha", Script::reply("a"))
                .chat("beta", Script::reply("b"))
                .chat("alpha", Script::reply("I refuse to rank."))
                .chat("beta", Script::reply("FINAL RANKING:\n1. Response A"))
                .synthesis(Script::reply("done")),
        );
        let uc = use_case(gateway, council_topology(&["alpha", "beta"]));
        let result = uc.execute(question()).await.unwrap();

        assert_eq!(result.round2.len(), 2);
        let alpha = result.round2.iter().find(|r| r.reviewer == "alpha").unwrap();
        assert!(alpha.parsed.is_failed());
        assert_eq!(alpha.raw_text, "I refuse to rank.");
        assert_eq!(result.unparsed_reviews().count(), 1);
        // beta was never ranked by anyone who parsed
        assert!(result.metadata.aggregate_ranks.iter().all(|r| r.identity != "beta"));
    }

    #[tokio::test]
    async fn test_round1_failure_skips_later_rounds() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .chat("alpha", Script::fail(GatewayError::ConnectionError("refused".to_string())))
                .chat("beta", Script::fail(GatewayError::HttpStatus {
                    status: 503,
                    body: "busy".to_string(),
                })),
        );
        let uc = use_case(Arc::clone(&gateway), council_topology(&["alpha", "beta"]));
        let (emitter, mut rx) = progress_channel(8);

        let err = uc.execute_with_progress(question(), &emitter).await.unwrap_err();
        drop(emitter);

        match &err {
            RunCouncilError::Stage { round, failures, .. } => {
                assert_eq!(*round, Round::Responses);
                assert_eq!(failures.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(gateway.synthesis_calls().is_empty());
        assert_eq!(gateway.chat_prompts("alpha").len(), 1);

        let mut names = Vec::new();
        while let Some(event) = rx.recv().await {
            names.push(event.name());
        }
        assert_eq!(names, vec!["error"]);
    }

    #[tokio::test]
    async fn test_synthesis_failure_is_stage_error() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .chat("alpha", Script::reply("a"))
                .synthesis(Script::fail(GatewayError::ConnectionError("down".to_string()))),
        );
        let uc = use_case(gateway, council_topology(&["alpha"]));
        let err = uc.execute(question()).await.unwrap_err();
        assert_eq!(err.round(), Some(Round::Synthesis));
    }

    #[tokio::test]
    async fn test_single_response_still_gets_a_trivial_review() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .chat("alpha", Script::reply("only answer"))
                .chat("beta", Script::fail(GatewayError::Timeout(Duration::from_millis(1))))
                .chat("alpha", Script::reply("FINAL RANKING:\n"))
                .synthesis(Script::reply("done")),
        );
        let uc = use_case(Arc::clone(&gateway), council_topology(&["alpha", "beta"]));
        let result = uc.execute(question()).await.unwrap();

        assert_eq!(result.round1.len(), 1);
        assert_eq!(result.round1_failures[0].worker, "beta");

        let prompts = gateway.chat_prompts("alpha");
        assert_eq!(prompts.len(), 2);
        assert!(!prompts[1].contains("only answer"));

        assert_eq!(result.round2.len(), 1);
        let review = &result.round2[0];
        assert_eq!(review.reviewer, "alpha");
        assert!(review.reviewed_labels.is_empty());
        assert!(review.parsed.is_strict());
        assert!(review.ranking().is_empty());
        assert!(result.metadata.aggregate_ranks.is_empty());
        assert_eq!(gateway.synthesis_calls(), vec!["chair"]);
    }

    #[tokio::test]
    async fn test_failed_trivial_review_does_not_end_the_run() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .chat("alpha", Script::reply("only answer"))
                .chat("alpha", Script::fail(GatewayError::ConnectionError("reset".to_string())))
                .synthesis(Script::reply("done")),
        );
        let uc = use_case(gateway, council_topology(&["alpha"]));
        let result = uc.execute(question()).await.unwrap();

        assert!(result.round2.is_empty());
        assert_eq!(result.round2_failures[0].worker, "alpha");
        assert_eq!(result.round3.text, "done");
    }

    #[tokio::test]
    async fn test_synthesis_refuses_reviewer_worker() {
        let gateway = Arc::new(ScriptedGateway::new().synthesis(Script::reply("should not be used")));
        let topology = council_topology(&["alpha", "beta"]);
        let reviewer = topology.get("alpha").unwrap().clone();
        let uc = use_case(Arc::clone(&gateway), topology);

        let request = SynthesisRequest {
            question: question(),
            round1: vec![],
            round2: vec![],
            label_mapping: LabelMapping::default(),
            aggregates: Aggregates::default(),
            timeout: Duration::from_secs(1),
        };

        let err = uc.synthesize(&reviewer, &request).await.unwrap_err();
        assert!(matches!(
            err,
            RunCouncilError::RoleViolation(TopologyError::RoleViolation {
                role: WorkerRole::Reviewer,
                ..
            })
        ));

        // Claiming the role does not help either
        let forged = WorkerDescriptor::synthesizer("alpha", reviewer.address.clone());
        assert!(uc.synthesize(&forged, &request).await.is_err());
        assert!(gateway.synthesis_calls().is_empty());
    }

    #[tokio::test]
    async fn test_events_follow_completion_order_and_end_with_done() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .chat("alpha", Script::delayed(Duration::from_millis(80), "slow"))
                .chat("beta", Script::reply("fast"))
                .chat("alpha", Script::reply("FINAL RANKING:\n1. Response B"))
                .chat("beta", Script::reply("FINAL RANKING:\n1. Response A"))
                .synthesis(Script::reply("done")),
        );
        let uc = use_case(gateway, council_topology(&["alpha", "beta"]));
        let (emitter, mut rx) = progress_channel(16);

        let result = uc.execute_with_progress(question(), &emitter).await.unwrap();
        drop(emitter);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        let names: Vec<_> = events.iter().map(|e| e.name()).collect();
        assert_eq!(
            names,
            vec![
                "round1-response",
                "round1-response",
                "round2-review",
                "round2-review",
                "round3-response",
                "done"
            ]
        );
        match &events[0] {
            CouncilEvent::Round1Response(r) => assert_eq!(r.worker, "beta"),
            other => panic!("unexpected event: {}", other.name()),
        }
        // Labels still follow registration order
        assert_eq!(
            result.metadata.label_mapping.identity_of(Label::from_index(0)),
            Some("alpha")
        );
    }

    #[tokio::test]
    async fn test_consumer_disconnect_skips_dependent_rounds() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .chat("alpha", Script::reply("a"))
                .chat("beta", Script::reply("b"))
                .synthesis(Script::reply("done")),
        );
        let uc = use_case(Arc::clone(&gateway), council_topology(&["alpha", "beta"]));
        let (emitter, rx) = progress_channel(8);
        drop(rx);

        let err = uc.execute_with_progress(question(), &emitter).await.unwrap_err();
        assert!(err.is_disconnect());
        // Round 1 still completed; round 2 and 3 never dispatched
        assert_eq!(gateway.chat_prompts("alpha").len(), 1);
        assert!(gateway.synthesis_calls().is_empty());
    }
}
