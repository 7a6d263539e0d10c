//! The orchestration loop.
//!
//! Each round sends the full transcript and the registry's action
//! definitions to the model. A reply with action requests is dispatched
//! in order, one observation per request, before the model is called
//! again. A reply without requests is an idle round; enough of those in a
//! row end the run. A failed model call is the only way a run fails.

use chrono::Utc;
use opsloop_config::AgentSettings;
use opsloop_core::error::{ProtocolError, ProviderError};
use opsloop_core::event::{DomainEvent, EventBus};
use opsloop_core::message::{ActionRequest, Conversation, Turn};
use opsloop_core::observation::Observation;
use opsloop_core::path::PathContext;
use opsloop_core::provider::{Provider, ProviderRequest};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::executor::ActionExecutor;
use crate::prompt::IDLE_REMINDER;

/// Consecutive idle rounds tolerated before a run completes.
pub const DEFAULT_IDLE_THRESHOLD: u32 = 2;

/// How a run ended.
#[derive(Debug, Clone)]
pub enum Termination {
    /// The model stopped requesting actions
    Completed { final_message: String },
    /// The model call failed; no final answer
    Failed { error: ProviderError },
    /// The configured round cap was reached
    RoundLimit,
}

impl Termination {
    pub fn is_success(&self) -> bool {
        !matches!(self, Termination::Failed { .. })
    }
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Completed { .. } => write!(f, "completed"),
            Termination::Failed { error } => write!(f, "failed: {error}"),
            Termination::RoundLimit => write!(f, "round limit reached"),
        }
    }
}

/// Summary of one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub termination: Termination,
    /// Model calls made
    pub rounds: u32,
    /// Observations appended
    pub observations: usize,
}

/// State owned by a single run.
#[derive(Debug, Default)]
struct LoopState {
    round: u32,
    idle_rounds: u32,
    observations: usize,
}

/// Drives the model/action round cycle for one conversation at a time.
pub struct Orchestrator {
    /// The model collaborator
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Max tokens per model response
    max_tokens: Option<u32>,

    /// Resolves, confirms and runs requested actions
    executor: ActionExecutor,

    /// Consecutive idle rounds before the run completes (≥ 1)
    idle_threshold: u32,

    /// Cap on model calls per run
    max_rounds: Option<u32>,

    /// Event bus for domain events
    event_bus: Arc<EventBus>,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        executor: ActionExecutor,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            executor,
            idle_threshold: DEFAULT_IDLE_THRESHOLD,
            max_rounds: None,
            event_bus,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the max tokens per model response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set how many idle rounds in a row end the run. Zero is treated as one.
    pub fn with_idle_threshold(mut self, threshold: u32) -> Self {
        self.idle_threshold = threshold.max(1);
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: Option<u32>) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Apply the `[agent]` section of the config.
    pub fn with_settings(self, settings: &AgentSettings) -> Self {
        self.with_idle_threshold(settings.idle_threshold)
            .with_max_rounds(settings.max_rounds())
    }

    pub fn idle_threshold(&self) -> u32 {
        self.idle_threshold
    }

    /// Run until the model goes idle, the round cap is hit, or a model
    /// call fails. The conversation is left holding the full transcript.
    pub async fn run(&self, conversation: &mut Conversation, ctx: &mut PathContext) -> RunReport {
        info!(
            conversation_id = %conversation.id,
            turns = conversation.len(),
            idle_threshold = self.idle_threshold,
            max_rounds = ?self.max_rounds,
            "Starting run"
        );

        let definitions = self.executor.registry().definitions();
        let mut state = LoopState::default();

        let termination = loop {
            if let Some(max) = self.max_rounds
                && state.round >= max
            {
                warn!(conversation_id = %conversation.id, rounds = state.round, "Round limit reached");
                break Termination::RoundLimit;
            }

            state.round += 1;
            let round = state.round;
            debug!(conversation_id = %conversation.id, round, "Agent loop round");
            self.event_bus.publish(DomainEvent::RoundStarted {
                conversation_id: conversation.id.to_string(),
                round,
                timestamp: Utc::now(),
            });

            let request = ProviderRequest {
                model: self.model.clone(),
                turns: conversation.turns().to_vec(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                actions: definitions.clone(),
            };

            let response = match self.provider.complete(request).await {
                Ok(response) => response,
                Err(e) => {
                    error!(conversation_id = %conversation.id, round, error = %e, "Model call failed");
                    break Termination::Failed { error: e };
                }
            };

            let turn = response.turn;
            let requests = turn.action_requests.clone();
            let content = turn.content.clone();
            self.event_bus.publish(DomainEvent::AssistantReplied {
                round,
                content: content.clone(),
                action_count: requests.len(),
                tokens_used: response.usage.as_ref().map(|u| u.total_tokens),
                timestamp: Utc::now(),
            });

            // The assistant turn always lands before any of its observations
            conversation.push(turn);

            if requests.is_empty() {
                state.idle_rounds += 1;
                info!(round, consecutive = state.idle_rounds, threshold = self.idle_threshold, "Idle round");
                self.event_bus.publish(DomainEvent::IdleRound {
                    round,
                    consecutive: state.idle_rounds,
                    threshold: self.idle_threshold,
                    timestamp: Utc::now(),
                });

                if state.idle_rounds >= self.idle_threshold {
                    break Termination::Completed {
                        final_message: content,
                    };
                }
                conversation.push(Turn::user(IDLE_REMINDER));
                continue;
            }

            state.idle_rounds = 0;
            state.observations += self.dispatch(round, &requests, conversation, ctx).await;
        };

        info!(
            conversation_id = %conversation.id,
            rounds = state.round,
            observations = state.observations,
            termination = %termination,
            "Run finished"
        );
        self.event_bus.publish(DomainEvent::RunTerminated {
            conversation_id: conversation.id.to_string(),
            rounds: state.round,
            reason: termination.to_string(),
            success: termination.is_success(),
            timestamp: Utc::now(),
        });

        RunReport {
            termination,
            rounds: state.round,
            observations: state.observations,
        }
    }

    /// Answer every request in the batch, in order. Returns the number of
    /// observations appended, which always equals `requests.len()`.
    async fn dispatch(
        &self,
        round: u32,
        requests: &[ActionRequest],
        conversation: &mut Conversation,
        ctx: &mut PathContext,
    ) -> usize {
        debug!(round, count = requests.len(), "Dispatching action batch");

        if let Err(e) = check_batch(requests) {
            warn!(round, error = %e, "Rejecting action batch");
            for request in requests {
                let observation = Observation::from_protocol_error(&request.correlation_id, &e);
                self.record(round, request, observation, 0, conversation);
            }
            return requests.len();
        }

        for request in requests {
            let start = Instant::now();
            let observation = self.executor.execute(request, ctx).await;
            let duration_ms = start.elapsed().as_millis() as u64;
            self.record(round, request, observation, duration_ms, conversation);
        }
        requests.len()
    }

    fn record(
        &self,
        round: u32,
        request: &ActionRequest,
        observation: Observation,
        duration_ms: u64,
        conversation: &mut Conversation,
    ) {
        self.event_bus.publish(DomainEvent::ActionDispatched {
            round,
            correlation_id: request.correlation_id.clone(),
            action: request.name.clone(),
            arguments: request.arguments.clone(),
            outcome: observation.outcome,
            observation: observation.content.clone(),
            duration_ms,
            timestamp: Utc::now(),
        });
        conversation.push(Turn::observation(observation));
    }
}

/// Every request in a batch needs its own, non-empty correlation id.
fn check_batch(requests: &[ActionRequest]) -> Result<(), ProtocolError> {
    let mut seen = HashSet::new();
    for request in requests {
        if request.correlation_id.trim().is_empty() {
            return Err(ProtocolError::MissingCorrelationId {
                action: request.name.clone(),
            });
        }
        if !seen.insert(request.correlation_id.as_str()) {
            return Err(ProtocolError::DuplicateCorrelationId(
                request.correlation_id.clone(),
            ));
        }
    }
    Ok(())
}
