//! Shared test doubles for the agent crate.

use opsloop_core::error::{OperatorError, ProviderError};
use opsloop_core::message::{ActionRequest, Turn};
use opsloop_core::operator::{ApprovalRequest, Operator};
use opsloop_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue. Once
/// the queue is empty it returns the configured failure, or panics if
/// there is none.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    failure: Option<ProviderError>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail with `error` after the scripted responses run out.
    pub fn then_fail(mut self, error: ProviderError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let count = requests.len();
        requests.push(request);

        let responses = self.responses.lock().unwrap();
        if count < responses.len() {
            return Ok(responses[count].clone());
        }
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => panic!(
                "SequentialMockProvider: no more responses (call #{count}, have {})",
                responses.len()
            ),
        }
    }
}

/// A provider whose transport is always down.
pub struct FailingProvider;

#[async_trait::async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::Network("connection refused".into()))
    }
}

/// An operator with queued decisions and canned answers.
///
/// When the decision queue runs dry it falls back to `fallback`; a `None`
/// fallback means the operator cannot be reached.
pub struct ScriptedOperator {
    decisions: Mutex<VecDeque<bool>>,
    fallback: Option<bool>,
    answers: Mutex<VecDeque<String>>,
    approvals_seen: Mutex<Vec<ApprovalRequest>>,
    questions_seen: Mutex<Vec<String>>,
}

impl ScriptedOperator {
    fn build(decisions: Vec<bool>, fallback: Option<bool>) -> Self {
        Self {
            decisions: Mutex::new(decisions.into()),
            fallback,
            answers: Mutex::new(VecDeque::new()),
            approvals_seen: Mutex::new(Vec::new()),
            questions_seen: Mutex::new(Vec::new()),
        }
    }

    /// Decide in order, declining once the list is used up.
    pub fn with_decisions(decisions: Vec<bool>) -> Self {
        Self::build(decisions, Some(false))
    }

    pub fn approving() -> Self {
        Self::build(vec![], Some(true))
    }

    pub fn declining() -> Self {
        Self::build(vec![], Some(false))
    }

    pub fn unavailable() -> Self {
        Self::build(vec![], None)
    }

    pub fn with_answers(self, answers: Vec<&str>) -> Self {
        *self.answers.lock().unwrap() = answers.into_iter().map(String::from).collect();
        self
    }

    pub fn approvals_seen(&self) -> Vec<ApprovalRequest> {
        self.approvals_seen.lock().unwrap().clone()
    }

    pub fn questions_seen(&self) -> Vec<String> {
        self.questions_seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Operator for ScriptedOperator {
    async fn approve(&self, request: &ApprovalRequest) -> Result<bool, OperatorError> {
        self.approvals_seen.lock().unwrap().push(request.clone());
        match self.decisions.lock().unwrap().pop_front().or(self.fallback) {
            Some(decision) => Ok(decision),
            None => Err(OperatorError::Unavailable("scripted operator is away".into())),
        }
    }

    async fn ask(&self, question: &str) -> Result<String, OperatorError> {
        self.questions_seen.lock().unwrap().push(question.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| OperatorError::Unavailable("no scripted answer".into()))
    }
}

fn usage() -> Option<Usage> {
    Some(Usage {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
    })
}

/// Create a simple text response (no action requests).
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        turn: Turn::assistant(text),
        usage: usage(),
        model: "mock-model".into(),
    }
}

/// Create a response carrying a batch of action requests.
pub fn make_action_response(requests: Vec<ActionRequest>, thought: &str) -> ProviderResponse {
    ProviderResponse {
        turn: Turn::assistant_with_actions(thought, requests),
        usage: usage(),
        model: "mock-model".into(),
    }
}

/// Helper to create an action request.
pub fn action_request(id: &str, name: &str, args: serde_json::Value) -> ActionRequest {
    ActionRequest::new(id, name, serde_json::to_string(&args).unwrap())
}
