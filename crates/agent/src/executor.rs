//! Action executor: turns one action request into exactly one observation.
//!
//! Nothing raised while resolving, validating, confirming or running an
//! action escapes this module; every failure becomes observation text the
//! model can react to.

use opsloop_core::action::ActionRegistry;
use opsloop_core::message::ActionRequest;
use opsloop_core::observation::Observation;
use opsloop_core::operator::Operator;
use opsloop_core::path::PathContext;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::gate::ConfirmationGate;

pub struct ActionExecutor {
    registry: Arc<ActionRegistry>,
    gate: ConfirmationGate,
}

impl ActionExecutor {
    pub fn new(registry: Arc<ActionRegistry>, operator: Arc<dyn Operator>) -> Self {
        Self {
            registry,
            gate: ConfirmationGate::new(operator),
        }
    }

    /// The registry advertised to the model.
    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Resolve, validate, confirm and run a single request.
    pub async fn execute(&self, request: &ActionRequest, ctx: &mut PathContext) -> Observation {
        let id = request.correlation_id.as_str();

        let action = match self.registry.get(&request.name) {
            Ok(action) => action,
            Err(e) => {
                warn!(action = %request.name, correlation_id = %id, "Unknown action requested");
                return Observation::from_action_error(id, &e);
            }
        };

        let arguments = match request.parse_arguments() {
            Ok(arguments) => arguments,
            Err(e) => {
                warn!(action = %request.name, correlation_id = %id, error = %e, "Malformed arguments");
                return Observation::from_protocol_error(id, &e);
            }
        };

        let descriptor = action.descriptor();
        if let Err(e) = descriptor.schema.validate(&descriptor.name, &arguments) {
            warn!(action = %request.name, correlation_id = %id, error = %e, "Arguments failed validation");
            return Observation::from_action_error(id, &e);
        }

        if !self.gate.authorize(descriptor, &arguments).await {
            info!(action = %request.name, correlation_id = %id, "Skipped by operator");
            return Observation::declined(id, &descriptor.name);
        }

        debug!(action = %request.name, correlation_id = %id, cwd = %ctx.cwd().display(), "Executing action");
        match action.execute(arguments, ctx).await {
            Ok(output) => Observation::success(id, output.render()),
            Err(e) => {
                warn!(action = %request.name, correlation_id = %id, error = %e, "Action failed");
                Observation::from_action_error(id, &e)
            }
        }
    }
}
