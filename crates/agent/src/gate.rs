//! Confirmation gate: decides when an action needs the operator's
//! approval and what the operator is shown.

use opsloop_core::action::{ActionDescriptor, Arguments};
use opsloop_core::operator::{ApprovalRequest, Operator};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ConfirmationGate {
    operator: Arc<dyn Operator>,
}

impl ConfirmationGate {
    pub fn new(operator: Arc<dyn Operator>) -> Self {
        Self { operator }
    }

    /// Returns `true` if the action may run.
    ///
    /// Read-only actions pass without asking. Anything else is shown to the
    /// operator with its exact arguments, and the call blocks until they
    /// decide. An operator that cannot be reached counts as a decline.
    pub async fn authorize(&self, descriptor: &ActionDescriptor, arguments: &Arguments) -> bool {
        if !descriptor.side_effect.requires_confirmation() {
            debug!(action = %descriptor.name, "Read-only action, no confirmation needed");
            return true;
        }

        let request = ApprovalRequest {
            action: descriptor.name.clone(),
            side_effect: descriptor.side_effect,
            arguments: arguments.clone(),
        };

        match self.operator.approve(&request).await {
            Ok(approved) => {
                info!(action = %descriptor.name, approved, "Operator decision");
                approved
            }
            Err(e) => {
                warn!(action = %descriptor.name, error = %e, "Operator unavailable, treating as declined");
                false
            }
        }
    }
}
