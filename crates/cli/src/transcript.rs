//! Live transcript printing, driven by domain events.

use opsloop_core::event::DomainEvent;
use opsloop_core::observation::Outcome;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Longest observation excerpt echoed to the terminal.
const MAX_OBSERVATION_LINES: usize = 20;

/// Print events until the run terminates or the bus closes.
pub fn spawn_printer(mut rx: broadcast::Receiver<Arc<DomainEvent>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(text) = render(&event) {
                        println!("{text}");
                    }
                    if matches!(event.as_ref(), DomainEvent::RunTerminated { .. }) {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Transcript printer fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Plain-text rendering of one event.
pub fn render(event: &DomainEvent) -> Option<String> {
    match event {
        DomainEvent::RoundStarted { round, .. } => {
            Some(format!("\n~~~~~~~~~~~~~~~~~~~~ [ Round {round} ] ~~~~~~~~~~~~~~~~~~~~"))
        }
        DomainEvent::AssistantReplied {
            content,
            action_count,
            ..
        } => {
            let mut text = String::new();
            if !content.trim().is_empty() {
                text.push_str(&format!("Agent: {}", content.trim()));
            }
            if *action_count > 0 {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&format!("Agent requested {action_count} action(s)"));
            }
            (!text.is_empty()).then_some(text)
        }
        DomainEvent::ActionDispatched {
            action,
            arguments,
            outcome,
            observation,
            duration_ms,
            ..
        } => {
            let mut text = format!("-> {action} {arguments} [{outcome}, {duration_ms} ms]");
            if *outcome != Outcome::Declined {
                for line in excerpt(observation) {
                    text.push_str("\n   ");
                    text.push_str(line);
                }
            }
            Some(text)
        }
        DomainEvent::IdleRound {
            consecutive,
            threshold,
            ..
        } => Some(format!("(no action requested, {consecutive}/{threshold})")),
        DomainEvent::RunTerminated { rounds, reason, .. } => {
            Some(format!("\nRun {reason} after {rounds} round(s)."))
        }
    }
}

fn excerpt(observation: &str) -> impl Iterator<Item = &str> {
    let total = observation.lines().count();
    let more = total.saturating_sub(MAX_OBSERVATION_LINES);
    observation
        .lines()
        .take(MAX_OBSERVATION_LINES)
        .chain((more > 0).then_some("..."))
}
