//! Prompt text the loop puts into the conversation on its own.

/// The system prompt used when the config does not override it.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are an autonomous operations agent that completes tasks by requesting actions.

RULES:
1. You can only act through the actions you are given. Choose from that list only.
2. Start by looking around: list and read files before changing anything.
3. Any action that changes files or infrastructure is shown to a human operator \
first. If one is skipped, do not repeat it unchanged; adjust your plan or ask the \
operator with ask_operator.
4. When the task is complete, reply with a short summary and request no further actions.";

/// Sent as a user turn after a round in which the model requested nothing.
pub const IDLE_REMINDER: &str = "\
You did not request any action. If the task is not finished, request the next \
action now. Replying again without an action will end the run.";

/// Resolve the system prompt, honoring a configured override.
pub fn system_prompt(override_prompt: Option<&str>) -> &str {
    match override_prompt {
        Some(p) if !p.trim().is_empty() => p,
        _ => DEFAULT_SYSTEM_PROMPT,
    }
}
