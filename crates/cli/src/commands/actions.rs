//! `opsloop actions`: list the actions the agent may request.

use opsloop_core::action::ActionRegistry;
use opsloop_core::operator::AutoApprove;
use opsloop_config::AppConfig;
use opsloop_tools::{SystemCommandRunner, default_registry};
use std::fmt::Write;
use std::sync::Arc;

use super::run::registry_options;

pub fn run() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let registry = default_registry(
        registry_options(&config),
        Arc::new(SystemCommandRunner),
        Arc::new(AutoApprove),
    )?;
    print!("{}", describe(&registry));
    Ok(())
}

/// One block per action: name, side-effect class, description, parameters.
pub fn describe(registry: &ActionRegistry) -> String {
    let mut out = String::new();
    for descriptor in registry.descriptors() {
        let _ = writeln!(out, "{} ({})", descriptor.name, descriptor.side_effect);
        let _ = writeln!(out, "    {}", descriptor.description);
        for field in &descriptor.schema.fields {
            let _ = writeln!(
                out,
                "    - {} ({}{}): {}",
                field.name,
                field.kind,
                if field.required { "" } else { ", optional" },
                field.description
            );
        }
        out.push('\n');
    }
    out
}
