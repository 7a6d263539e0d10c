//! `opsloop run`: hand a task to the agent and supervise it.

use anyhow::{Context, bail};
use opsloop_agent::{ActionExecutor, Orchestrator, RunReport, Termination, system_prompt};
use opsloop_config::{AppConfig, ApprovalMode};
use opsloop_core::event::EventBus;
use opsloop_core::message::Conversation;
use opsloop_core::operator::{AutoApprove, Operator};
use opsloop_core::path::PathContext;
use opsloop_tools::{RegistryOptions, SystemCommandRunner, default_registry};
use std::path::PathBuf;
use std::sync::Arc;

use crate::operator::ConsoleOperator;
use crate::transcript;

pub struct RunArgs {
    pub task: Option<String>,
    pub path: PathBuf,
    pub yes: bool,
    pub idle_threshold: Option<u32>,
    pub max_rounds: Option<u32>,
    pub model: Option<String>,
}

/// Built-in action settings from the `[tools]` section.
pub fn registry_options(config: &AppConfig) -> RegistryOptions {
    RegistryOptions {
        allowed_programs: config.tools.allowed_programs.clone(),
        terraform_binary: config.tools.terraform_binary.clone(),
        terraform_file: config.tools.terraform_file.clone(),
    }
}

/// Fold command-line overrides into the loaded config.
fn apply_overrides(config: &mut AppConfig, args: &RunArgs) {
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(threshold) = args.idle_threshold {
        config.agent.idle_threshold = threshold;
    }
    if let Some(max_rounds) = args.max_rounds {
        config.agent.max_rounds = max_rounds;
    }
    if args.yes {
        config.agent.approval = ApprovalMode::AutoApprove;
    }
}

pub async fn run(args: RunArgs) -> anyhow::Result<RunReport> {
    let mut config = AppConfig::load().context("Failed to load config")?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    if !config.has_api_key() && config.provider != "ollama" {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    OPSLOOP_API_KEY, OPENAI_API_KEY or OPENROUTER_API_KEY");
        eprintln!();
        eprintln!("  Or add api_key to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        bail!("No API key found. See above for setup instructions.");
    }

    let console = Arc::new(ConsoleOperator::stdio());
    let task = match args.task {
        Some(task) => task,
        None => console.ask("What do you want to do?").await?,
    };
    if task.trim().is_empty() {
        bail!("No task given");
    }

    let operator: Arc<dyn Operator> = match config.agent.approval {
        ApprovalMode::Prompt => console,
        ApprovalMode::AutoApprove => Arc::new(AutoApprove),
    };

    let root = std::fs::canonicalize(&args.path)
        .with_context(|| format!("Project directory {} not found", args.path.display()))?;
    let mut ctx = PathContext::new(&root).with_forbidden(config.tools.forbidden_paths.clone());

    let provider = opsloop_providers::build_from_config(&config)?;
    let registry = default_registry(
        registry_options(&config),
        Arc::new(SystemCommandRunner),
        operator.clone(),
    )?;
    let executor = ActionExecutor::new(Arc::new(registry), operator);

    let event_bus = Arc::new(EventBus::default());
    let printer = transcript::spawn_printer(event_bus.subscribe());

    let mut agent = Orchestrator::new(provider, &config.model, executor, event_bus)
        .with_temperature(config.temperature)
        .with_settings(&config.agent);
    if let Some(max_tokens) = config.max_tokens {
        agent = agent.with_max_tokens(max_tokens);
    }

    println!("Provider:  {}", config.provider);
    println!("Model:     {}", config.model);
    println!("Project:   {}", root.display());
    println!(
        "Approval:  {}",
        match config.agent.approval {
            ApprovalMode::Prompt => "ask before every change",
            ApprovalMode::AutoApprove => "automatic",
        }
    );

    let mut conversation = Conversation::seeded(
        system_prompt(config.agent.system_prompt_override.as_deref()),
        &task,
        &args.path.display().to_string(),
    );
    let report = agent.run(&mut conversation, &mut ctx).await;
    let _ = printer.await;

    match &report.termination {
        Termination::Completed { final_message } if !final_message.trim().is_empty() => {
            println!("\n{}", final_message.trim());
        }
        Termination::Failed { error } => eprintln!("\n  [Error] {error}"),
        _ => {}
    }
    Ok(report)
}
