//! `opsloop init`: write the default config file.

use anyhow::Context;
use opsloop_config::AppConfig;

pub fn run() -> anyhow::Result<()> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    if config_path.exists() {
        println!("Config already exists at: {}", config_path.display());
        println!("Edit it manually or delete it and re-run init.");
        return Ok(());
    }

    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create {}", config_dir.display()))?;
    std::fs::write(&config_path, AppConfig::default_toml())
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Created config at: {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set an API key: export OPENAI_API_KEY=sk-...");
    println!("     (or put api_key in the config file)");
    println!("  2. Review [tools] allowed_programs and forbidden_paths");
    println!("  3. Run: opsloop run \"describe this project\" --path .");
    Ok(())
}
