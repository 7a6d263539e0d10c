//! Provider selection: builds the configured model provider.

use std::sync::Arc;

use opsloop_config::AppConfig;
use opsloop_core::error::ProviderError;
use opsloop_core::provider::Provider;

use crate::openai_compat::OpenAiCompatProvider;

/// Build the provider named in the configuration.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let base_url = match (&config.api_url, config.provider.as_str()) {
        (Some(url), _) => url.clone(),
        (None, "custom") => {
            return Err(ProviderError::NotConfigured(
                "provider 'custom' requires api_url".into(),
            ));
        }
        (None, name) => default_base_url(name).ok_or_else(|| {
            ProviderError::NotConfigured(format!("unknown provider '{name}'"))
        })?,
    };

    let api_key = match (&config.api_key, config.provider.as_str()) {
        (Some(key), _) => key.clone(),
        (None, "ollama") => "ollama".into(),
        (None, name) => {
            return Err(ProviderError::NotConfigured(format!(
                "no API key for provider '{name}'"
            )));
        }
    };

    tracing::debug!(provider = %config.provider, %base_url, "Building provider");
    let provider = OpenAiCompatProvider::new(&config.provider, base_url, api_key)?;
    Ok(Arc::new(provider))
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> Option<String> {
    let url = match provider_name {
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "ollama" => "http://localhost:11434/v1",
        _ => return None,
    };
    Some(url.into())
}
