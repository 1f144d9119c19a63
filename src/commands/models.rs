//! Model listing command

use crate::config::Config;
use crate::error::Result;
use crate::providers::create_provider_with_override;
use colored::Colorize;

/// List models available from the selected provider
pub async fn run_models(config: &Config, provider_override: Option<&str>) -> Result<()> {
    let provider = create_provider_with_override(&config.provider, provider_override, None)?;
    let models = provider.list_models().await?;
    let current = provider.current_model();

    let provider_name = provider_override.unwrap_or(&config.provider.provider_type);
    println!("{} ({})", "Available models".bold(), provider_name);
    for model in models {
        if model == current {
            println!("  {} {}", model.green(), "(current)".dimmed());
        } else {
            println!("  {}", model);
        }
    }

    Ok(())
}
