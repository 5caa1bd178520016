//! Model catalog command.

use console::style;

use crate::config::Config;
use crate::llm::choose_model;
use crate::pipeline::Analyzer;

/// List the provider's models and mark the one analysis would use.
pub async fn cmd_models(config: &Config) -> anyhow::Result<()> {
    let analyzer = Analyzer::from_config(config.analyzer.clone())?;
    let models = analyzer.catalog().await?;
    let chosen = choose_model(&models, &config.analyzer.preferred_models);

    println!("\n{}", style("Available models").bold());
    for model in &models {
        let marker = if Some(model.id.as_str()) == chosen {
            style("*").green().bold()
        } else {
            style(" ")
        };
        let methods: Vec<&str> = model.capabilities.iter().map(String::as_str).collect();

        if model.can_generate() {
            println!("  {} {}", marker, model.id);
        } else {
            println!("  {} {}", marker, style(&model.id).dim());
        }
        if !methods.is_empty() {
            println!("      {}", style(methods.join(", ")).dim());
        }
    }

    println!();
    match chosen {
        Some(id) => println!("{} Analysis would use {}", style("✓").green(), id),
        None => println!(
            "{} No listed model supports content generation",
            style("✗").red()
        ),
    }
    println!(
        "  Preferred: {}",
        style(config.analyzer.preferred_models.join(", ")).dim()
    );

    Ok(())
}
