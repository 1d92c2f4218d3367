//! Print the models available to the configured API key.
//!
//! Only models that support `generateContent` are listed; the second column is
//! the identifier to use for `service.model` or `STARLIGHT_MODEL`.
//!
//! ```bash
//! GEMINI_API_KEY=... cargo run --bin starlight-models
//! ```

use std::env;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use starlight_planner::services::GeminiReasoningService;
use starlight_planner::PlannerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::WARN),
        )
        .init();

    let config = PlannerConfig::load()?;
    let service = GeminiReasoningService::new(&config.service)?;

    println!("Checking available models at {}...", config.service.base_url);
    let models = service.list_models().await?;

    if models.is_empty() {
        println!("No models with generateContent support were returned.");
        return Ok(());
    }

    let width = models.iter().map(|m| m.name.len()).max().unwrap_or(0);
    for model in &models {
        let marker = if model.id == config.service.model { "*" } else { " " };
        println!("{} {:<width$}  {}", marker, model.name, model.id, width = width);
    }
    println!("\n{} model(s); * marks the configured model", models.len());

    Ok(())
}
