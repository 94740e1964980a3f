use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use coordination::ontology::schema_description;
use insight_agents::config::{check_endpoint, InsightConfig};
use insight_agents::Orchestrator;

#[derive(Parser)]
#[command(name = "insight-agents", version, about = "Industry Q&A with reflection and bull/bear debate")]
struct Cli {
    /// TOML config file layered over environment defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer one or more questions (run concurrently).
    Ask {
        #[arg(required = true)]
        questions: Vec<String>,

        /// Print the full run outcome as JSON.
        #[arg(long)]
        json: bool,

        /// Override the reflection budget.
        #[arg(long)]
        max_reflections: Option<u32>,
    },
    /// Print the knowledge graph schema.
    Schema,
    /// Check that the model endpoint is reachable.
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = InsightConfig::resolve(cli.config.as_deref())?;

    match cli.command {
        Command::Ask {
            questions,
            json,
            max_reflections,
        } => {
            if let Some(n) = max_reflections {
                config.max_reflections = n;
            }
            info!(
                model = %config.llm.model,
                endpoint = %config.llm.base_url,
                domain = %config.domain,
                questions = questions.len(),
                "Insight engine starting"
            );
            let orchestrator = Orchestrator::from_config(&config)?;
            let outcomes = orchestrator.run_many(&questions).await;

            if json {
                let rendered =
                    serde_json::to_string_pretty(&outcomes).context("Failed to serialize outcomes")?;
                println!("{rendered}");
            } else {
                for (question, outcome) in questions.iter().zip(&outcomes) {
                    if questions.len() > 1 {
                        println!("=== {question} ===");
                    }
                    println!("{}\n", outcome.answer_text());
                }
            }
        }
        Command::Schema => {
            print!("{}", schema_description());
        }
        Command::Check => {
            if check_endpoint(&config.llm.base_url).await {
                println!("model endpoint OK: {}", config.llm.base_url);
            } else {
                warn!(endpoint = %config.llm.base_url, "Model endpoint unreachable");
                anyhow::bail!("model endpoint unreachable: {}", config.llm.base_url);
            }
        }
    }

    Ok(())
}
