use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use minicode::orchestrator::Orchestrator;
use minicode::providers::openrouter::OpenRouterProvider;
use tracing_subscriber::EnvFilter;

mod commands;
mod configuration;
mod error;
mod session;

use configuration::Settings;

#[derive(Parser)]
#[command(author, version, about = "Terminal coding assistant backed by specialist agents", long_about = None)]
struct Cli {
    /// Model to use (overrides OPENROUTER_MODEL)
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start an interactive chat session (default)
    Chat,

    /// List the available agents
    Agents,

    /// Show an agent's capabilities
    Agent {
        /// Agent role, e.g. architect
        role: String,
    },

    /// Give a single task to one agent
    Ask {
        role: String,
        task: String,
        /// Extra context placed before the task
        #[arg(short, long, default_value = "")]
        context: String,
    },

    /// Have the architect draft a step-by-step plan
    Plan {
        goal: String,
        #[arg(short, long, default_value = "")]
        context: String,
    },

    /// Run an explicit multi-agent workflow
    Workflow {
        goal: String,
        /// A step as `role:task` or `role:task:deps`, deps being comma separated step numbers
        #[arg(short, long = "step", required = true)]
        steps: Vec<String>,
    },

    /// Review a file with the reviewer, developer and tester agents
    Review {
        file: PathBuf,
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Debug a file, running it first unless an error is given
    Debug {
        file: PathBuf,
        /// Error output to debug instead of running the file
        #[arg(short, long)]
        error: Option<String>,
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Design, implement, test and document a feature
    Implement {
        feature: String,
        #[arg(short, long, default_value = "")]
        requirements: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_orchestrator(model: Option<String>) -> Result<Orchestrator> {
    let settings = Settings::new().context("Failed to load configuration")?;
    let provider = OpenRouterProvider::new(settings.into_provider_config(model))?;
    Ok(Orchestrator::new(Box::new(provider)))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Chat) {
        Command::Agents => commands::agents::list(),
        Command::Agent { role } => commands::agents::info(&role),
        Command::Chat => {
            let orchestrator = build_orchestrator(cli.model)?;
            session::Session::new(orchestrator)?.start().await
        }
        Command::Ask {
            role,
            task,
            context,
        } => {
            let orchestrator = build_orchestrator(cli.model)?;
            commands::ask::ask(&orchestrator, &role, &task, &context).await
        }
        Command::Plan { goal, context } => {
            let orchestrator = build_orchestrator(cli.model)?;
            commands::ask::plan(&orchestrator, &goal, &context).await
        }
        Command::Workflow { goal, steps } => {
            let steps = steps
                .iter()
                .map(|step| commands::workflow::parse_step(step))
                .collect::<Result<Vec<_>>>()?;
            let orchestrator = build_orchestrator(cli.model)?;
            commands::workflow::run(&orchestrator, &goal, &steps).await
        }
        Command::Review { file, language } => {
            let orchestrator = build_orchestrator(cli.model)?;
            commands::pipelines::review(&orchestrator, &file, language.as_deref()).await
        }
        Command::Debug {
            file,
            error,
            language,
        } => {
            let orchestrator = build_orchestrator(cli.model)?;
            commands::pipelines::debug(&orchestrator, &file, error.as_deref(), language.as_deref())
                .await
        }
        Command::Implement {
            feature,
            requirements,
        } => {
            let orchestrator = build_orchestrator(cli.model)?;
            commands::pipelines::implement(&orchestrator, &feature, &requirements).await
        }
    }
}
