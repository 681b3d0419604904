//! Lexflow - AI legal workflow orchestrator.
//!
//! Plans a multi-step legal workflow from a free-text objective and runs
//! it step by step against a generative model backend.

use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lexflow::{
    probe_backends, Config, PlanGenerator, ProviderManager, RunOutcome, StepResult, StepStatus,
    WorkflowEvent, WorkflowExecutor, WorkflowRun,
};

/// AI legal workflow orchestrator
#[derive(Parser)]
#[command(name = "lexflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan and execute a workflow for an objective
    Run {
        /// The objective to accomplish
        objective: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Model provider to use (auto, claude, ollama)
        #[arg(short, long)]
        provider: Option<String>,

        /// Jurisdiction for drafting and prediction
        #[arg(long)]
        jurisdiction: Option<String>,

        /// Drafting tone
        #[arg(long)]
        tone: Option<String>,

        /// Document type for drafting steps
        #[arg(long = "doc-type")]
        doc_type: Option<String>,
    },

    /// Generate and show a plan without executing it
    Plan {
        /// The objective to plan for
        objective: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Model provider to use (auto, claude, ollama)
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Report model backend availability
    Providers,

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };

    tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).init();

    match cli.command {
        Commands::Run { objective, format, provider, jurisdiction, tone, doc_type } => {
            cmd_run(&objective, &format, provider, jurisdiction, tone, doc_type)?;
        }
        Commands::Plan { objective, format, provider } => {
            cmd_plan(&objective, &format, provider)?;
        }
        Commands::Providers => {
            cmd_providers()?;
        }
        Commands::Config { path } => {
            cmd_config(path)?;
        }
        Commands::Completions { shell } => {
            cmd_completions(shell);
        }
    }

    Ok(())
}

/// Plan and execute a workflow.
fn cmd_run(
    objective: &str,
    format: &str,
    provider: Option<String>,
    jurisdiction: Option<String>,
    tone: Option<String>,
    doc_type: Option<String>,
) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let config = Config::load()?;

        let mut model_config = config.model.clone();
        if let Some(provider) = provider {
            model_config.provider = provider;
        }

        let manager = ProviderManager::from_config(&model_config).await?;
        tracing::debug!(provider = manager.active_provider(), "Provider selected");

        // CLI flags override configured run defaults
        let mut defaults = config.defaults.clone();
        if let Some(jurisdiction) = jurisdiction {
            defaults.draft.jurisdiction = jurisdiction.clone();
            defaults.predict.jurisdiction = jurisdiction;
        }
        if let Some(tone) = tone {
            defaults.draft.tone = tone;
        }
        if let Some(doc_type) = doc_type {
            defaults.draft.document_type = doc_type;
        }

        let executor = WorkflowExecutor::new(manager.provider())
            .with_defaults(defaults)
            .with_max_plan_steps(config.general.max_plan_steps);

        // Ctrl-C cancels cooperatively between steps
        let token = executor.cancellation_token();
        ctrlc::set_handler(move || {
            eprintln!("\nCancelling after the current step...");
            token.cancel();
        })?;

        let text_output = format != "json";
        let printer = if text_output {
            let mut events = executor.subscribe();
            Some(tokio::spawn(async move {
                while let Ok(event) = events.recv().await {
                    print_event(&event);
                }
            }))
        } else {
            None
        };

        let run = executor.run(objective).await?;

        if let Some(printer) = printer {
            // Let the printer drain buffered events before tearing it down
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            printer.abort();
        }

        if text_output {
            print_run_summary(&run);
        } else {
            println!("{}", serde_json::to_string_pretty(&run)?);
        }

        if run.is_success() {
            Ok(())
        } else {
            anyhow::bail!("{}", run.outcome)
        }
    })
}

/// Generate and show a plan without executing it.
fn cmd_plan(objective: &str, format: &str, provider: Option<String>) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let config = Config::load()?;

        let mut model_config = config.model.clone();
        if let Some(provider) = provider {
            model_config.provider = provider;
        }

        let manager = ProviderManager::from_config(&model_config).await?;

        let generator = PlanGenerator::new(manager.provider())
            .with_max_steps(config.general.max_plan_steps);
        let plan = generator.generate(objective).await?;

        match format {
            "json" => println!("{}", serde_json::to_string_pretty(&plan)?),
            _ => {
                println!("Plan for: {objective}\n");
                for step in &plan {
                    println!("  {}. [{}] {}", step.number, step.kind, step.summary);
                    println!("     {}", step.instruction);
                }
                println!("\nTotal: {} steps", plan.len());
            }
        }

        Ok(())
    })
}

/// Report model backend availability.
fn cmd_providers() -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let config = Config::load()?;
        let report = probe_backends(&config.model).await;

        println!("Model backends:");
        for (name, available) in report {
            let status = if available { "✓ available" } else { "✗ unavailable" };
            println!("  {name}: {status}");
        }

        Ok(())
    })
}

/// Show configuration.
fn cmd_config(show_path: bool) -> Result<()> {
    if show_path {
        match Config::config_dir() {
            Some(dir) => println!("{}", dir.join("config.toml").display()),
            None => anyhow::bail!("Could not determine config directory"),
        }
        return Ok(());
    }

    let config = Config::load()?;
    println!("{}", toml::to_string_pretty(&config)?);

    Ok(())
}

/// Generate shell completions.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "lexflow", &mut io::stdout());
}

/// Render one workflow event as a progress line.
fn print_event(event: &WorkflowEvent) {
    match event {
        WorkflowEvent::RunStarted { objective, .. } => {
            println!("→ Running workflow: {objective}");
        }
        WorkflowEvent::PlanReady { steps, .. } => {
            println!("Plan ({} steps):", steps.len());
            for step in steps {
                println!("  {}. [{}] {}", step.number, step.kind, step.summary);
            }
        }
        WorkflowEvent::StepUpdated { step, .. } => match step.status {
            StepStatus::Active => {
                println!("→ Step {} [{}] {}...", step.number, step.kind, step.summary);
            }
            StepStatus::Completed => {
                println!("✓ Step {} complete", step.number);
            }
            StepStatus::Failed => {
                if let Some(StepResult::Error { ref message }) = step.result {
                    println!("✗ Step {} failed: {message}", step.number);
                } else {
                    println!("✗ Step {} failed", step.number);
                }
            }
            StepStatus::Pending => {}
        },
        WorkflowEvent::RunFinished { .. } => {}
    }
}

/// Print the final run summary with step results.
fn print_run_summary(run: &WorkflowRun) {
    println!("\n{}", run.outcome);

    for step in &run.plan {
        match (&step.status, &step.result) {
            (StepStatus::Completed, Some(StepResult::Output { output })) => {
                println!("\n── Step {} [{}] {}", step.number, step.kind, step.summary);
                println!("{}", output.render());
            }
            (StepStatus::Failed, Some(StepResult::Error { message })) => {
                println!("\n── Step {} [{}] FAILED", step.number, step.kind);
                println!("{message}");
            }
            _ => {}
        }
    }

    if let RunOutcome::Failed { .. } = run.outcome {
        let pending = run.plan.iter().filter(|s| s.status == StepStatus::Pending).count();
        if pending > 0 {
            println!("\n{pending} step(s) never ran.");
        }
    }
}
