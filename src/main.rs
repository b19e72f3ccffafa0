use anyhow::Result;
use clap::Parser;
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use money_mind::cli::{Cli, Commands};
use money_mind::config::{Config, Credentials};
use money_mind::pipeline::{choose_topic, CyclePipeline, TOPICS};
use money_mind::upload::UploadOutcome;
use money_mind::utils;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load(cli.config.as_deref()).await?;

    match cli.command {
        None => run(config, None, cli.quiet).await?,
        Some(Commands::Run { topic }) => run(config, topic, cli.quiet).await?,
        Some(Commands::Topics) => {
            println!("Topic rotation:");
            for topic in TOPICS {
                println!("  • {}", topic);
            }
        }
        Some(Commands::Config { show }) => {
            if show {
                config.display();
            } else {
                println!("# Default configuration; save as money-mind.yaml to override");
                print!("{}", serde_yaml::to_string(&Config::default())?);
            }
        }
    }

    Ok(())
}

async fn run(config: Config, topic: Option<String>, quiet: bool) -> Result<()> {
    // Check for required external tools (non-fatal)
    let missing_deps = utils::check_dependencies().await;
    if !missing_deps.is_empty() {
        eprintln!("⚠️  Dependency check warnings:");
        for dep in missing_deps {
            eprintln!("   • {}", dep);
        }
        eprintln!("   (Continuing anyway - tools may be available)");
    }

    let credentials = Credentials::from_env();
    for name in credentials.missing() {
        tracing::warn!("{} is not set", name);
    }

    let pipeline = CyclePipeline::from_config(config, &credentials, !quiet)?;
    let topic = topic.unwrap_or_else(|| choose_topic().to_string());

    if !quiet {
        println!("Generating scripts for: {}", style(&topic).bold());
    }

    let report = pipeline.run_cycle(&topic).await?;

    if !quiet {
        println!();
        println!("{}", style("Cycle complete").green().bold());
        println!("  Title: {}", report.title);
        println!("  Clips: {}", report.clips.len());
        println!("  Long video: {}", report.long_video.display());
        println!("  Short video: {}", report.short_video.display());
        if let Some(thumbnail) = &report.thumbnail {
            println!("  Thumbnail: {}", thumbnail.display());
        }
        for outcome in &report.uploads {
            match outcome {
                UploadOutcome::Skipped { reason } => println!("  Upload skipped: {}", reason),
                UploadOutcome::Attempted { video, note } => {
                    println!("  Upload {}: {}", video.display(), note)
                }
            }
        }
        println!("Files saved to {}", pipeline.outputs_dir().display());
    }

    Ok(())
}
