use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "money-mind",
    about = "Money Mind - Generate narrated finance videos from a topic",
    version,
    long_about = "Generates a script with a language model, narrates it, pulls matching stock footage and music, renders a thumbnail and assembles long-form and short-form videos. Without a subcommand, runs one cycle for a random topic."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to ./money-mind.yaml or the user config directory)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one generation cycle
    Run {
        /// Topic to generate for (random from the rotation if not specified)
        #[arg(short, long, value_name = "TOPIC")]
        topic: Option<String>,
    },

    /// List the topic rotation
    Topics,

    /// Show configuration
    Config {
        /// Show the effective configuration instead of a default template
        #[arg(short, long)]
        show: bool,
    },
}

impl Cli {
    /// Default log filter for the chosen verbosity
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "money_mind=debug"
        } else if self.quiet {
            "money_mind=warn"
        } else {
            "money_mind=info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_arguments_means_default_cycle() {
        let cli = Cli::try_parse_from(["money-mind"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_filter(), "money_mind=info");
    }

    #[test]
    fn test_run_with_topic() {
        let cli =
            Cli::try_parse_from(["money-mind", "run", "--topic", "test topic", "-v"]).unwrap();
        match cli.command {
            Some(Commands::Run { ref topic }) => assert_eq!(topic.as_deref(), Some("test topic")),
            _ => panic!("expected run command"),
        }
        assert_eq!(cli.log_filter(), "money_mind=debug");
    }
}
