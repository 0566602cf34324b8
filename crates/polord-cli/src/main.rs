use anyhow::Result;
use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "polord")]
#[command(about = "Policy order reconciliation CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> site -> override...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Print the move commands a reconciliation would issue, without moving anything
    Plan(RunArgs),

    /// Reconcile the backend state file to the desired order and publish
    Apply {
        #[command(flatten)]
        run: RunArgs,

        /// Write the resulting layout back to the state file
        #[arg(long, default_value_t = false)]
        write_state: bool,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Desired order document (YAML or JSON): `sections` + `rules`
    #[arg(long)]
    pub desired: String,

    /// Backend state file (JSON): sections with their rules, in policy order
    #[arg(long)]
    pub state: String,

    /// Layered config paths in merge order
    #[arg(long = "config")]
    pub config_paths: Vec<String>,

    /// Place the managed sections directly after this section id
    #[arg(long)]
    pub start_after: Option<String>,

    /// Fail on config keys nothing reads instead of warning
    #[arg(long, default_value_t = false)]
    pub strict_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = polord_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Plan(args) => {
            let inputs = commands::load_inputs(&args)?;
            commands::reconcile::run_plan(inputs).await?;
        }

        Commands::Apply { run, write_state } => {
            let inputs = commands::load_inputs(&run)?;
            commands::reconcile::run_apply(inputs, write_state).await?;
        }
    }

    Ok(())
}
