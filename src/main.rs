use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use console::style;
use medscan::{cli, config, Config, ImageStaging, OpenAiClient, Session};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Upload a medical scan image for AI analysis.
#[derive(Parser, Debug)]
#[command(name = "medscan", version, about)]
struct Cli {
    /// Config file (defaults to <config dir>/medscan/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive session (default)
    Session,
    /// Analyze one image and exit
    Analyze {
        image: PathBuf,
        /// Also print a simplified explanation
        #[arg(long)]
        simplify: bool,
    },
    /// Print the effective configuration with the API key masked
    Config,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "medscan=warn",
        1 => "medscan=info",
        _ => "medscan=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = config::load_env_file(None);

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = dotenv {
        tracing::warn!(error = %e, "could not load .env");
    }

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    let command = cli.command.unwrap_or(Commands::Session);
    if let Commands::Config = command {
        print!("{}", toml::to_string_pretty(&config.redacted())?);
        return Ok(());
    }

    if let Err(e) = config.validate() {
        if e.is_fatal() {
            eprintln!("{}", style(e.user_message()).red().bold());
            std::process::exit(1);
        }
        tracing::warn!(error = %e, "configuration problem");
    }

    let client = OpenAiClient::new(&config)?;
    let session = Session::new(client, ImageStaging::new(&config.staging_dir));
    tracing::info!(
        vision_model = %config.vision_model,
        text_model = %config.text_model,
        "session started"
    );

    match command {
        Commands::Analyze { image, simplify } => cli::run_once(session, &image, simplify).await,
        Commands::Session | Commands::Config => cli::run_interactive(session).await,
    }
}
