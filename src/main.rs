use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::Value;
use sober_launcher::config::Config;
use sober_launcher::intents::{self, handle_intent, reply_err, reply_ok, Intent};
use sober_launcher::manager::Manager;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::Level;
use tracing_subscriber::{filter::EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "sober-launcher", version)]
#[command(
    about = "Launch and supervise isolated Sober instances, one per profile",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List profiles under the selected base directory
    Profiles,
    /// Choose the directory that holds profile folders
    SelectDir { path: String },
    /// Create a profile folder under the base directory
    CreateProfile { name: String },
    /// Set the display name
    SetName { name: String },
    /// Launch the given profiles
    Launch {
        /// Run inside a terminal emulator
        #[arg(long, conflicts_with_all = ["link", "shortcut"])]
        console: bool,
        /// Join a specific game (a link containing games/<id>)
        #[arg(long, conflicts_with = "shortcut")]
        link: Option<String>,
        /// Pass a saved shortcut's parameter to the client
        #[arg(long)]
        shortcut: Option<String>,
        #[arg(required = true)]
        profiles: Vec<String>,
    },
    /// Force-close every Sober instance
    KillAll,
    /// Close Sober crash dialogs
    CloseCrashWindows,
    /// Count running Sober processes
    ClientProcesses,
    /// Manage saved shortcuts (private servers)
    Shortcuts {
        #[command(subcommand)]
        action: ShortcutAction,
    },
    /// Print the full launcher state
    State,
    /// Read JSON-lines intents on stdin and answer on stdout
    Serve,
}

#[derive(Subcommand)]
enum ShortcutAction {
    List,
    Add {
        name: String,
        parameter: String,
    },
    Edit {
        old_name: String,
        new_name: String,
        new_parameter: String,
        #[arg(long, default_value = "")]
        old_parameter: String,
    },
    Remove {
        name: String,
    },
}

impl Commands {
    /// `None` for `serve`, which runs the control loop instead of a single intent.
    fn into_intent(self) -> Option<Intent> {
        let intent = match self {
            Commands::Profiles => Intent::ListProfiles,
            Commands::SelectDir { path } => Intent::SelectBaseDirectory { path },
            Commands::CreateProfile { name } => Intent::CreateProfile { name },
            Commands::SetName { name } => Intent::SetDisplayName { name },
            Commands::Launch {
                console,
                link,
                shortcut,
                profiles,
            } => match (link, shortcut) {
                (Some(link), _) => Intent::LaunchLink { profiles, link },
                (None, Some(shortcut)) => Intent::LaunchShortcut { profiles, shortcut },
                (None, None) => Intent::Launch { profiles, console },
            },
            Commands::KillAll => Intent::TerminateAll,
            Commands::CloseCrashWindows => Intent::CloseCrashWindows,
            Commands::ClientProcesses => Intent::ClientProcesses,
            Commands::Shortcuts { action } => match action {
                ShortcutAction::List => Intent::ListShortcuts,
                ShortcutAction::Add { name, parameter } => Intent::AddShortcut { name, parameter },
                ShortcutAction::Edit {
                    old_name,
                    new_name,
                    new_parameter,
                    old_parameter,
                } => Intent::EditShortcut {
                    old_name,
                    old_parameter,
                    new_name,
                    new_parameter,
                },
                ShortcutAction::Remove { name } => Intent::RemoveShortcut { name },
            },
            Commands::State => Intent::State,
            Commands::Serve => return None,
        };
        Some(intent)
    }
}

fn setup_logging(log_level_str: &str) {
    let level = match log_level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sober_launcher={}", level)));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .with_level(true)
        .json()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn print_reply(reply: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(reply)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = Arc::new(Config::load()?);
    setup_logging(&config.log_level);

    tracing::info!(
        version = %env!("CARGO_PKG_VERSION"),
        data_dir = %config.data_dir.display(),
        "Starting sober-launcher"
    );
    tracing::debug!("Loaded configuration: {:?}", config);

    let mut manager = Manager::new(config.clone());

    let Some(intent) = cli.command.into_intent() else {
        let stdin = BufReader::new(tokio::io::stdin());
        intents::serve(&config, &mut manager, stdin, tokio::io::stdout()).await?;
        return Ok(ExitCode::SUCCESS);
    };

    match handle_intent(&mut manager, intent) {
        Ok(result) => {
            print_reply(&reply_ok(result))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!(error = %e, kind = ?e.kind(), "Command failed");
            print_reply(&reply_err(&e))?;
            Ok(ExitCode::FAILURE)
        }
    }
}
