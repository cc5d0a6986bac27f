//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use taskdeck_core::api::ApiClient;
use taskdeck_core::api::types::{ArtifactType, SessionStatus};
use taskdeck_core::config::Config;
use taskdeck_core::interrupt;

use crate::logging;

mod commands;

#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(version = "0.1")]
#[command(about = "Streaming client for the taskdeck agent server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Server base URL (overrides the configured value)
    #[arg(long, global = true, value_name = "URL")]
    server: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Manage sessions
    Sessions {
        #[command(subcommand)]
        command: Option<SessionCommands>,
    },
    /// Send a chat message and stream the reply
    Chat {
        /// Session ID
        #[arg(value_name = "SESSION_ID")]
        session: String,
        /// The message to send
        #[arg(value_name = "MESSAGE")]
        message: String,
    },
    /// Execute (or resume) a session's tasks, then summarize
    Run {
        /// Session ID
        #[arg(value_name = "SESSION_ID")]
        session: String,
    },
    /// Request a graceful pause of a running execution
    Pause {
        /// Session ID
        #[arg(value_name = "SESSION_ID")]
        session: String,
    },
    /// Replay persisted execution logs
    Logs {
        /// Session ID
        #[arg(value_name = "SESSION_ID")]
        session: String,
    },
    /// Manage a session's artifacts (lists them by default)
    Artifacts {
        /// Session ID
        #[arg(value_name = "SESSION_ID")]
        session: String,
        #[command(subcommand)]
        command: Option<ArtifactCommands>,
    },
    /// Check server health
    Health,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum SessionCommands {
    /// List sessions
    List {
        /// Filter by status (planning, executing, paused, completed)
        #[arg(long)]
        status: Option<SessionStatus>,
        /// Page size (1-100)
        #[arg(long)]
        limit: Option<u32>,
        /// Page offset
        #[arg(long)]
        offset: Option<u32>,
    },
    /// Create a new session
    Create,
    /// Show one session with its tasks and timeline
    Show {
        /// Session ID
        #[arg(value_name = "SESSION_ID")]
        id: String,
    },
    /// Delete a session
    Delete {
        /// Session ID
        #[arg(value_name = "SESSION_ID")]
        id: String,
    },
}

#[derive(clap::Subcommand)]
enum ArtifactCommands {
    /// List artifacts
    List {
        /// Filter by type (document, note, summary, plan, other)
        #[arg(long = "type", value_name = "TYPE")]
        artifact_type: Option<ArtifactType>,
    },
    /// Print an artifact's content
    Show {
        /// Artifact ID
        #[arg(value_name = "ARTIFACT_ID")]
        artifact: String,
    },
    /// Save an artifact to a file
    Download {
        /// Artifact ID
        #[arg(value_name = "ARTIFACT_ID")]
        artifact: String,
        /// Output path (defaults to the server-suggested filename)
        #[arg(long, value_name = "PATH")]
        out: Option<String>,
    },
    /// Delete an artifact
    Delete {
        /// Artifact ID
        #[arg(value_name = "ARTIFACT_ID")]
        artifact: String,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the active configuration
    Show,
    /// Set the server base URL
    SetUrl {
        /// Base URL, e.g. http://localhost:8000
        #[arg(value_name = "URL")]
        url: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    interrupt::init();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::load().context("load config")?;
    let _guard = logging::init(&config).context("init logging")?;

    // Config commands never touch the server.
    if let Commands::Config { command } = &cli.command {
        return match command {
            ConfigCommands::Show => commands::config::show(&config, cli.server.as_deref()),
            ConfigCommands::SetUrl { url } => commands::config::set_url(url),
        };
    }

    let base_url = cli
        .server
        .as_deref()
        .unwrap_or(config.server.base_url.as_str());
    let api = ApiClient::new(base_url)?;

    match cli.command {
        Commands::Sessions { command } => match command {
            None => commands::sessions::list(&api, None, None, None).await,
            Some(SessionCommands::List {
                status,
                limit,
                offset,
            }) => commands::sessions::list(&api, status, limit, offset).await,
            Some(SessionCommands::Create) => commands::sessions::create(&api).await,
            Some(SessionCommands::Show { id }) => commands::sessions::show(&api, &id).await,
            Some(SessionCommands::Delete { id }) => commands::sessions::delete(&api, &id).await,
        },
        Commands::Chat { session, message } => commands::chat::run(api, &session, &message).await,
        Commands::Run { session } => commands::run::run(api, &session).await,
        Commands::Pause { session } => commands::run::pause(&api, &session).await,
        Commands::Logs { session } => commands::logs::run(&api, &session).await,
        Commands::Artifacts { session, command } => match command {
            None => commands::artifacts::list(&api, &session, None).await,
            Some(ArtifactCommands::List { artifact_type }) => {
                commands::artifacts::list(&api, &session, artifact_type).await
            }
            Some(ArtifactCommands::Show { artifact }) => {
                commands::artifacts::show(&api, &session, &artifact).await
            }
            Some(ArtifactCommands::Download { artifact, out }) => {
                commands::artifacts::download(&api, &session, &artifact, out.as_deref()).await
            }
            Some(ArtifactCommands::Delete { artifact }) => {
                commands::artifacts::delete(&api, &session, &artifact).await
            }
        },
        Commands::Health => commands::sessions::health(&api).await,
        Commands::Config { .. } => unreachable!("handled above"),
    }
}
