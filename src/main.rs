use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use taskd::{config::ServerConfig, rest, storage::Storage, AppContext};
use tracing::info;

#[derive(Parser)]
#[command(name = "taskd", about = "taskd — personal task-tracking backend daemon", version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// REST server port
    #[arg(long, env = "TASKD_PORT")]
    port: Option<u16>,

    /// Data directory for config and the SQLite database
    #[arg(long, env = "TASKD_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TASKD_LOG")]
    log: Option<String>,

    /// Bind address for the REST server (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "TASKD_BIND")]
    bind_address: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "TASKD_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the server (default when no subcommand given).
    Serve,
    /// Manage API bearer tokens.
    ///
    /// Tokens are the only credential accepted by the /api routes. The raw
    /// token is printed once at mint time; only its SHA-256 digest is stored.
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Mint a token for a user and print it.
    Create {
        /// Owner id the token authenticates as
        user: String,
    },
    /// List registered token digests.
    List,
    /// Revoke all tokens for a user.
    Revoke {
        /// Owner id whose tokens are revoked
        user: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Arc::new(ServerConfig::new(
        args.port,
        args.data_dir,
        args.log,
        args.bind_address,
        args.log_file,
    ));

    // Keep the appender guard alive for the life of the process.
    let _log_guard = init_logging(&config.log_level, config.log_file.as_deref());

    let storage = Arc::new(Storage::new(&config.data_dir).await?);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            info!(
                data_dir = %config.data_dir.display(),
                "starting taskd v{}",
                env!("CARGO_PKG_VERSION")
            );
            let ctx = Arc::new(AppContext::new(config, storage));
            rest::start_rest_server(ctx).await
        }
        Command::Token { action } => match action {
            TokenAction::Create { user } => {
                let token = storage.register_token(&user).await?;
                println!("{token}");
                eprintln!("Token for '{user}' (shown once — store it now)");
                Ok(())
            }
            TokenAction::List => {
                for row in storage.list_tokens().await? {
                    println!("{}  {}  {}", row.token_hash, row.user_id, row.created_at);
                }
                Ok(())
            }
            TokenAction::Revoke { user } => {
                let n = storage.revoke_tokens(&user).await?;
                println!("Revoked {n} token(s) for '{user}'");
                Ok(())
            }
        },
    }
}

/// Initialise tracing. Returns the non-blocking appender guard when file
/// logging is enabled; dropping it would lose buffered log lines.
fn init_logging(
    log_level: &str,
    log_file: Option<&std::path::Path>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let filename = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("taskd.log"));

        // Ensure the directory exists before tracing-appender tries to open it.
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "warn: could not create log directory '{}': {e} — falling back to stdout",
                dir.display()
            );
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::new(log_level))
                .compact()
                .init();
            return None;
        }

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        tracing_subscriber::registry()
            .with(EnvFilter::new(log_level))
            .with(fmt::layer().compact())
            .with(fmt::layer().with_writer(non_blocking))
            .init();
        Some(guard)
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(log_level))
            .compact()
            .init();
        None
    }
}
