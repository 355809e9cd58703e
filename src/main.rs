use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use stampbook::auth::issue_token;
use stampbook::cli::{AdminCommands, CafeCommands, OwnerCommands, TokenCommands};
use stampbook::clock::SystemClock;
use stampbook::config::ServerConfig;
use stampbook::server::{AppState, create_router};
use stampbook::store::{SqliteStore, Store};

const NOT_INITIALIZED: &str =
    "Server not initialized. Run 'stampbook admin init' first to create the database and admin token.";

#[cfg(unix)]
fn set_restrictive_permissions(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}

#[derive(Parser)]
#[command(name = "stampbook")]
#[command(about = "Loyalty stamp cards for independent cafes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Counter-side tools for a cafe
    Cafe {
        #[command(subcommand)]
        command: CafeCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to (overrides stampbook.toml)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides stampbook.toml)
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database and settings
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Base of the web address encoded in QR codes
        #[arg(long)]
        stamp_base_url: Option<String>,

        /// Base of the app deep link written to NFC tags
        #[arg(long)]
        nfc_base_url: Option<String>,
    },
}

fn run_init(data_dir: String, non_interactive: bool) -> anyhow::Result<()> {
    let data_path = PathBuf::from(&data_dir);
    fs::create_dir_all(&data_path)?;

    let config = ServerConfig::load(&data_path)?;
    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;

    let token_file = data_path.join(".admin_token");

    if store.has_admin_token()? {
        bail!(
            "Server already initialized. Admin token exists at: {}",
            token_file.display()
        );
    }

    let (_, raw_token) = issue_token(&store, None, Utc::now(), None)?;
    fs::write(&token_file, &raw_token)?;

    #[cfg(unix)]
    set_restrictive_permissions(&token_file);

    println!();
    println!("========================================");
    println!("Admin token (save this, it won't be shown again):");
    println!();
    println!("  {raw_token}");
    println!();
    println!("Token also written to: {}", token_file.display());
    println!("========================================");
    println!();

    if !non_interactive {
        let create_owner = inquire::Confirm::new("Would you like to add a cafe owner now?")
            .with_default(false)
            .prompt()?;

        if create_owner {
            stampbook::cli::run_owner_add(data_dir, None, None, None, false, false)?;
        }
    }

    Ok(())
}

async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    data_dir: String,
    stamp_base_url: Option<String>,
    nfc_base_url: Option<String>,
) -> anyhow::Result<()> {
    let mut config = ServerConfig::load(&PathBuf::from(data_dir))?;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(url) = stamp_base_url {
        config.stamp_base_url = url;
    }
    if let Some(url) = nfc_base_url {
        config.nfc_base_url = url;
    }

    let token_file = config.data_dir.join(".admin_token");
    if !token_file.exists() {
        bail!(NOT_INITIALIZED);
    }

    let store = SqliteStore::new(config.db_path())?;
    if !store.has_admin_token()? {
        bail!(NOT_INITIALIZED);
    }

    info!("Admin token available at {}", token_file.display());

    let addr = config.socket_addr()?;
    let state = Arc::new(AppState {
        store: Arc::new(store),
        clock: Arc::new(SystemClock),
        config,
    });

    let app = create_router(state);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("stampbook=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                data_dir,
                non_interactive,
            } => run_init(data_dir, non_interactive)?,
            AdminCommands::Info { data_dir, json } => stampbook::cli::run_info(data_dir, json)?,
            AdminCommands::Owner { command } => match command {
                OwnerCommands::Add {
                    data_dir,
                    email,
                    name,
                    password,
                    create_token,
                    non_interactive,
                } => stampbook::cli::run_owner_add(
                    data_dir,
                    email,
                    name,
                    password,
                    create_token,
                    non_interactive,
                )?,
                OwnerCommands::Remove {
                    data_dir,
                    owner_id,
                    non_interactive,
                    yes,
                } => stampbook::cli::run_owner_remove(data_dir, owner_id, non_interactive, yes)?,
            },
            AdminCommands::Token { command } => match command {
                TokenCommands::Create {
                    data_dir,
                    owner_id,
                    expires_days,
                    non_interactive,
                    list,
                    json,
                } => stampbook::cli::run_token_create(
                    data_dir,
                    owner_id,
                    expires_days,
                    non_interactive,
                    list,
                    json,
                )?,
                TokenCommands::Revoke {
                    data_dir,
                    token_id,
                    non_interactive,
                    yes,
                } => stampbook::cli::run_token_revoke(data_dir, token_id, non_interactive, yes)?,
            },
        },
        Commands::Cafe { command } => match command {
            CafeCommands::Customers {
                data_dir,
                owner_id,
                non_interactive,
                json,
            } => stampbook::cli::run_cafe_customers(data_dir, owner_id, non_interactive, json)?,
            CafeCommands::Redemptions {
                data_dir,
                owner_id,
                non_interactive,
                json,
            } => stampbook::cli::run_cafe_redemptions(data_dir, owner_id, non_interactive, json)?,
            CafeCommands::Verify {
                data_dir,
                owner_id,
                code,
                non_interactive,
            } => stampbook::cli::run_cafe_verify(data_dir, owner_id, code, non_interactive)?,
            CafeCommands::Qr {
                data_dir,
                owner_id,
                output,
                non_interactive,
            } => stampbook::cli::run_cafe_qr(data_dir, owner_id, output, non_interactive)?,
        },
        Commands::Serve {
            host,
            port,
            data_dir,
            stamp_base_url,
            nfc_base_url,
        } => run_serve(host, port, data_dir, stamp_base_url, nfc_base_url).await?,
    }

    Ok(())
}
