use clap::Subcommand;

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Initialize the server (create database and admin token)
    Init {
        /// Data directory for the database and settings
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },

    /// Manage cafe owners
    Owner {
        #[command(subcommand)]
        command: OwnerCommands,
    },

    /// Manage access tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },

    /// Show server status information
    Info {
        /// Data directory for the database and settings
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum OwnerCommands {
    /// Add a cafe owner account
    Add {
        /// Data directory for the database and settings
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Sign-in email for the owner
        #[arg(long)]
        email: Option<String>,

        /// Display name
        #[arg(long)]
        name: Option<String>,

        /// Sign-in password (omit for a token-only account)
        #[arg(long)]
        password: Option<String>,

        /// Create a token for the new owner
        #[arg(long)]
        create_token: bool,

        /// Skip interactive prompts (requires --email)
        #[arg(long)]
        non_interactive: bool,
    },

    /// Remove an owner together with their cafe and tokens
    Remove {
        /// Data directory for the database and settings
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Owner ID to remove
        #[arg(long)]
        owner_id: Option<String>,

        /// Skip interactive prompts (requires --owner-id)
        #[arg(long)]
        non_interactive: bool,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Create a new access token
    Create {
        /// Data directory for the database and settings
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Owner ID for the token
        #[arg(long)]
        owner_id: Option<String>,

        /// Token expiration in days (omit for no expiration)
        #[arg(long)]
        expires_days: Option<i64>,

        /// Skip interactive prompts (requires --owner-id)
        #[arg(long)]
        non_interactive: bool,

        /// List existing tokens instead of creating one
        #[arg(long)]
        list: bool,

        /// Output the list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Revoke an access token
    Revoke {
        /// Data directory for the database and settings
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Token ID to revoke
        #[arg(long)]
        token_id: Option<String>,

        /// Skip interactive prompts (requires --token-id)
        #[arg(long)]
        non_interactive: bool,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum CafeCommands {
    /// List the cafe's customers, most recent visit first
    Customers {
        /// Data directory for the database and settings
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Owner whose cafe to show
        #[arg(long)]
        owner_id: Option<String>,

        /// Skip interactive prompts (requires --owner-id)
        #[arg(long)]
        non_interactive: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the latest redemptions and their status
    Redemptions {
        /// Data directory for the database and settings
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Owner whose cafe to show
        #[arg(long)]
        owner_id: Option<String>,

        /// Skip interactive prompts (requires --owner-id)
        #[arg(long)]
        non_interactive: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Verify and claim a redemption code at the counter
    Verify {
        /// Data directory for the database and settings
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Owner whose cafe the code belongs to
        #[arg(long)]
        owner_id: Option<String>,

        /// The 6-character code shown by the customer
        #[arg(long)]
        code: Option<String>,

        /// Skip interactive prompts (requires --owner-id and --code)
        #[arg(long)]
        non_interactive: bool,
    },

    /// Write the counter QR code as SVG
    Qr {
        /// Data directory for the database and settings
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Owner whose cafe to render
        #[arg(long)]
        owner_id: Option<String>,

        /// Output path (defaults to "<cafe name>-qr-code.svg")
        #[arg(long, short)]
        output: Option<String>,

        /// Skip interactive prompts (requires --owner-id)
        #[arg(long)]
        non_interactive: bool,
    },
}
