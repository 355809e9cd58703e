mod cafe;
mod commands;
mod info;
mod owner;
pub mod pickers;
mod token;

pub use cafe::{
    format_last_visit, run_cafe_customers, run_cafe_qr, run_cafe_redemptions, run_cafe_verify,
};
pub use commands::{AdminCommands, CafeCommands, OwnerCommands, TokenCommands};
pub use info::run_info;
pub use owner::{run_owner_add, run_owner_remove};
pub use token::{run_token_create, run_token_revoke};

use crate::store::SqliteStore;

/// Initialize store from data directory, checking it exists
pub fn init_store(data_dir: &str) -> anyhow::Result<SqliteStore> {
    let data_path: std::path::PathBuf = data_dir.into();
    let db_path = data_path.join("stampbook.db");

    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'stampbook admin init' first.",
            db_path.display()
        );
    }

    SqliteStore::new(&db_path).map_err(Into::into)
}
