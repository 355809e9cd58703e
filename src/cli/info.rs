use serde::Serialize;

use crate::store::Store;

use super::init_store;

const LIST_LIMIT: i32 = 10000;

#[derive(Serialize)]
struct OwnerOutput {
    id: String,
    email: String,
    name: Option<String>,
    cafe_id: Option<String>,
    cafe_name: Option<String>,
    created_at: String,
}

#[derive(Serialize)]
struct TokenOutput {
    id: String,
    lookup: String,
    owner_id: Option<String>,
    is_admin: bool,
    created_at: String,
    expires_at: Option<String>,
    last_used_at: Option<String>,
}

#[derive(Serialize)]
struct DetailedServerInfo {
    owners: Vec<OwnerOutput>,
    tokens: Vec<TokenOutput>,
    cafes: usize,
}

pub fn run_info(data_dir: String, json: bool) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let owners = store.list_owners("", LIST_LIMIT)?;
    let tokens = store.list_tokens("", LIST_LIMIT)?;

    let mut owner_outputs = Vec::with_capacity(owners.len());
    for owner in owners {
        let cafe = store.get_cafe_by_owner(&owner.id)?;
        owner_outputs.push(OwnerOutput {
            cafe_id: cafe.as_ref().map(|c| c.id.clone()),
            cafe_name: cafe.map(|c| c.name),
            id: owner.id,
            email: owner.email,
            name: owner.name,
            created_at: owner.created_at.to_rfc3339(),
        });
    }
    let cafes = owner_outputs.iter().filter(|o| o.cafe_id.is_some()).count();

    if json {
        let info = DetailedServerInfo {
            owners: owner_outputs,
            tokens: tokens
                .into_iter()
                .map(|t| TokenOutput {
                    id: t.id,
                    lookup: t.token_lookup,
                    owner_id: t.owner_id,
                    is_admin: t.is_admin,
                    created_at: t.created_at.to_rfc3339(),
                    expires_at: t.expires_at.map(|dt| dt.to_rfc3339()),
                    last_used_at: t.last_used_at.map(|dt| dt.to_rfc3339()),
                })
                .collect(),
            cafes,
        };

        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        let admin_tokens = tokens.iter().filter(|t| t.is_admin).count();

        println!();
        println!("Stampbook Server Status");
        println!("{}", "─".repeat(23));
        println!("Owners:  {}", owner_outputs.len());
        println!("Cafes:   {cafes}");
        println!(
            "Tokens:  {} ({} admin, {} owner)",
            tokens.len(),
            admin_tokens,
            tokens.len() - admin_tokens
        );
        println!();
    }

    Ok(())
}
