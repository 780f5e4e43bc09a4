//! One-shot admin commands against the local database, for provisioning
//! users and content items without going through the REST surface.

use crate::database::models::{ItemKind, ItemRecord, UserRecord};
use crate::database::repositories::{CommentRepository, ItemRepository, UserRepository};
use crate::database::Database;
use crate::utils::now_utc_iso;
use anyhow::Result;
use uuid::Uuid;

pub fn create_user(database: &Database, name: &str, avatar_url: Option<String>) -> Result<()> {
    if name.trim().is_empty() {
        anyhow::bail!("user name may not be empty");
    }

    let record = UserRecord {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        avatar_url,
        api_token: Uuid::new_v4().to_string(),
        created_at: now_utc_iso(),
    };
    database.with_repositories(|repos| repos.users().create(&record))?;

    println!("created user {} ({})", record.name, record.id);
    println!("api token: {}", record.api_token);
    Ok(())
}

pub fn create_item(
    database: &Database,
    kind: ItemKind,
    title: &str,
    owner: Option<String>,
) -> Result<()> {
    if title.trim().is_empty() {
        anyhow::bail!("item title may not be empty");
    }
    if let Some(owner_id) = owner.as_deref() {
        let owner_exists = database
            .with_repositories(|repos| repos.users().get(owner_id))?
            .is_some();
        if !owner_exists {
            anyhow::bail!("owner {owner_id} not found");
        }
    }

    let record = ItemRecord {
        id: Uuid::new_v4().to_string(),
        kind: kind.as_str().to_string(),
        title: title.to_string(),
        owner_user_id: owner,
        created_at: now_utc_iso(),
    };
    database.with_repositories(|repos| repos.items().create(&record))?;

    println!("created {} {} ({})", record.kind, record.title, record.id);
    Ok(())
}

pub fn list_items(database: &Database, limit: usize) -> Result<()> {
    let listing = database.with_repositories(|repos| {
        let items = repos.items().list_recent(limit)?;
        let comments = repos.comments();
        items
            .into_iter()
            .map(|item| {
                let count = comments.count_for_item(&item.id)?;
                Ok((item, count))
            })
            .collect::<Result<Vec<_>>>()
    })?;

    if listing.is_empty() {
        println!("no items");
        return Ok(());
    }
    for (item, count) in listing {
        println!(
            "{}  [{}] {} ({} comments)",
            item.id, item.kind, item.title, count
        );
    }
    Ok(())
}
