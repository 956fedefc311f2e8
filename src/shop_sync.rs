use crate::storage;
use miette::{IntoDiagnostic, Result};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Shop session definition from JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDefinition {
    /// Shop domain, e.g. demo.myshopify.com
    pub shop: String,
    /// Admin API access token
    pub access_token: String,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Root structure of the sessions JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsFile {
    pub sessions: Vec<SessionDefinition>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SyncResult {
    Created,
    Updated,
    Unchanged,
}

/// Sync shop sessions from a JSON file to the database (idempotent)
pub async fn sync_sessions_from_file(db: &DatabaseConnection, file_path: &Path) -> Result<()> {
    tracing::info!("Loading shop sessions from {}", file_path.display());

    let content = fs::read_to_string(file_path)
        .into_diagnostic()
        .map_err(|e| {
            miette::miette!(
                "Failed to read sessions file at '{}': {}",
                file_path.display(),
                e
            )
        })?;

    let sessions_file: SessionsFile = serde_json::from_str(&content)
        .into_diagnostic()
        .map_err(|e| {
            miette::miette!(
                "Failed to parse sessions JSON file: {}\n\nExpected format:\n{{\n  \"sessions\": [\n    {{\n      \"shop\": \"demo.myshopify.com\",\n      \"access_token\": \"shpat_...\",\n      \"scope\": \"read_products\"\n    }}\n  ]\n}}",
                e
            )
        })?;

    let mut created = 0;
    let mut updated = 0;
    let mut unchanged = 0;

    for definition in &sessions_file.sessions {
        match sync_session(db, definition).await? {
            SyncResult::Created => created += 1,
            SyncResult::Updated => updated += 1,
            SyncResult::Unchanged => unchanged += 1,
        }
    }

    tracing::info!(
        "Shop session sync complete: {} created, {} updated, {} unchanged",
        created,
        updated,
        unchanged
    );

    Ok(())
}

/// Sync a single shop session (idempotent)
pub async fn sync_session(
    db: &DatabaseConnection,
    definition: &SessionDefinition,
) -> Result<SyncResult> {
    let existing = storage::get_shop_session_by_shop(db, &definition.shop)
        .await
        .into_diagnostic()?;

    match existing {
        None => {
            let session = storage::create_shop_session(
                db,
                &definition.shop,
                &definition.access_token,
                definition.scope.clone(),
            )
            .await
            .into_diagnostic()?;
            tracing::info!(shop = %session.shop, session_id = %session.id, "Created shop session");
            Ok(SyncResult::Created)
        }
        Some(session)
            if session.access_token != definition.access_token
                || session.scope != definition.scope =>
        {
            storage::update_shop_session(
                db,
                &session.id,
                &definition.access_token,
                definition.scope.clone(),
            )
            .await
            .into_diagnostic()?;
            tracing::info!(shop = %session.shop, "Updated shop session");
            Ok(SyncResult::Updated)
        }
        Some(_) => Ok(SyncResult::Unchanged),
    }
}
