use anyhow::{bail, Context, Result};
use scylla::client::session::Session;

/// Create the keyspace and tables if they are missing, then switch the
/// session to the keyspace.
pub async fn ensure_schema(session: &Session, keyspace: &str, replication_factor: u32) -> Result<()> {
    validate_identifier(keyspace)?;

    session
        .query_unpaged(
            format!(
                "CREATE KEYSPACE IF NOT EXISTS {} WITH REPLICATION = \
                 {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
                keyspace, replication_factor
            ),
            (),
        )
        .await
        .with_context(|| format!("Creating keyspace {}", keyspace))?;

    session
        .use_keyspace(keyspace, false)
        .await
        .with_context(|| format!("Switching to keyspace {}", keyspace))?;

    for ddl in TABLES {
        session
            .query_unpaged(*ddl, ())
            .await
            .context("Creating table")?;
    }

    tracing::info!(keyspace, "Schema ready");
    Ok(())
}

const TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS orders (
        id uuid PRIMARY KEY,
        user_id uuid,
        items text,
        status text,
        total_price text,
        postal_address text,
        created_at timestamp,
        version bigint
    )",
    "CREATE TABLE IF NOT EXISTS items (
        id uuid PRIMARY KEY,
        name text,
        description text,
        price text,
        availability text
    )",
];

/// Keyspace names are interpolated into DDL, so only plain identifiers pass.
fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());

    if !starts_with_letter
        || name.len() > 48
        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        bail!("Invalid keyspace name: {:?}", name);
    }
    Ok(())
}
