// src/cli/sessions.rs — Inspect or delete sessions on the server

use super::SessionsAction;
use crate::client::cache::SessionCache;
use crate::client::remote::HttpRemote;
use crate::infra::config::Config;

pub async fn run(config: &Config, action: SessionsAction) -> anyhow::Result<()> {
    let token = config
        .sync
        .token
        .clone()
        .ok_or_else(|| anyhow::anyhow!("no [sync] token configured; add one to config.toml"))?;
    let remote = HttpRemote::new(&config.sync.remote_url, token);

    match action {
        SessionsAction::List => {
            let sessions = remote.list_sessions().await?;
            if sessions.is_empty() {
                eprintln!("No sessions yet.");
                return Ok(());
            }
            for s in sessions {
                println!(
                    "{}  {:>4} msgs  {}  {}",
                    s.id,
                    s.message_count,
                    s.updated_at.format("%Y-%m-%d %H:%M"),
                    s.title,
                );
            }
        }
        SessionsAction::Delete { id } => {
            remote.delete_session(&id).await?;
            // Drop the local mirror too
            if let Err(e) = SessionCache::at_default().delete(&id) {
                tracing::warn!("cache cleanup failed: {e}");
            }
            eprintln!("Deleted session {id}");
        }
    }
    Ok(())
}
