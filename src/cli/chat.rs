// src/cli/chat.rs — Interactive REPL
//
// The chat loop holds the conversation optimistically: user turns go into
// the local list immediately, assistant turns once their stream finishes.
// After every exchange the conversation is written to the local cache and
// the unsent suffix is pushed to the ledger. A failed sync only prints a
// notice; the watermark stays put and the next exchange retries.

use std::io::Write as _;
use std::sync::Arc;

use futures::StreamExt;

use crate::client::cache::{CacheEntry, SessionCache};
use crate::client::remote::HttpRemote;
use crate::client::sync::{SyncAgent, SyncOutcome};
use crate::client::LocalMessage;
use crate::completion::openai_compat::OpenAICompatProvider;
use crate::completion::{CompletionProvider, Turn};
use crate::infra::config::Config;
use crate::infra::paths;
use crate::ledger::{Message, Session};

pub async fn run_chat(config: &Config, resume: Option<&str>) -> anyhow::Result<()> {
    paths::ensure_dirs().await?;

    let token = config
        .sync
        .token
        .clone()
        .ok_or_else(|| anyhow::anyhow!("no [sync] token configured; add one to config.toml"))?;
    let remote = Arc::new(HttpRemote::new(&config.sync.remote_url, token));
    let provider = OpenAICompatProvider::from_config(&config.completion)?;
    let cache = SessionCache::at_default();

    let (mut session, mut local) = match resume {
        Some(id) => load_session(&remote, id).await?,
        None => (remote.create_session(None).await?, Vec::new()),
    };

    let mut agent = SyncAgent::new(remote.clone());
    agent.activate(&session.id);

    eprintln!(
        "wayfarer v{} | {} | session {}\n",
        env!("CARGO_PKG_VERSION"),
        config.completion.model,
        session.id,
    );

    while let Some(input) = read_input() {
        let trimmed = input.trim();

        if trimmed == "quit" || trimmed == "exit" || trimmed == "/quit" {
            break;
        }

        if trimmed.starts_with('/') {
            handle_slash_command(
                trimmed,
                &remote,
                &mut agent,
                &mut session,
                &mut local,
            )
            .await;
            continue;
        }

        if trimmed.is_empty() {
            continue;
        }

        local.push(LocalMessage::user(trimmed));

        // The assistant turn is only recorded once its stream finishes;
        // a drop mid-stream loses that one turn.
        match stream_reply(&provider, &local).await {
            Ok(Some(reply)) => local.push(LocalMessage::assistant(reply)),
            Ok(None) => {}
            Err(e) => eprintln!("[completion] {e}"),
        }

        if let Err(e) = cache.save(CacheEntry {
            session: session.clone(),
            messages: local.clone(),
        }) {
            tracing::warn!("cache save failed: {e}");
        }

        match agent.sync(&session, &local).await {
            Ok(SyncOutcome::Synced {
                saved_count,
                total_count,
                applied_title,
                ..
            }) => {
                if let Some(title) = applied_title {
                    session.title = title;
                }
                tracing::debug!("synced: {saved_count} new, {total_count} total");
            }
            Ok(SyncOutcome::NothingToSend) => {}
            Err(e) => eprintln!("[sync] {e} (will retry next turn)"),
        }
    }

    eprintln!("\n{} message(s) in session '{}'", local.len(), session.title);
    Ok(())
}

/// Stream one completion to stdout, returning the full reply text once
/// the stream completes, or None when it errors out partway.
async fn stream_reply(
    provider: &OpenAICompatProvider,
    local: &[LocalMessage],
) -> anyhow::Result<Option<String>> {
    let turns: Vec<Turn> = local
        .iter()
        .map(|m| Turn {
            role: m.role,
            content: m.content.clone(),
        })
        .collect();

    let mut stream = provider.complete_stream(&turns).await?;

    let mut reply = String::new();
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(delta) => {
                print!("{delta}");
                std::io::stdout().flush().ok();
                reply.push_str(&delta);
            }
            Err(e) => {
                println!();
                eprintln!("[completion] stream interrupted: {e}");
                return Ok(None);
            }
        }
    }
    println!();

    if reply.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(reply))
}

/// Fetch an existing session and its confirmed messages from the server.
async fn load_session(
    remote: &HttpRemote,
    id: &str,
) -> anyhow::Result<(Session, Vec<LocalMessage>)> {
    let session = remote
        .list_sessions()
        .await?
        .into_iter()
        .find(|s| s.id == id)
        .ok_or_else(|| anyhow::anyhow!("session '{id}' not found"))?;

    let messages = remote.read_messages(id).await?;
    Ok((session, local_from_remote(messages)))
}

fn local_from_remote(messages: Vec<Message>) -> Vec<LocalMessage> {
    messages
        .into_iter()
        .map(|m| LocalMessage {
            id: m.id,
            role: m.role,
            content: m.content,
            timestamp: m.timestamp,
        })
        .collect()
}

fn read_input() -> Option<String> {
    use std::io::{self, BufRead, Write};

    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();
    let mut line = String::new();
    match stdin.lock().read_line(&mut line) {
        Ok(0) => None, // EOF
        Ok(_) => Some(line),
        Err(_) => None,
    }
}

async fn handle_slash_command(
    input: &str,
    remote: &Arc<HttpRemote>,
    agent: &mut SyncAgent,
    session: &mut Session,
    local: &mut Vec<LocalMessage>,
) {
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/sessions" => match remote.list_sessions().await {
            Ok(sessions) => {
                for s in &sessions {
                    let marker = if s.id == session.id { " *" } else { "" };
                    eprintln!("  {}  {:>3} msgs  {}{}", s.id, s.message_count, s.title, marker);
                }
            }
            Err(e) => eprintln!("  [error] {e}"),
        },

        "/switch" => {
            if arg.is_empty() {
                eprintln!("  Usage: /switch <session-id>");
                return;
            }
            match load_session(remote, arg).await {
                Ok((new_session, new_local)) => {
                    // A fresh watermark for the new context; the ledger's
                    // dedup reduces any resent history to zero survivors.
                    agent.activate(&new_session.id);
                    eprintln!("  Switched to '{}'", new_session.title);
                    *session = new_session;
                    *local = new_local;
                }
                Err(e) => eprintln!("  [error] {e}"),
            }
        }

        "/status" => {
            eprintln!("  Session: {} ({})", session.title, session.id);
            eprintln!(
                "  Local messages: {} | watermark: {}",
                local.len(),
                agent.watermark(&session.id)
            );
        }

        "/help" => {
            eprintln!("Slash commands:");
            eprintln!("  /sessions          List sessions on the server");
            eprintln!("  /switch <id>       Switch to another session");
            eprintln!("  /status            Show session & sync state");
            eprintln!("  /help              Show this help");
            eprintln!("  /quit, quit, exit  End session");
        }

        _ => {
            eprintln!("Unknown command: {cmd}. Type /help for commands.");
        }
    }
}
