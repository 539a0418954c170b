// src/ledger/store_server.rs — Async message passing for Store
//
// The Store owns a single SQLite connection and runs on a dedicated task;
// async callers go through StoreHandle. Commands are processed one at a
// time, which is what makes an append (dedup + insert + metadata update)
// atomic with respect to every other ledger operation.

use tokio::sync::{mpsc, oneshot};

use super::store::Store;
use super::{AppendOutcome, Message, MessageDraft, Session};
use crate::infra::errors::WayfarerError;

#[derive(Debug)]
pub enum StoreCommand {
    CreateSession {
        owner_id: String,
        title: Option<String>,
        resp: oneshot::Sender<Result<Session, WayfarerError>>,
    },
    ListSessions {
        owner_id: String,
        resp: oneshot::Sender<Result<Vec<Session>, WayfarerError>>,
    },
    GetSession {
        id: String,
        owner_id: String,
        resp: oneshot::Sender<Result<Session, WayfarerError>>,
    },
    DeleteSession {
        id: String,
        owner_id: String,
        resp: oneshot::Sender<Result<(), WayfarerError>>,
    },
    AppendMessages {
        session_id: String,
        requester_id: String,
        candidates: Vec<MessageDraft>,
        title_hint: Option<String>,
        resp: oneshot::Sender<Result<AppendOutcome, WayfarerError>>,
    },
    ReadMessages {
        session_id: String,
        requester_id: String,
        resp: oneshot::Sender<Result<Vec<Message>, WayfarerError>>,
    },
}

/// A handle to the Store that uses message passing.
#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::Sender<StoreCommand>,
}

fn ledger_gone() -> WayfarerError {
    WayfarerError::Other(anyhow::anyhow!("ledger task stopped"))
}

impl StoreHandle {
    pub fn new(tx: mpsc::Sender<StoreCommand>) -> Self {
        Self { tx }
    }

    pub async fn create_session(
        &self,
        owner_id: String,
        title: Option<String>,
    ) -> Result<Session, WayfarerError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::CreateSession {
                owner_id,
                title,
                resp: resp_tx,
            })
            .await
            .map_err(|_| ledger_gone())?;
        resp_rx.await.map_err(|_| ledger_gone())?
    }

    pub async fn list_sessions(&self, owner_id: String) -> Result<Vec<Session>, WayfarerError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::ListSessions {
                owner_id,
                resp: resp_tx,
            })
            .await
            .map_err(|_| ledger_gone())?;
        resp_rx.await.map_err(|_| ledger_gone())?
    }

    pub async fn get_session(
        &self,
        id: String,
        owner_id: String,
    ) -> Result<Session, WayfarerError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::GetSession {
                id,
                owner_id,
                resp: resp_tx,
            })
            .await
            .map_err(|_| ledger_gone())?;
        resp_rx.await.map_err(|_| ledger_gone())?
    }

    pub async fn delete_session(&self, id: String, owner_id: String) -> Result<(), WayfarerError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::DeleteSession {
                id,
                owner_id,
                resp: resp_tx,
            })
            .await
            .map_err(|_| ledger_gone())?;
        resp_rx.await.map_err(|_| ledger_gone())?
    }

    pub async fn append_messages(
        &self,
        session_id: String,
        requester_id: String,
        candidates: Vec<MessageDraft>,
        title_hint: Option<String>,
    ) -> Result<AppendOutcome, WayfarerError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::AppendMessages {
                session_id,
                requester_id,
                candidates,
                title_hint,
                resp: resp_tx,
            })
            .await
            .map_err(|_| ledger_gone())?;
        resp_rx.await.map_err(|_| ledger_gone())?
    }

    pub async fn read_messages(
        &self,
        session_id: String,
        requester_id: String,
    ) -> Result<Vec<Message>, WayfarerError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::ReadMessages {
                session_id,
                requester_id,
                resp: resp_tx,
            })
            .await
            .map_err(|_| ledger_gone())?;
        resp_rx.await.map_err(|_| ledger_gone())?
    }
}

/// Helper to spawn the store server and return a handle.
pub fn spawn_store_server(store: Store) -> (StoreHandle, tokio::task::JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(100);
    let handle = StoreHandle::new(tx);
    let join_handle = tokio::spawn(run_store_server(store, rx));
    (handle, join_handle)
}

/// The background task that owns the Store.
pub async fn run_store_server(store: Store, mut rx: mpsc::Receiver<StoreCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            StoreCommand::CreateSession {
                owner_id,
                title,
                resp,
            } => {
                let res = store.create_session(&owner_id, title.as_deref());
                let _ = resp.send(res);
            }
            StoreCommand::ListSessions { owner_id, resp } => {
                let res = store.list_sessions(&owner_id);
                let _ = resp.send(res);
            }
            StoreCommand::GetSession {
                id,
                owner_id,
                resp,
            } => {
                let res = store.get_session(&id, &owner_id);
                let _ = resp.send(res);
            }
            StoreCommand::DeleteSession {
                id,
                owner_id,
                resp,
            } => {
                let res = store.delete_session(&id, &owner_id);
                let _ = resp.send(res);
            }
            StoreCommand::AppendMessages {
                session_id,
                requester_id,
                candidates,
                title_hint,
                resp,
            } => {
                let res = store.append_messages(
                    &session_id,
                    &requester_id,
                    &candidates,
                    title_hint.as_deref(),
                );
                let _ = resp.send(res);
            }
            StoreCommand::ReadMessages {
                session_id,
                requester_id,
                resp,
            } => {
                let res = store.read_messages(&session_id, &requester_id);
                let _ = resp.send(res);
            }
        }
    }
}
