//! Client-side half of the login: remembering the session token and handing
//! it to the wallet.
//!
//! The wallet SDK and the storage backend are both injected. [`WalletSession`]
//! only decides when to connect, when to persist, and when to forget.

use crate::transport::ConsumedSession;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("Session store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Session store holds invalid data: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("Session store lock poisoned")]
    Poisoned,
}

/// Where a connected session's token survives between page loads.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, SessionStoreError>;
    fn save(&self, token: &str) -> Result<(), SessionStoreError>;
    fn clear(&self) -> Result<(), SessionStoreError>;
}

#[derive(Default)]
pub struct MemorySessionStore {
    token: Mutex<Option<String>>,
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<String>, SessionStoreError> {
        Ok(self
            .token
            .lock()
            .map_err(|_| SessionStoreError::Poisoned)?
            .clone())
    }

    fn save(&self, token: &str) -> Result<(), SessionStoreError> {
        *self.token.lock().map_err(|_| SessionStoreError::Poisoned)? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        *self.token.lock().map_err(|_| SessionStoreError::Poisoned)? = None;
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct StoredSession {
    connected: bool,
    token: String,
}

/// JSON file backed store for native clients.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<String>, SessionStoreError> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredSession = serde_json::from_slice(&raw)?;
        Ok(stored.connected.then_some(stored.token))
    }

    fn save(&self, token: &str) -> Result<(), SessionStoreError> {
        let stored = StoredSession {
            connected: true,
            token: token.to_string(),
        };
        std::fs::write(&self.path, serde_json::to_vec(&stored)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletAccount {
    pub address: String,
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Wallet rejected the session token: {0}")]
    Rejected(String),
    #[error("Wallet unavailable: {0}")]
    Unavailable(String),
}

/// The wallet SDK's JWT login strategy, seen from this crate.
pub trait WalletConnector: Send + Sync {
    fn connect(&self, token: &str) -> impl Future<Output = Result<WalletAccount, WalletError>> + Send;
    fn disconnect(&self, account: &WalletAccount) -> impl Future<Output = Result<(), WalletError>> + Send;
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error(transparent)]
    Store(#[from] SessionStoreError),
    #[error("Authentication failed: {0}")]
    AuthFailed(String),
    #[error("No active wallet to disconnect")]
    NotConnected,
}

pub struct WalletSession<S, C> {
    store: S,
    connector: C,
    account: Option<WalletAccount>,
}

impl<S: SessionStore, C: WalletConnector> WalletSession<S, C> {
    pub fn new(store: S, connector: C) -> Self {
        Self {
            store,
            connector,
            account: None,
        }
    }

    pub fn account(&self) -> Option<&WalletAccount> {
        self.account.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Page-load entry point: a freshly delivered token wins, then a delivered
    /// error, then whatever the store remembers.
    pub async fn initialize(
        &mut self,
        delivered: ConsumedSession,
    ) -> Result<Option<WalletAccount>, SessionError> {
        if let Some(token) = delivered.token {
            return self.connect_with(&token).await.map(Some);
        }
        if let Some(error) = delivered.error {
            return Err(SessionError::AuthFailed(error));
        }
        self.resume().await
    }

    /// Connect with `token`; remember it on success, forget everything on failure.
    pub async fn connect_with(&mut self, token: &str) -> Result<WalletAccount, SessionError> {
        match self.connector.connect(token).await {
            Ok(account) => {
                self.store.save(token)?;
                self.account = Some(account.clone());
                Ok(account)
            }
            Err(e) => {
                tracing::warn!(error = %e, "wallet connect failed, clearing stored session");
                self.account = None;
                self.store.clear()?;
                Err(e.into())
            }
        }
    }

    /// Reconnect from the stored token, if any.
    pub async fn resume(&mut self) -> Result<Option<WalletAccount>, SessionError> {
        match self.store.load()? {
            Some(token) => self.connect_with(&token).await.map(Some),
            None => Ok(None),
        }
    }

    /// Disconnect the active wallet. The stored token is dropped either way.
    pub async fn disconnect(&mut self) -> Result<(), SessionError> {
        let account = self.account.take();
        self.store.clear()?;
        match account {
            Some(account) => Ok(self.connector.disconnect(&account).await?),
            None => Err(SessionError::NotConnected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeWallet {
        accept: bool,
        connects: AtomicUsize,
    }

    impl WalletConnector for FakeWallet {
        async fn connect(&self, token: &str) -> Result<WalletAccount, WalletError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            if self.accept {
                Ok(WalletAccount {
                    address: format!("0x{}", token.len()),
                })
            } else {
                Err(WalletError::Rejected("bad jwt".into()))
            }
        }

        async fn disconnect(&self, _account: &WalletAccount) -> Result<(), WalletError> {
            Ok(())
        }
    }

    fn accepting() -> FakeWallet {
        FakeWallet {
            accept: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn delivered_token_connects_and_is_saved() {
        let mut session = WalletSession::new(MemorySessionStore::default(), accepting());
        let account = session
            .initialize(ConsumedSession {
                token: Some("a.b.c".into()),
                error: None,
            })
            .await
            .unwrap();

        assert!(account.is_some());
        assert!(session.is_connected());
        assert_eq!(session.store().load().unwrap().as_deref(), Some("a.b.c"));
    }

    #[tokio::test]
    async fn rejected_token_clears_store() {
        let store = MemorySessionStore::default();
        store.save("stale").unwrap();
        let mut session = WalletSession::new(store, FakeWallet::default());

        let err = session.resume().await.unwrap_err();
        assert!(matches!(err, SessionError::Wallet(WalletError::Rejected(_))));
        assert!(!session.is_connected());
        assert_eq!(session.store().load().unwrap(), None);
    }

    #[tokio::test]
    async fn delivered_error_is_reported_without_connecting() {
        let mut session = WalletSession::new(MemorySessionStore::default(), accepting());
        let err = session
            .initialize(ConsumedSession {
                token: None,
                error: Some("auth_failed".into()),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::AuthFailed(reason) if reason == "auth_failed"));
        assert_eq!(session.connector.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_page_load_resumes_from_store() {
        let store = MemorySessionStore::default();
        store.save("remembered").unwrap();
        let mut session = WalletSession::new(store, accepting());

        let account = session.initialize(ConsumedSession::default()).await.unwrap();
        assert_eq!(account.map(|a| a.address), Some("0x10".to_string()));
    }

    #[tokio::test]
    async fn disconnect_clears_store_even_when_not_connected() {
        let store = MemorySessionStore::default();
        store.save("orphan").unwrap();
        let mut session = WalletSession::new(store, accepting());

        assert!(matches!(
            session.disconnect().await,
            Err(SessionError::NotConnected)
        ));
        assert_eq!(session.store().load().unwrap(), None);
    }

    #[test]
    fn file_store_round_trips_and_clears() {
        let path = std::env::temp_dir().join(format!(
            "wallet-session-{}-{}.json",
            std::process::id(),
            line!()
        ));
        let store = FileSessionStore::new(&path);

        assert_eq!(store.load().unwrap(), None);
        store.save("x.y.z").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("x.y.z"));
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
