// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Bearer token handling shared by the gateway clients
//!
//! An [`AuthSession`] holds at most one current token. The token lives in
//! memory and is mirrored into a durable [`TokenStore`] so it survives a
//! restart; whenever the in-memory value is missing the store is consulted
//! (`auth_token` first, then the legacy `token` key).
//!
//! A 401 from any endpoint goes through [`AuthSession::handle_unauthorized`]:
//! the token is forgotten in memory and in the store, the session version is
//! bumped (clients clear their caches when they see a new version) and
//! [`AuthEvent::AuthRequired`] is broadcast to subscribers such as a login
//! prompt.

use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::broadcast;

use super::error::ClientError;
use crate::config::AuthConfig;

/// Capacity of the auth event channel
const EVENT_BUFFER: usize = 16;

/// Application-wide authentication notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// The gateway answered 401; a new login is needed
    AuthRequired,
    /// A new token was installed
    TokenChanged,
    /// The token was removed on request
    LoggedOut,
}

/// Durable key/value storage for credentials
pub trait TokenStore: Send + Sync + std::fmt::Debug {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ClientError>;
    fn remove(&self, key: &str) -> Result<(), ClientError>;
}

/// Volatile store, for tests and one-shot CLI runs
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
        Ok(())
    }
}

/// JSON file holding a flat object of string values
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>, ClientError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            ClientError::TokenStore(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&contents).map_err(|e| {
            ClientError::TokenStore(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }

    fn write_all(&self, values: &Map<String, Value>) -> Result<(), ClientError> {
        let json = serde_json::to_string_pretty(values)
            .map_err(|e| ClientError::TokenStore(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| {
            ClientError::TokenStore(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let values = self.read_all()?;
        Ok(values.get(key).and_then(Value::as_str).map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut values = self.read_all()?;
        values.insert(key.to_string(), Value::String(value.to_string()));
        self.write_all(&values)
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut values = self.read_all()?;
        if values.remove(key).is_some() {
            self.write_all(&values)?;
        }
        Ok(())
    }
}

/// Storage keys used by the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthKeys {
    pub token_key: String,
    pub legacy_token_key: String,
    pub user_key: String,
}

impl Default for AuthKeys {
    fn default() -> Self {
        Self {
            token_key: "auth_token".to_string(),
            legacy_token_key: "token".to_string(),
            user_key: "auth_user".to_string(),
        }
    }
}

impl From<&AuthConfig> for AuthKeys {
    fn from(config: &AuthConfig) -> Self {
        Self {
            token_key: config.token_key.clone(),
            legacy_token_key: config.legacy_token_key.clone(),
            user_key: config.user_key.clone(),
        }
    }
}

/// Tracks the session version a cache was filled under
#[derive(Debug, Clone)]
pub struct AuthWatch {
    seen: Arc<AtomicU64>,
}

impl AuthWatch {
    pub fn new(session: &AuthSession) -> Self {
        Self {
            seen: Arc::new(AtomicU64::new(session.version())),
        }
    }

    /// Whether the session changed since the previous call
    pub fn changed(&self, session: &AuthSession) -> bool {
        let current = session.version();
        self.seen.swap(current, Ordering::SeqCst) != current
    }
}

/// Current bearer token and auth notifications
#[derive(Debug)]
pub struct AuthSession {
    token: RwLock<Option<String>>,
    store: Arc<dyn TokenStore>,
    keys: AuthKeys,
    version: AtomicU64,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthSession {
    pub fn new(store: Arc<dyn TokenStore>, keys: AuthKeys) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            token: RwLock::new(None),
            store,
            keys,
            version: AtomicU64::new(0),
            events,
        }
    }

    /// Session persisted in the configured token file
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            Arc::new(FileTokenStore::new(&config.token_file)),
            AuthKeys::from(config),
        )
    }

    /// Session backed by a [`MemoryTokenStore`] with default keys
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()), AuthKeys::default())
    }

    /// Receive auth notifications from now on
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Counter bumped on every token change
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    fn emit(&self, event: AuthEvent) {
        self.version.fetch_add(1, Ordering::SeqCst);
        // No subscriber is not an error
        let _ = self.events.send(event);
    }

    fn set_memory(&self, value: Option<String>) {
        let mut token = self.token.write().unwrap_or_else(|e| e.into_inner());
        *token = value;
    }

    fn store_lookup(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!("Token store lookup for '{}' failed: {}", key, e);
                None
            }
        }
    }

    /// Token to attach to the next request
    ///
    /// Resolution order: in-memory value, durable `auth_token`, durable
    /// legacy `token`.
    pub fn current_token(&self) -> Option<String> {
        let in_memory = self
            .token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        in_memory
            .or_else(|| self.store_lookup(&self.keys.token_key))
            .or_else(|| self.store_lookup(&self.keys.legacy_token_key))
    }

    /// Install a token after a successful login
    ///
    /// # Arguments
    ///
    /// * `token` - Bearer token returned by the auth service
    /// * `user` - Optional user profile, stored alongside the token
    pub fn set_token(
        &self,
        token: impl Into<String>,
        user: Option<&Value>,
    ) -> Result<(), ClientError> {
        let token = token.into();
        self.store.set(&self.keys.token_key, &token)?;
        if let Some(user) = user {
            self.store.set(&self.keys.user_key, &user.to_string())?;
        }
        self.set_memory(Some(token));
        info!("Authentication token updated");
        self.emit(AuthEvent::TokenChanged);
        Ok(())
    }

    fn forget_everywhere(&self) {
        self.set_memory(None);
        for key in [
            &self.keys.token_key,
            &self.keys.legacy_token_key,
            &self.keys.user_key,
        ] {
            if let Err(e) = self.store.remove(key) {
                warn!("Failed to remove '{}' from token store: {}", key, e);
            }
        }
    }

    /// Explicit logout
    pub fn logout(&self) {
        self.forget_everywhere();
        info!("Logged out");
        self.emit(AuthEvent::LoggedOut);
    }

    /// React to an HTTP 401 from any endpoint
    pub fn handle_unauthorized(&self) {
        warn!("Gateway answered 401, clearing credentials");
        self.forget_everywhere();
        self.emit(AuthEvent::AuthRequired);
    }

    /// Whether any token is currently available
    pub fn is_authenticated(&self) -> bool {
        let present = self.current_token().is_some();
        debug!("Token present: {}", present);
        present
    }
}
