// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use hgu_opc_client::client::{
    AuthEvent, AuthKeys, AuthSession, ClientError, FileTokenStore, TokenStore,
};
use hgu_opc_client::config::AuthConfig;
use mockall::predicate::eq;
use mockall::{mock, Sequence};
use std::sync::Arc;
use tempfile::tempdir;

mock! {
    pub Store {}

    impl TokenStore for Store {
        fn get(&self, key: &str) -> Result<Option<String>, ClientError>;
        fn set(&self, key: &str, value: &str) -> Result<(), ClientError>;
        fn remove(&self, key: &str) -> Result<(), ClientError>;
    }
}

impl std::fmt::Debug for MockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MockStore")
    }
}

#[test]
fn test_unreadable_primary_key_falls_back_to_legacy() {
    let mut store = MockStore::new();
    let mut seq = Sequence::new();
    store
        .expect_get()
        .with(eq("auth_token"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Err(ClientError::TokenStore("corrupt file".to_string())));
    store
        .expect_get()
        .with(eq("token"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(Some("legacy-token".to_string())));

    let session = AuthSession::new(Arc::new(store), AuthKeys::default());
    assert_eq!(session.current_token().as_deref(), Some("legacy-token"));
}

#[test]
fn test_in_memory_token_skips_store() {
    let mut store = MockStore::new();
    store
        .expect_set()
        .with(eq("auth_token"), eq("fresh"))
        .times(1)
        .returning(|_, _| Ok(()));
    store.expect_get().never();

    let session = AuthSession::new(Arc::new(store), AuthKeys::default());
    session.set_token("fresh", None).unwrap();
    assert_eq!(session.current_token().as_deref(), Some("fresh"));
    assert_eq!(session.current_token().as_deref(), Some("fresh"));
}

#[test]
fn test_unauthorized_removes_every_credential_key() {
    let mut store = MockStore::new();
    for key in ["auth_token", "token", "auth_user"] {
        store
            .expect_remove()
            .with(eq(key))
            .times(1)
            .returning(|_| Ok(()));
    }
    store.expect_get().returning(|_| Ok(None));

    let session = AuthSession::new(Arc::new(store), AuthKeys::default());
    let mut events = session.subscribe();
    session.handle_unauthorized();

    assert_eq!(events.try_recv().unwrap(), AuthEvent::AuthRequired);
    assert!(!session.is_authenticated());
}

#[test]
fn test_failed_persist_leaves_session_unchanged() {
    let mut store = MockStore::new();
    store
        .expect_set()
        .returning(|_, _| Err(ClientError::TokenStore("read-only filesystem".to_string())));
    store.expect_get().returning(|_| Ok(None));

    let session = AuthSession::new(Arc::new(store), AuthKeys::default());
    let before = session.version();
    let err = session.set_token("abc", None).unwrap_err();

    assert!(matches!(err, ClientError::TokenStore(_)));
    assert_eq!(session.current_token(), None);
    assert_eq!(session.version(), before);
}

#[test]
fn test_custom_keys_from_config() {
    let dir = tempdir().unwrap();
    let config = AuthConfig {
        token_file: dir.path().join("credentials.json"),
        token_key: "hgu_token".to_string(),
        legacy_token_key: "old_token".to_string(),
        user_key: "hgu_user".to_string(),
    };

    let store = FileTokenStore::new(&config.token_file);
    store.set("old_token", "from-old-ui").unwrap();

    let session = AuthSession::from_config(&config);
    assert_eq!(session.current_token().as_deref(), Some("from-old-ui"));

    session
        .set_token("new", Some(&serde_json::json!({"username": "operator", "role": "admin"})))
        .unwrap();
    let contents = std::fs::read_to_string(&config.token_file).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(stored["hgu_token"], "new");
    assert!(stored["hgu_user"].as_str().unwrap().contains("operator"));

    session.logout();
    let contents = std::fs::read_to_string(&config.token_file).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(stored, serde_json::json!({}));
}

#[test]
fn test_file_store_rejects_corrupt_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("auth.json");
    std::fs::write(&path, "not json").unwrap();

    let store = FileTokenStore::new(&path);
    assert!(matches!(store.get("auth_token"), Err(ClientError::TokenStore(_))));

    // A session treats an unreadable store as "no token"
    let session = AuthSession::new(Arc::new(FileTokenStore::new(&path)), AuthKeys::default());
    assert_eq!(session.current_token(), None);
}
