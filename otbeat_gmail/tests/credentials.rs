use otbeat_gmail::{ClientSecrets, GmailError, StoredToken, TokenCache};

#[test]
fn missing_credentials_file_is_reported_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("oauth.json");

    let err = ClientSecrets::load(&path).unwrap_err();
    assert!(matches!(err, GmailError::CredentialsNotFound(p) if p == path));
}

#[test]
fn malformed_credentials_file_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("oauth.json");
    std::fs::write(&path, "not json").unwrap();

    let err = ClientSecrets::load(&path).unwrap_err();
    assert!(matches!(err, GmailError::InvalidCredentials(msg) if msg.contains("oauth.json")));
}

#[test]
fn credentials_file_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("oauth.json");
    std::fs::write(
        &path,
        r#"{"installed": {"client_id": "id", "client_secret": "s", "redirect_uris": ["http://localhost"]}}"#,
    )
    .unwrap();

    let secrets = ClientSecrets::load(&path).unwrap();
    assert_eq!(secrets.client_id, "id");
    assert_eq!(secrets.redirect_uri(), "http://localhost");
}

#[test]
fn cached_token_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let cache = TokenCache::new(dir.path().join("token.json"));
    let token = StoredToken {
        access_token: "ya29.cached".to_string(),
        token_type: "Bearer".to_string(),
        refresh_token: None,
        expiry: None,
    };

    cache.save(&token).unwrap();
    let reloaded = TokenCache::new(dir.path().join("token.json")).load().unwrap();
    assert_eq!(reloaded, Some(token));
}
