//! Environment layering for configuration. Kept in its own test binary
//! since it mutates process environment variables.

use std::env;
use std::path::PathBuf;

use evidence_vault::config::AppConfig;

#[test]
fn test_environment_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.toml");
    std::fs::write(
        &path,
        r#"
rpc_url = "http://10.0.0.5:8545"
vault_address = "0x00000000000000000000000000000000000000aa"
history_capacity = 8
search_roots = ["/srv/ignored"]
"#,
    )
    .unwrap();

    env::set_var("VAULT_HISTORY_CAPACITY", "32");
    env::set_var("VAULT_SEARCH_ROOTS", "/media/usb0:/mnt/evidence");
    env::set_var("VAULT_ADDRESS", "");

    let loaded = AppConfig::load_with_file(Some(&path));

    env::remove_var("VAULT_HISTORY_CAPACITY");
    env::remove_var("VAULT_SEARCH_ROOTS");
    env::remove_var("VAULT_ADDRESS");

    let config = loaded.unwrap();
    assert_eq!(config.history_capacity, 32);
    assert_eq!(
        config.search_roots,
        vec![PathBuf::from("/media/usb0"), PathBuf::from("/mnt/evidence")]
    );
    assert!(config.vault_reference().is_none());
    assert_eq!(config.rpc_url, "http://10.0.0.5:8545");

    // Without the variables the file wins again.
    let config = AppConfig::load_with_file(Some(&path)).unwrap();
    assert_eq!(config.history_capacity, 8);
    assert_eq!(
        config.vault_reference().map(|v| v.to_string()),
        Some("0x00000000000000000000000000000000000000aa".to_string())
    );
}
