use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use ftorrent_config::{ConfigError, MemoryMode, PersistenceKind, SettingsLoader};

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + Send + Sync + 'static {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn explicit_file_is_parsed_and_validated() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("settings.toml");
    fs::write(
        &path,
        r#"
        [network]
        listen_port = 51413
        download_limit_kbps = 800

        [storage]
        save_path = "/srv/torrents"
        persistence = "inline"

        [session]
        memory_mode = "eco"
        "#,
    )?;

    let settings = SettingsLoader::new()
        .with_path(&path)
        .with_env(env_of(&[]))
        .load()?;
    assert_eq!(settings.network.listen_port, 51413);
    assert_eq!(settings.network.download_limit_kbps, 800);
    assert_eq!(settings.storage.save_path, PathBuf::from("/srv/torrents"));
    assert_eq!(settings.storage.persistence, PersistenceKind::Inline);
    assert_eq!(settings.session.memory_mode, MemoryMode::Eco);
    Ok(())
}

#[test]
fn environment_overrides_win_over_the_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("settings.toml");
    fs::write(&path, "[network]\nlisten_port = 51413\n")?;

    let settings = SettingsLoader::new()
        .with_path(&path)
        .with_env(env_of(&[
            ("FTORRENT_LISTEN_PORT", "7000"),
            ("FTORRENT_SAVE_PATH", "/data/downloads"),
            ("FTORRENT_RESUME_DIR", "/data/resume"),
            ("FTORRENT_LOG_LEVEL", "debug"),
        ]))
        .load()?;
    assert_eq!(settings.network.listen_port, 7000);
    assert_eq!(settings.storage.save_path, PathBuf::from("/data/downloads"));
    assert_eq!(settings.storage.resume_dir, PathBuf::from("/data/resume"));
    assert_eq!(settings.logging.level, "debug");
    Ok(())
}

#[test]
fn config_path_can_come_from_the_environment() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("custom.toml");
    fs::write(&path, "[session]\ntick_interval_ms = 250\n")?;
    let path_text = path.to_string_lossy().into_owned();

    let loader =
        SettingsLoader::new().with_env(env_of(&[("FTORRENT_CONFIG", path_text.as_str())]));
    assert_eq!(loader.resolve_path(), Some((path, true)));
    assert_eq!(loader.load()?.session.tick_interval_ms, 250);
    Ok(())
}

#[test]
fn missing_explicit_file_is_an_error() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let result = SettingsLoader::new()
        .with_path(dir.path().join("absent.toml"))
        .with_env(env_of(&[]))
        .load();
    assert!(matches!(result, Err(ConfigError::Io { .. })));
    Ok(())
}

#[test]
fn malformed_documents_and_overrides_are_rejected() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("settings.toml");
    fs::write(&path, "[network\nlisten_port = ")?;
    let parsed = SettingsLoader::new()
        .with_path(&path)
        .with_env(env_of(&[]))
        .load();
    assert!(matches!(parsed, Err(ConfigError::Parse { .. })));

    fs::write(&path, "")?;
    let bad_port = SettingsLoader::new()
        .with_path(&path)
        .with_env(env_of(&[("FTORRENT_LISTEN_PORT", "seventy")]))
        .load();
    assert!(matches!(
        bad_port,
        Err(ConfigError::InvalidField { field: "listen_port", .. })
    ));

    let zero_port = SettingsLoader::new()
        .with_path(&path)
        .with_env(env_of(&[("FTORRENT_LISTEN_PORT", "0")]))
        .load();
    assert!(matches!(
        zero_port,
        Err(ConfigError::InvalidField { field: "listen_port", .. })
    ));
    Ok(())
}

#[test]
fn blank_overrides_are_ignored() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("settings.toml");
    fs::write(&path, "")?;
    let settings = SettingsLoader::new()
        .with_path(&path)
        .with_env(env_of(&[("FTORRENT_LOG_LEVEL", "  ")]))
        .load()?;
    assert_eq!(settings.logging.level, "info");
    Ok(())
}
