use category_tree_core::{load_config, ConfigError, OrganizerConfig};
use std::io::Write;
use std::path::PathBuf;

#[test]
fn load_config_reads_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let log_dir = dir.path().join("logs");
    let path = dir.path().join("organizer.json");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(
        file,
        r#"{{"database_path": "categories.db", "log_level": "WARN", "log_dir": {}}}"#,
        serde_json::to_string(log_dir.to_str().unwrap()).unwrap()
    )
    .unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(
        config,
        OrganizerConfig {
            database_path: Some(PathBuf::from("categories.db")),
            log_level: "WARN".to_string(),
            log_dir: Some(log_dir.to_str().unwrap().to_string()),
        }
    );
}

#[test]
fn load_config_reports_missing_file_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.json");

    let err = load_config(&missing).unwrap_err();
    assert!(matches!(&err, ConfigError::Io { path, .. } if *path == missing));
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn load_config_rejects_malformed_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ \"log_level\": ").unwrap();

    assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
}
