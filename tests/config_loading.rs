//! Tests for config file loading and saving

use course_union::config::{self, ApiConfig, CacheConfig, Config, PaginationConfig};
use std::io::Write;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_missing_config_points_to_init() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let err = config::load(Some(&path)).unwrap_err();

    assert!(err.to_string().contains("course-union --init"));
}

#[test]
fn test_full_config_loads() {
    let file = write_config(
        r#"
        [api]
        endpoint = "https://joanie.endpoint"
        token = "secret"

        [pagination]
        per_page = 3

        [cache]
        enabled = false
        ttl_secs = 5
        "#,
    );

    let config = config::load(Some(file.path())).unwrap();

    assert_eq!(config.api.endpoint, "https://joanie.endpoint");
    assert_eq!(config.api.token.as_deref(), Some("secret"));
    assert_eq!(config.pagination.per_page, 3);
    assert!(!config.cache.enabled);
    assert_eq!(config.cache.ttl_secs, 5);
}

#[test]
fn test_zero_per_page_is_rejected() {
    let file = write_config(
        r#"
        [api]
        endpoint = "https://joanie.endpoint"

        [pagination]
        per_page = 0
        "#,
    );

    let err = config::load(Some(file.path())).unwrap_err();

    assert!(err.to_string().contains("per_page"));
}

#[test]
fn test_missing_api_section_fails_to_parse() {
    let file = write_config("[pagination]\nper_page = 3\n");

    let err = config::load(Some(file.path())).unwrap_err();

    assert!(err.to_string().starts_with("Failed to parse config"));
}

#[test]
fn test_saved_config_is_private_and_loadable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let config = Config {
        api: ApiConfig {
            endpoint: "https://joanie.endpoint".to_string(),
            token: Some("secret".to_string()),
        },
        pagination: PaginationConfig { per_page: 4 },
        cache: CacheConfig::default(),
    };

    config::save(&config, &path).unwrap();
    let loaded = config::load(Some(&path)).unwrap();

    assert_eq!(loaded.pagination.per_page, 4);
    assert_eq!(loaded.api.token.as_deref(), Some("secret"));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
