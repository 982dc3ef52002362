// tests/config_load.rs
use news_digest::config::{AppConfig, ENV_CONFIG_PATH};
use std::{env, fs};

const VARS: &[&str] = &[
    ENV_CONFIG_PATH,
    "JWT_SECRET",
    "CACHE_ENABLED",
    "CACHE_URL",
    "REDIS_URL",
    "FEED_CACHE_TTL_SECS",
    "NEWS_API_KEY",
    "GEMINI_API_KEY",
    "OPENAI_API_KEY",
    "DATABASE_URL",
];

fn clear_env() {
    for v in VARS {
        env::remove_var(v);
    }
}

#[serial_test::serial]
#[test]
fn missing_jwt_secret_is_an_error() {
    clear_env();
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    let err = AppConfig::load().unwrap_err();
    assert!(err.to_string().contains("JWT_SECRET"));

    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn env_overrides_file_values() {
    clear_env();
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("app.toml");
    fs::write(
        &path,
        r#"
jwt_secret = "from-file"

[cache]
enabled = false
url = "redis://file:6379"
ttl_secs = 120

[ai]
openai_api_key = ""
"#,
    )
    .unwrap();

    env::set_var(ENV_CONFIG_PATH, path.display().to_string());
    env::set_var("CACHE_ENABLED", "true");
    env::set_var("REDIS_URL", "redis://env:6379");
    env::set_var("GEMINI_API_KEY", "g-key");

    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg.jwt_secret, "from-file");
    assert!(cfg.cache.enabled);
    assert_eq!(cfg.cache.url.as_deref(), Some("redis://env:6379"));
    assert_eq!(cfg.cache.ttl_secs, 120);
    assert!(cfg.cache_active());
    assert_eq!(cfg.ai.gemini_api_key.as_deref(), Some("g-key"));
    assert!(cfg.ai.openai_api_key.is_none(), "blank key means unconfigured");

    clear_env();
}

#[serial_test::serial]
#[test]
fn explicit_path_must_exist() {
    clear_env();
    env::set_var(ENV_CONFIG_PATH, "/definitely/not/here/app.toml");
    env::set_var("JWT_SECRET", "x");
    assert!(AppConfig::load().is_err());
    clear_env();
}

#[serial_test::serial]
#[test]
fn defaults_apply_without_file() {
    clear_env();
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::set_var("JWT_SECRET", "s");
    env::set_var("FEED_CACHE_TTL_SECS", "0");

    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg.cache.ttl_secs, 3600, "zero TTL falls back to one hour");
    assert!(!cfg.cache_active());

    env::set_current_dir(&old).unwrap();
    clear_env();
}
