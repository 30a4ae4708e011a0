//! Configuration loading tests: TOML files, env overrides, and descriptor
//! construction from resolved parameters.

use std::env;
use std::io::Write;

use oxidesc::config::{ConfigError, OxidescConfig};
use oxidesc::Mode;

#[test]
fn load_from_toml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        [descriptor]
        max_key_chars = 16
        entry_count = 8
        entry_buffer_len = 8192
        mode = "update"
        "#
    )
    .unwrap();

    let config = OxidescConfig::load_from_path(file.path()).unwrap();
    let params = config.descriptor_params().unwrap();
    assert_eq!(params.max_key_chars, 16);
    assert_eq!(params.entry_count, 8);
    assert_eq!(params.entry_buffer_len, 8192);
    assert_eq!(params.mode, Mode::Update);

    let desc = params.build().unwrap();
    assert_eq!(desc.entry_count(), 8);
    assert_eq!(desc.max_key_encoded_len(), 32);
}

#[test]
fn missing_file_is_an_io_error() {
    let err = OxidescConfig::load_from_path("/nonexistent/oxidesc.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

// All env mutation lives in this one test; parallel test threads share the
// process environment.
#[test]
fn env_overrides_and_unknown_keys() {
    env::set_var("OXIDESC__DESCRIPTOR__ENTRY_COUNT", "9");
    env::set_var("OXIDESC__DESCRIPTOR__MODE", "fetch");
    let mut config: OxidescConfig = toml::from_str(
        r#"
        [descriptor]
        max_key_chars = 4
        entry_count = 2
        entry_buffer_len = 64
        mode = "update"
        "#,
    )
    .unwrap();
    config.apply_env_overrides().unwrap();
    let params = config.descriptor_params().unwrap();
    assert_eq!(params.entry_count, 9);
    assert_eq!(params.mode, Mode::Fetch);
    env::remove_var("OXIDESC__DESCRIPTOR__ENTRY_COUNT");
    env::remove_var("OXIDESC__DESCRIPTOR__MODE");

    env::set_var("OXIDESC__DESCRIPTOR__ENTRY_COUNT", "not-a-number");
    let mut config = OxidescConfig::default();
    assert!(matches!(
        config.apply_env_overrides().unwrap_err(),
        ConfigError::InvalidValue { .. }
    ));
    env::remove_var("OXIDESC__DESCRIPTOR__ENTRY_COUNT");

    env::set_var("OXIDESC__NOPE__FIELD", "1");
    let mut config = OxidescConfig::default();
    assert!(matches!(
        config.apply_env_overrides().unwrap_err(),
        ConfigError::UnknownKey(_)
    ));
    env::remove_var("OXIDESC__NOPE__FIELD");
}
