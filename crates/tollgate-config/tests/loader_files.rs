//! File-backed loader tests.

use std::io::Write;
use tempfile::{Builder, NamedTempFile};
use tollgate_config::{ConfigError, ConfigLoader, LogFormat};

fn config_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_toml_file() {
    let file = config_file(
        ".toml",
        r#"
        [telemetry]
        service_name = "orders-gateway"

        [telemetry.logging]
        format = "pretty"

        [interceptors.basic_auth]
        username = "admin"
        password = "secret"

        [interceptors.monitor]
        platform = "shop"

        [[routes]]
        method = "get"
        path = "/orders/{id}"
        handler = "getOrder"
        bindings = { name = "getOrder", security = { auth = "BasicAuth" } }

        [[routes]]
        method = "use"
        path = "/"
        handler = "fallback"
        "#,
    );

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();

    assert_eq!(config.telemetry.service_name, "orders-gateway");
    assert_eq!(config.telemetry.logging.format, LogFormat::Pretty);
    assert_eq!(config.interceptors.monitor.unwrap().platform, "shop");
    assert_eq!(config.routes.len(), 2);
    assert_eq!(config.routes[0].bindings.auth_scheme(), Some("BasicAuth"));
    assert_eq!(config.routes[1].bindings.name(), None);
}

#[test]
fn test_json_file() {
    let file = config_file(
        ".json",
        r#"{
            "interceptors": {"access_log": {"enabled": false}},
            "routes": [{"method": "post", "path": "/orders", "handler": "createOrder",
                        "bindings": {"name": "createOrder"}}]
        }"#,
    );

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();

    assert!(!config.interceptors.access_log.enabled);
    assert_eq!(config.routes[0].method, "post");
    assert_eq!(config.routes[0].bindings.name(), Some("createOrder"));
}

#[test]
fn test_optional_file_present() {
    let file = config_file(".toml", "[telemetry]\nenvironment = \"staging\"\n");

    let config = ConfigLoader::new()
        .with_optional_file(file.path())
        .unwrap()
        .load()
        .unwrap();
    assert_eq!(config.telemetry.environment, "staging");
}

#[test]
fn test_unknown_extension_rejected() {
    let file = config_file(".yaml", "telemetry: {}\n");
    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}

#[test]
fn test_unknown_field_in_file_rejected() {
    let file = config_file(".toml", "[interceptors]\nrate_limit = true\n");
    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::TomlError(_))));
}

#[test]
fn test_malformed_json_rejected() {
    let file = config_file(".json", "{\"routes\": [");
    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::JsonError(_))));
}
