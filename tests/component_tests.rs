//! Component loading against the tree in `tests/components/`

use component_translator::{ComponentRequest, ComponentStore, ErrorKind, LoadError, LoaderConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn components_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("components")
}

fn store() -> ComponentStore {
    ComponentStore::new(LoaderConfig::new(components_dir())).unwrap()
}

#[test]
fn test_loads_all_parts() {
    let card = store().load("card").unwrap().unwrap();

    assert_eq!(card.markup, "<div class=\"card\"><slot></slot></div>\n");
    assert_eq!(card.style.as_deref(), Some(".card { border: 1px solid; }\n"));

    let script = card.script.as_ref().unwrap();
    assert!(script.class_body.starts_with("connectedCallback() {"));
    assert!(script.class_body.contains("this.style.boxShadow = `0 ${newValue}px 4px`;"));
    assert_eq!(script.observed_attributes, vec!["elevation"]);
    assert_eq!(script.load_handler.as_deref(), Some("console.debug(\"card ready\");"));
}

#[test]
fn test_optional_parts_absent() {
    let plain = store().load("plain").unwrap().unwrap();
    assert_eq!(plain.markup, "<p>plain</p>\n");
    assert_eq!(plain.style, None);
    assert_eq!(plain.script, None);
}

#[test]
fn test_empty_markup_means_no_component() {
    assert!(store().load("blank").unwrap().is_none());
    assert!(store().load("missing").unwrap().is_none());
}

#[test]
fn test_translation_failure_names_component() {
    let err = store().load("broken").unwrap_err();
    match &err {
        LoadError::Translate { component, error } => {
            assert_eq!(component, "broken");
            assert_eq!(error.kind, ErrorKind::MalformedBlock);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.render(false).contains("_broken.js:1:"));
}

#[test]
fn test_loads_are_cached() {
    let store = store();
    let first = store.load("card").unwrap().unwrap();
    let second = store.load("card").unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_resolve_request() {
    let request = ComponentRequest::new(["card", " Card ", "card", "plain", "missing", "broken", "../card"]);
    let resolved = store().resolve(&request).unwrap();

    let names: Vec<&str> = resolved.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["card", "plain"]);
}

#[test]
fn test_resolve_drops_long_names() {
    let mut config = LoaderConfig::new(components_dir());
    config.max_tag_name_length = 4;
    let store = ComponentStore::new(config).unwrap();

    let resolved = store.resolve(&ComponentRequest::new(["card", "plain"])).unwrap();
    assert_eq!(resolved.keys().collect::<Vec<_>>(), vec!["card"]);
}

#[test]
fn test_resolve_empty_request() {
    assert!(store().resolve(&ComponentRequest::default()).is_none());
}

#[test]
fn test_request_from_json() {
    let request: ComponentRequest = serde_json::from_str(r#"{"components": ["plain"]}"#).unwrap();
    let resolved = store().resolve(&request).unwrap();
    assert!(resolved.contains_key("plain"));
}

#[test]
fn test_payload_shape() {
    let resolved = store().resolve(&ComponentRequest::new(["plain", "card"])).unwrap();
    let payload = serde_json::to_value(&resolved).unwrap();

    assert_eq!(payload["plain"]["markup"], "<p>plain</p>\n");
    assert!(payload["plain"]["script"].is_null());
    assert_eq!(payload["card"]["script"]["loadHandler"], "console.debug(\"card ready\");");
    assert!(payload["card"]["script"]["native"].as_str().unwrap().contains("attributeChangedCallback"));
}

#[test]
fn test_config_file_resolves_relative_dir() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("component-config.json");
    let config = LoaderConfig::from_file(&path).unwrap();

    assert_eq!(config.components_dir_path, components_dir());
    assert_eq!(config.max_tag_name_length, 12);
    assert!(ComponentStore::new(config).unwrap().load("plain").unwrap().is_some());
}

#[test]
fn test_missing_config_file() {
    let err = LoaderConfig::from_file(Path::new("/nonexistent/config.json")).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}
