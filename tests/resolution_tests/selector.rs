//! Factory selection and sdk picking tests

use std::path::PathBuf;
use std::sync::Arc;

use crate::fixtures::write_manifest;
use manifest_resolver::config::{BuildConfiguration, Environment};
use manifest_resolver::factory::{select, FactoryKind, FALLBACK_SDK_VERSION};
use manifest_resolver::ResolutionContext;
use tempfile::TempDir;

fn context(env: Environment) -> Arc<ResolutionContext> {
    Arc::new(ResolutionContext::new(env))
}

#[test]
fn test_build_config_selects_output_layout() {
    let config = BuildConfiguration {
        constants: Some(PathBuf::from("build/generated/BuildConfig.java")),
        ..BuildConfiguration::default()
    };
    let env = Environment::new("/work").with_test_srcdir("/runfiles");
    assert_eq!(select(config, context(env)).kind(), FactoryKind::OutputLayout);
}

#[test]
fn test_runfiles_marker_selects_sandboxed() {
    let env = Environment::new("/work").with_test_srcdir("/runfiles");
    let factory = select(BuildConfiguration::default(), context(env));
    assert_eq!(factory.kind(), FactoryKind::Sandboxed);
    assert!(factory
        .create_sandbox_configuration()
        .is_excluded("org.jacoco.core.Agent"));
}

#[test]
fn test_default_selects_path_convention() {
    let config = BuildConfiguration {
        constants: Some(PathBuf::from("build/R.txt")),
        ..BuildConfiguration::default()
    };
    let factory = select(config, context(Environment::new("/work")));
    assert_eq!(factory.kind(), FactoryKind::PathConvention);
    assert!(!factory
        .create_sandbox_configuration()
        .is_excluded("org.jacoco.core.Agent"));
}

#[test]
fn test_sdk_from_manifest_target() {
    let temp_dir = TempDir::new().unwrap();
    write_manifest(temp_dir.path(), "com.example", Some(21));
    let factory = select(
        BuildConfiguration::default(),
        context(Environment::new(temp_dir.path())),
    );

    let manifest = factory.create_app_manifest().unwrap();
    assert_eq!(factory.pick_sdk_version(manifest.as_ref()).unwrap(), 21);
}

#[test]
fn test_configured_sdk_wins_over_manifest() {
    let temp_dir = TempDir::new().unwrap();
    write_manifest(temp_dir.path(), "com.example", Some(21));
    let config = BuildConfiguration {
        sdk: vec![18],
        ..BuildConfiguration::default()
    };
    let factory = select(config, context(Environment::new(temp_dir.path())));

    let manifest = factory.create_app_manifest().unwrap();
    assert_eq!(factory.pick_sdk_version(manifest.as_ref()).unwrap(), 18);
}

#[test]
fn test_multiple_sdks_rejected() {
    let config = BuildConfiguration {
        sdk: vec![18, 21],
        ..BuildConfiguration::default()
    };
    let factory = select(config, context(Environment::new("/work")));
    let err = factory.pick_sdk_version(None).unwrap_err();
    assert!(err.to_string().contains("more than one sdk"));
}

#[test]
fn test_fallback_sdk_without_manifest() {
    let factory = select(
        BuildConfiguration::default(),
        context(Environment::new("/work")),
    );
    assert_eq!(factory.pick_sdk_version(None).unwrap(), FALLBACK_SDK_VERSION);
}

#[test]
fn test_dependency_resolver_memoized() {
    let env = Environment::new("/work").with_dependency_dir("/jars");
    let factory = select(BuildConfiguration::default(), context(env));
    let first = factory.dependency_resolver().unwrap();
    let second = factory.dependency_resolver().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}
