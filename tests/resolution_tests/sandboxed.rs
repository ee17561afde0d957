//! Sandboxed factory tests

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::fixtures::{write_archive_library, write_manifest};
use manifest_resolver::config::{BuildConfiguration, Environment};
use manifest_resolver::factory::{select, FactoryKind, ManifestFactory};
use manifest_resolver::ResolutionContext;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const APP_SYMBOLS: &str = "\
int drawable icon 0x7f020001
int string app_name 0x7f030001
";
const LIB_SYMBOLS: &str = "\
int drawable icon 0x7e020001
int drawable lib_icon 0x7e020002
";

fn runfiles_env(runfiles: &Path, args: Vec<String>) -> Environment {
    Environment::new(runfiles)
        .with_test_srcdir(runfiles)
        .with_test_workspace("main")
        .with_args(args)
}

fn library_args(runfiles: &Path) -> Vec<String> {
    let workspace = runfiles.join("main");
    let app = write_archive_library(&workspace, "java/app", "app", "com.app", APP_SYMBOLS);
    let lib = write_archive_library(&workspace, "java/lib", "lib", "com.lib", LIB_SYMBOLS);
    vec![
        "--strict_libraries".to_string(),
        format!("{app},{lib}"),
        format!("--android_libraries={lib}"),
    ]
}

#[test]
fn test_resolves_label_from_runfiles() {
    let temp_dir = TempDir::new().unwrap();
    let args = library_args(temp_dir.path());
    let ctx = Arc::new(ResolutionContext::new(runfiles_env(temp_dir.path(), args)));

    let factory = select(
        BuildConfiguration::with_manifest("//java/app:app/AndroidManifest.xml"),
        ctx,
    );
    assert_eq!(factory.kind(), FactoryKind::Sandboxed);

    let manifest = factory.create_app_manifest().unwrap().unwrap();
    assert_eq!(
        manifest.manifest_file(),
        temp_dir.path().join("main/java/app/AndroidManifest.xml")
    );
    assert_eq!(manifest.package_name(), Some("com.app"));
    assert_eq!(manifest.libraries().len(), 1);
}

#[test]
fn test_reconciles_library_ids() {
    let temp_dir = TempDir::new().unwrap();
    let args = library_args(temp_dir.path());
    let ctx = Arc::new(ResolutionContext::new(runfiles_env(temp_dir.path(), args)));

    let manifest = select(
        BuildConfiguration::with_manifest("java/app:app/AndroidManifest.xml"),
        ctx,
    )
    .create_app_manifest()
    .unwrap()
    .unwrap();

    let lib = manifest.libraries()[0].constants().unwrap();
    assert_eq!(lib.id("drawable", "icon"), Some(0x7f020001));
    assert_eq!(lib.id("drawable", "lib_icon"), Some(0x7d020002));
    assert_eq!(
        manifest.constants().unwrap().id("string", "app_name"),
        Some(0x7f030001)
    );
}

#[test]
fn test_package_override_from_environment() {
    let temp_dir = TempDir::new().unwrap();
    let args = library_args(temp_dir.path());
    let env = runfiles_env(temp_dir.path(), args).with_android_package("com.override");
    let ctx = Arc::new(ResolutionContext::new(env));

    let manifest = select(
        BuildConfiguration::with_manifest("java/app:app/AndroidManifest.xml"),
        ctx,
    )
    .create_app_manifest()
    .unwrap()
    .unwrap();
    assert_eq!(manifest.package_name(), Some("com.override"));
}

#[test]
fn test_locator_shared_across_factories() {
    let temp_dir = TempDir::new().unwrap();
    let args = library_args(temp_dir.path());
    let ctx = Arc::new(ResolutionContext::new(runfiles_env(temp_dir.path(), args)));
    let config = BuildConfiguration::with_manifest("java/app:app/AndroidManifest.xml");

    let first = select(config.clone(), Arc::clone(&ctx))
        .create_app_manifest()
        .unwrap()
        .unwrap();
    let second = select(config, Arc::clone(&ctx))
        .create_app_manifest()
        .unwrap()
        .unwrap();
    assert_eq!(first.res_dir(), second.res_dir());
}

#[test]
fn test_extraction_removed_with_context() {
    let temp_dir = TempDir::new().unwrap();
    let args = library_args(temp_dir.path());
    let ctx = Arc::new(ResolutionContext::new(runfiles_env(temp_dir.path(), args)));

    let manifest = select(
        BuildConfiguration::with_manifest("java/app:app/AndroidManifest.xml"),
        Arc::clone(&ctx),
    )
    .create_app_manifest()
    .unwrap()
    .unwrap();
    let res_dir = manifest.res_dir().to_path_buf();
    assert!(res_dir.exists());

    drop(ctx);
    assert!(!res_dir.exists());
}

#[test]
fn test_without_tokens_uses_basic_manifest() {
    let temp_dir = TempDir::new().unwrap();
    write_manifest(temp_dir.path(), "com.plain", None);
    fs::write(temp_dir.path().join("R.txt"), APP_SYMBOLS).unwrap();
    let ctx = Arc::new(ResolutionContext::new(runfiles_env(temp_dir.path(), vec![])));

    let manifest = select(BuildConfiguration::default(), ctx)
        .create_app_manifest()
        .unwrap()
        .unwrap();
    assert_eq!(manifest.package_name(), Some("com.plain"));
    assert!(manifest.constants().unwrap().is_reconciled());
}
