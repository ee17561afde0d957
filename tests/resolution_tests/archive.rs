//! Archive-based locator tests

use std::fs;
use std::path::PathBuf;

use crate::fixtures::{write_archive, write_archive_library, write_manifest};
use manifest_resolver::error::{ConfigurationError, Error};
use manifest_resolver::factory::archive::{parse_flag, ArchiveLocator, DIRECT_LIBRARIES_FLAG};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const APP_SYMBOLS: &str = "int drawable icon 0x7f020001\n";
const LIB_SYMBOLS: &str = "int drawable icon 0x7e020001\nint string lib_name 0x7e030001\n";

/// `runfiles/` is the working directory; tokens resolve under `runfiles/ws:main/`.
struct Layout {
    _temp_dir: TempDir,
    working_dir: PathBuf,
    base_dir: PathBuf,
}

fn layout() -> Layout {
    let temp_dir = TempDir::new().unwrap();
    let working_dir = temp_dir.path().join("runfiles");
    let base_dir = working_dir.join("ws:main");
    fs::create_dir_all(&base_dir).unwrap();
    Layout {
        _temp_dir: temp_dir,
        working_dir,
        base_dir,
    }
}

#[test]
fn test_malformed_token_names_token() {
    let layout = layout();
    let args = vec![format!("{DIRECT_LIBRARIES_FLAG}=onlyonepart")];
    let err = ArchiveLocator::from_args(&args, &layout.working_dir, &layout.base_dir).unwrap_err();

    assert!(matches!(
        err,
        Error::Configuration(ConfigurationError::MalformedToken { .. })
    ));
    assert!(err.to_string().contains("onlyonepart"));
}

#[test]
fn test_empty_token_list() {
    let layout = layout();
    let locator = ArchiveLocator::from_args(&[], &layout.working_dir, &layout.base_dir).unwrap();

    assert!(!locator.has_values());
    for candidate in ["AndroidManifest.xml", "java/app:app/AndroidManifest.xml"] {
        assert!(locator
            .create_manifest(&layout.working_dir.join(candidate))
            .unwrap()
            .is_none());
    }
}

#[test]
fn test_flag_values_from_both_forms() {
    let args: Vec<String> = [
        "--strict_libraries",
        "a/AndroidManifest.xml:a/a.aar,b/AndroidManifest.xml:b/b.aar",
        "--strict_libraries=c/AndroidManifest.xml:c/c.aar",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    assert_eq!(parse_flag(DIRECT_LIBRARIES_FLAG, &args).len(), 3);
}

#[test]
fn test_direct_libraries_become_children_of_primary() {
    let layout = layout();
    let app = write_archive_library(&layout.base_dir, "java/app", "app", "com.app", APP_SYMBOLS);
    let lib = write_archive_library(&layout.base_dir, "java/lib", "lib", "com.lib", LIB_SYMBOLS);

    let locator = ArchiveLocator::builder(&layout.working_dir, &layout.base_dir)
        .direct([app, lib])
        .build()
        .unwrap();
    let manifest = locator
        .create_manifest(&layout.working_dir.join("java/app:app/AndroidManifest.xml"))
        .unwrap()
        .unwrap();

    assert_eq!(
        manifest.manifest_file(),
        layout.base_dir.join("java/app/AndroidManifest.xml")
    );
    assert_eq!(manifest.package_name(), Some("com.app"));
    assert!(manifest.res_dir().join("values/strings.xml").is_file());
    assert_eq!(manifest.libraries().len(), 1);
    assert_eq!(manifest.libraries()[0].package_name(), Some("com.lib"));
    assert_eq!(
        manifest.libraries()[0]
            .constants()
            .unwrap()
            .id("string", "lib_name"),
        Some(0x7e030001)
    );
}

#[test]
fn test_direct_and_transitive_manifest_appears_once() {
    let layout = layout();
    let app = write_archive_library(&layout.base_dir, "java/app", "app", "com.app", APP_SYMBOLS);
    let direct = write_archive_library(&layout.base_dir, "java/lib", "lib", "com.lib", LIB_SYMBOLS);
    write_archive(
        &layout.base_dir.join("java/lib/lib_transitive.aar"),
        &[("res/values/other.xml", "<resources/>")],
    );
    let transitive = "java/lib/AndroidManifest.xml:java/lib/lib_transitive.aar".to_string();
    let other = write_archive_library(&layout.base_dir, "java/other", "other", "com.other", "");

    let locator = ArchiveLocator::builder(&layout.working_dir, &layout.base_dir)
        .direct([app.clone(), direct])
        .transitive([app, transitive, other])
        .build()
        .unwrap();
    let direct_res = locator
        .direct_manifests()
        .find(|node| node.package_name() == Some("com.lib"))
        .unwrap()
        .res_dir()
        .to_path_buf();

    let manifest = locator
        .create_manifest(&layout.working_dir.join("java/app:app/AndroidManifest.xml"))
        .unwrap()
        .unwrap();

    let libraries: Vec<_> = manifest
        .libraries()
        .iter()
        .map(|lib| lib.package_name().unwrap().to_string())
        .collect();
    assert_eq!(libraries, vec!["com.lib", "com.other"]);
    assert_eq!(manifest.libraries()[0].res_dir(), direct_res);
}

#[test]
fn test_label_and_literal_path_resolve_identically() {
    let layout = layout();
    let app = write_archive_library(&layout.base_dir, "java/app", "app", "com.app", APP_SYMBOLS);
    let lib = write_archive_library(&layout.base_dir, "java/lib", "lib", "com.lib", LIB_SYMBOLS);

    let locator = ArchiveLocator::builder(&layout.working_dir, &layout.base_dir)
        .direct([app, lib])
        .build()
        .unwrap();

    let by_label = locator
        .create_manifest(&layout.working_dir.join("java/app:app/AndroidManifest.xml"))
        .unwrap()
        .unwrap();
    let by_path = locator
        .create_manifest(&layout.base_dir.join("java/app/AndroidManifest.xml"))
        .unwrap()
        .unwrap();

    assert_eq!(by_label, by_path);
}

#[test]
fn test_bare_path_is_deprecated() {
    let temp_dir = TempDir::new().unwrap();
    let app = write_archive_library(temp_dir.path(), "java/app", "app", "com.app", APP_SYMBOLS);
    let locator = ArchiveLocator::builder(temp_dir.path(), temp_dir.path())
        .direct([app])
        .build()
        .unwrap();

    let err = locator
        .create_manifest(&temp_dir.path().join("java/app/AndroidManifest.xml"))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Configuration(ConfigurationError::DeprecatedManifestPath { .. })
    ));
    assert!(err.to_string().contains("//java/app:app/AndroidManifest.xml"));
}

#[test]
fn test_unknown_label_lists_aliases() {
    let layout = layout();
    let app = write_archive_library(&layout.base_dir, "java/app", "app", "com.app", APP_SYMBOLS);
    let locator = ArchiveLocator::builder(&layout.working_dir, &layout.base_dir)
        .direct([app])
        .build()
        .unwrap();

    let err = locator
        .create_manifest(&layout.working_dir.join("java/missing:missing/AndroidManifest.xml"))
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("java/missing:missing/AndroidManifest.xml"));
    assert!(message.contains("//java/app:app/AndroidManifest.xml"));
}

#[test]
fn test_transitive_tokens_get_no_alias() {
    let layout = layout();
    let app = write_archive_library(&layout.base_dir, "java/app", "app", "com.app", APP_SYMBOLS);
    let lib = write_archive_library(&layout.base_dir, "java/lib", "lib", "com.lib", LIB_SYMBOLS);

    let locator = ArchiveLocator::builder(&layout.working_dir, &layout.base_dir)
        .direct([app])
        .transitive([lib])
        .build()
        .unwrap();

    let aliases: Vec<_> = locator.aliases().keys().cloned().collect();
    assert_eq!(aliases, vec!["//java/app:app/AndroidManifest.xml"]);
}

#[test]
fn test_missing_manifest_fails_build() {
    let layout = layout();
    write_manifest(&layout.base_dir.join("java/lib"), "com.lib", None);
    write_archive(&layout.base_dir.join("java/lib/lib.aar"), &[]);

    let err = ArchiveLocator::builder(&layout.working_dir, &layout.base_dir)
        .direct(["java/gone/AndroidManifest.xml:java/lib/lib.aar"])
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::MissingDependency(_)));
    assert!(err.to_string().contains("java/gone/AndroidManifest.xml"));
}
