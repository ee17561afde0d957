//! Reconciliation over resolved trees

use std::fs;
use std::sync::Arc;

use crate::fixtures::{write_library_dir, write_manifest, write_properties};
use manifest_resolver::config::{BuildConfiguration, Environment};
use manifest_resolver::factory::{ManifestFactory, PathConventionFactory};
use manifest_resolver::{ManifestNode, ResolutionContext, ResourceIdReconciler};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const MODULE_SYMBOLS: &str = "\
int attr colorPrimary 0x7f010001
int attr colorAccent 0x7f010002
int drawable icon 0x7f020001
int[] styleable Theme { 0x7f010001, 0x7f010002 }
int styleable Theme_colorPrimary 0
int styleable Theme_colorAccent 1
";

const LIB1_SYMBOLS: &str = "\
int attr colorPrimary 0x7e010005
int drawable icon 0x7e020001
int drawable lib1_icon 0x7e020002
int[] styleable Theme { 0x7e010005 }
int styleable Theme_colorPrimary 0
";

const LIB2_SYMBOLS: &str = "\
int drawable icon 0x7d020001
int drawable lib2_icon 0x7d020003
";

fn resolved_tree(temp_dir: &TempDir) -> ManifestNode {
    let base = temp_dir.path();
    write_manifest(base, "com.example", None);
    fs::write(base.join("R.txt"), MODULE_SYMBOLS).unwrap();
    write_library_dir(&base.join("lib1"), "com.lib1", Some(LIB1_SYMBOLS));
    write_library_dir(&base.join("lib2"), "com.lib2", Some(LIB2_SYMBOLS));
    write_library_dir(&base.join("nosymbols"), "com.nosymbols", None);
    write_properties(base, "project.properties", &["lib1", "nosymbols", "lib2"]);

    let ctx = Arc::new(ResolutionContext::new(Environment::new(base)));
    PathConventionFactory::new(BuildConfiguration::default(), ctx)
        .create_app_manifest()
        .unwrap()
        .unwrap()
}

#[test]
fn test_library_ids_rewritten_to_module_ids() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = resolved_tree(&temp_dir);
    ResourceIdReconciler::new().reconcile(&mut tree);

    let lib1 = tree.libraries()[0].constants().unwrap();
    assert_eq!(lib1.id("drawable", "icon"), Some(0x7f020001));
    assert_eq!(lib1.id("attr", "colorPrimary"), Some(0x7f010001));
    assert_eq!(lib1.id("drawable", "lib1_icon"), Some(0x7d020002));

    let lib2 = tree.libraries()[2].constants().unwrap();
    assert_eq!(lib2.id("drawable", "icon"), Some(0x7f020001));
    assert_eq!(lib2.id("drawable", "lib2_icon"), Some(0x7b020003));
}

#[test]
fn test_styleable_slots_follow_companions() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = resolved_tree(&temp_dir);
    let mut reconciler = ResourceIdReconciler::new();
    reconciler.reconcile(&mut tree);

    assert_eq!(
        reconciler.canonical_id("styleable/Theme_colorPrimary"),
        Some(0x7f010001)
    );
    let lib1 = tree.libraries()[0].constants().unwrap();
    assert_eq!(
        lib1.get("styleable", "Theme"),
        Some(&manifest_resolver::resources::ResourceValue::Array(vec![0x7f010001]))
    );
}

#[test]
fn test_reconciliation_is_fixed_point() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = resolved_tree(&temp_dir);
    ResourceIdReconciler::new().reconcile(&mut tree);
    let first: Vec<_> = tree.walk().iter().map(|n| n.constants().cloned()).collect();

    ResourceIdReconciler::new().reconcile(&mut tree);
    let second: Vec<_> = tree.walk().iter().map(|n| n.constants().cloned()).collect();

    assert_eq!(first, second);
}

#[test]
fn test_library_without_table_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = resolved_tree(&temp_dir);
    ResourceIdReconciler::new().reconcile(&mut tree);

    assert!(tree.libraries()[1].constants().is_none());
    assert!(tree.libraries()[2].constants().unwrap().is_reconciled());
}

#[test]
fn test_every_copy_of_shared_library_reconciled() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path();
    write_manifest(base, "com.example", None);
    fs::write(base.join("R.txt"), MODULE_SYMBOLS).unwrap();
    write_library_dir(&base.join("lib1"), "com.lib1", Some(LIB1_SYMBOLS));
    write_library_dir(
        &base.join("shared"),
        "com.shared",
        Some("int drawable icon 0x80020001\nint drawable shared_icon 0x80020002\n"),
    );
    write_properties(base, "project.properties", &["lib1", "shared"]);
    write_properties(&base.join("lib1"), "project.properties", &["../shared"]);

    let ctx = Arc::new(ResolutionContext::new(Environment::new(base)));
    let mut tree = PathConventionFactory::new(BuildConfiguration::default(), ctx)
        .create_app_manifest()
        .unwrap()
        .unwrap();
    ResourceIdReconciler::new().reconcile(&mut tree);

    let copies: Vec<_> = tree
        .walk()
        .into_iter()
        .filter(|node| node.package_name() == Some("com.shared"))
        .map(|node| node.constants().cloned().unwrap())
        .collect();
    assert_eq!(copies.len(), 2);
    assert_eq!(copies[0].id("drawable", "icon"), Some(0x7f020001));
    assert_eq!(copies[0].types, copies[1].types);
    assert!(copies[1].is_reconciled());
}
