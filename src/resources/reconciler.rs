//! Resource id reconciliation across independently compiled libraries.
//!
//! Ids are laid out as `0xPPTTIIII`: package, type, and entry index within
//! the type. Every library's table is generated with its own package byte,
//! so the same resource carries a different raw id in each table. The
//! reconciler strips each table's package offset and rewrites every entry
//! to the first value seen for its `<type>/<name>` key.
//!
//! A package reached along more than one path is assigned a single offset;
//! every copy of its table is rewritten to the same values.
//!
//! Two unrelated libraries declaring the same type and name end up sharing
//! one id. Collisions are not reported.
use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::manifest::ManifestNode;
use crate::resources::symbols::{ResourceTable, ResourceType, ResourceValue};

/// Types with this prefix hold attribute-group arrays instead of scalars.
pub const STYLEABLE_PREFIX: &str = "styleable";

const PACKAGE_SHIFT: u32 = 24;

#[derive(Debug, Default)]
pub struct ResourceIdReconciler {
    package_offset: u32,
    canonical: HashMap<String, u32>,
    processed: HashMap<String, u32>,
}

impl ResourceIdReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconciles the module's table first, then every library depth first.
    pub fn reconcile(&mut self, manifest: &mut ManifestNode) {
        let package = package_key(manifest);
        match manifest.constants_mut() {
            Some(table) => {
                reconcile_table(table, &mut self.canonical, 0);
                self.package_offset = 1;
            }
            None => {
                warn!("no resource table in package {package}");
                return;
            }
        }
        self.processed.insert(package, 0);
        self.reconcile_libraries(manifest.libraries_mut());
    }

    fn reconcile_libraries(&mut self, libraries: &mut [ManifestNode]) {
        for library in libraries {
            self.reconcile_package(library);
            self.reconcile_libraries(library.libraries_mut());
        }
    }

    fn reconcile_package(&mut self, library: &mut ManifestNode) {
        let package = package_key(library);
        let Some(table) = library.constants_mut() else {
            if !self.processed.contains_key(&package) {
                warn!("no resource table in package {package}, skipping");
            }
            return;
        };

        if let Some(&offset) = self.processed.get(&package) {
            debug!("{package} already reconciled, aligning another copy");
            reconcile_table(table, &mut self.canonical, offset);
            return;
        }

        let offset = self.package_offset;
        self.package_offset += 1;
        debug!("reconciling {package} at package offset {offset}");
        reconcile_table(table, &mut self.canonical, offset);
        self.processed.insert(package, offset);
    }

    pub fn canonical_id(&self, key: &str) -> Option<u32> {
        self.canonical.get(key).copied()
    }

    pub fn canonical_ids(&self) -> &HashMap<String, u32> {
        &self.canonical
    }
}

fn package_key(node: &ManifestNode) -> String {
    node.package_name()
        .map(String::from)
        .unwrap_or_else(|| node.manifest_file().display().to_string())
}

fn reconcile_table(table: &mut ResourceTable, canonical: &mut HashMap<String, u32>, offset: u32) {
    if table.reconciled {
        seed_from_table(table, canonical);
        return;
    }

    let shift = offset << PACKAGE_SHIFT;
    for resource_type in &mut table.types {
        if resource_type.name.starts_with(STYLEABLE_PREFIX) {
            reconcile_styleable(resource_type, canonical, shift);
        } else {
            reconcile_scalars(resource_type, canonical, shift);
        }
    }
    table.reconciled = true;
}

fn reconcile_scalars(resource_type: &mut ResourceType, canonical: &mut HashMap<String, u32>, shift: u32) {
    for entry in &mut resource_type.entries {
        let ResourceValue::Id(value) = &mut entry.value else {
            continue;
        };
        let key = format!("{}/{}", resource_type.name, entry.name);
        if entry.mutable {
            *value = value.wrapping_sub(shift);
        }
        match canonical.get(&key) {
            Some(&id) => {
                if entry.mutable {
                    *value = id;
                }
            }
            None => {
                canonical.insert(key, *value);
            }
        }
    }
}

fn reconcile_styleable(resource_type: &mut ResourceType, canonical: &mut HashMap<String, u32>, shift: u32) {
    let companions = companion_names(resource_type);

    for entry in &mut resource_type.entries {
        let ResourceValue::Array(slots) = &mut entry.value else {
            continue;
        };
        let names = companions.get(entry.name.as_str());
        for (index, slot) in slots.iter_mut().enumerate() {
            let normalized = slot.wrapping_sub(shift);
            let Some(field) = names.and_then(|n| n.get(&(index as u32))) else {
                debug!("no companion for {}[{index}]", entry.name);
                *slot = normalized;
                continue;
            };
            let key = format!("{}/{field}", resource_type.name);
            match canonical.get(&key) {
                Some(&id) => *slot = id,
                None => {
                    *slot = normalized;
                    canonical.insert(key, normalized);
                }
            }
        }
    }
}

/// Maps `group -> slot index -> companion scalar name`.
///
/// Group and attribute names may both contain underscores, so the group
/// is the longest underscore-delimited prefix that is itself declared.
fn companion_names(resource_type: &ResourceType) -> HashMap<String, HashMap<u32, String>> {
    let declared: HashSet<&str> = resource_type
        .entries
        .iter()
        .map(|e| e.name.as_str())
        .collect();

    let mut companions: HashMap<String, HashMap<u32, String>> = HashMap::new();
    for entry in &resource_type.entries {
        let Some(index) = entry.as_id() else {
            continue;
        };
        let group = entry
            .name
            .rmatch_indices('_')
            .map(|(idx, _)| &entry.name[..idx])
            .find(|prefix| declared.contains(prefix));
        match group {
            Some(group) => {
                companions
                    .entry(group.to_string())
                    .or_default()
                    .insert(index, entry.name.clone());
            }
            None => debug!("{} has no declared group", entry.name),
        }
    }
    companions
}

fn seed_from_table(table: &ResourceTable, canonical: &mut HashMap<String, u32>) {
    for resource_type in &table.types {
        if resource_type.name.starts_with(STYLEABLE_PREFIX) {
            let companions = companion_names(resource_type);
            for entry in &resource_type.entries {
                let ResourceValue::Array(slots) = &entry.value else {
                    continue;
                };
                let Some(names) = companions.get(entry.name.as_str()) else {
                    continue;
                };
                for (index, slot) in slots.iter().enumerate() {
                    if let Some(field) = names.get(&(index as u32)) {
                        canonical
                            .entry(format!("{}/{field}", resource_type.name))
                            .or_insert(*slot);
                    }
                }
            }
        } else {
            for entry in &resource_type.entries {
                if let ResourceValue::Id(value) = entry.value {
                    canonical
                        .entry(format!("{}/{}", resource_type.name, entry.name))
                        .or_insert(value);
                }
            }
        }
    }
}
