use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use tempfile::TempDir;
use tracing::{debug, info};
use zip::ZipArchive;

use crate::error::{ConfigurationError, IoError, MissingDependencyError, Result, UnknownLabelError};
use crate::manifest::{canonical_path, ManifestNode};
use crate::resources::{ResourceTable, SYMBOL_FILE_NAME};

/// Libraries the module depends on directly. Only these get label aliases.
pub const DIRECT_LIBRARIES_FLAG: &str = "--strict_libraries";
/// The full transitive closure of the module's libraries.
pub const TRANSITIVE_LIBRARIES_FLAG: &str = "--android_libraries";

const ARCHIVE_EXTENSION: &str = ".aar";
const MERGE_DIR_ANCHOR: &str = "java";
const RES_ENTRY_PREFIX: &str = "res/";
const ASSETS_ENTRY_PREFIX: &str = "assets/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LibraryKind {
    Direct,
    Transitive,
}

/// Collects every value of `flag`, accepting `flag value` and `flag=value`
/// forms, each value a comma-separated list. The flag may repeat.
pub fn parse_flag(flag: &str, args: &[String]) -> Vec<String> {
    let assignment = format!("{flag}=");
    let mut values = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let raw = if arg == flag {
            iter.next().map(String::as_str)
        } else {
            arg.strip_prefix(assignment.as_str())
        };
        if let Some(raw) = raw {
            values.extend(
                raw.split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string),
            );
        }
    }
    values
}

/// Splits `manifest:archive` into its two relative paths.
fn split_token(token: &str) -> Option<(&str, &str)> {
    let (manifest, archive) = token.split_once(':')?;
    if manifest.is_empty() || archive.is_empty() || archive.contains(':') {
        return None;
    }
    Some((manifest, archive))
}

/// `<package>/<target>.aar` names the build rule `//<package>:<target>`.
fn infer_label(archive: &str) -> Option<(&str, &str)> {
    archive.strip_suffix(ARCHIVE_EXTENSION)?.rsplit_once('/')
}

/// Extraction directory prefix: the path from its last `java` anchor
/// onward, separators flattened, suffixed with the content kind.
fn merge_dir_prefix(root: &str, kind: &str) -> String {
    let anchored = root
        .rfind(MERGE_DIR_ANCHOR)
        .map_or(root, |idx| &root[idx..]);
    let flattened: String = anchored
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{flattened}_{kind}")
}

/// Archive entry names must stay inside the extraction root.
fn safe_relative(entry: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(entry).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(relative)
}

/// Insertion-ordered manifest map keyed by canonical manifest path.
#[derive(Debug, Default)]
struct ManifestMap {
    entries: Vec<(String, ManifestNode)>,
    index: HashMap<String, usize>,
}

impl ManifestMap {
    fn get(&self, key: &str) -> Option<&ManifestNode> {
        self.index.get(key).map(|&idx| &self.entries[idx].1)
    }

    fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// First registration wins.
    fn insert(&mut self, key: String, node: ManifestNode) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, node));
        true
    }

    fn values(&self) -> impl Iterator<Item = &ManifestNode> {
        self.entries.iter().map(|(_, node)| node)
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &ManifestNode)> {
        self.entries.iter().map(|(key, node)| (key.as_str(), node))
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct ArchiveLocatorBuilder {
    working_dir: PathBuf,
    base_dir: PathBuf,
    direct_tokens: Vec<String>,
    transitive_tokens: Vec<String>,
}

impl ArchiveLocatorBuilder {
    pub fn direct<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.direct_tokens.extend(tokens.into_iter().map(Into::into));
        self
    }

    pub fn transitive<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.transitive_tokens
            .extend(tokens.into_iter().map(Into::into));
        self
    }

    /// Validates every token and unpacks each distinct archive once.
    pub fn build(self) -> Result<ArchiveLocator> {
        let started = Instant::now();
        let mut locator = ArchiveLocator {
            working_dir: self.working_dir.clone(),
            direct: ManifestMap::default(),
            transitive: ManifestMap::default(),
            aliases: BTreeMap::new(),
            extraction_dirs: Vec::new(),
        };

        let mut unpacked = HashMap::new();
        let result = self
            .direct_tokens
            .iter()
            .map(|t| (t, LibraryKind::Direct))
            .chain(
                self.transitive_tokens
                    .iter()
                    .map(|t| (t, LibraryKind::Transitive)),
            )
            .try_for_each(|(token, kind)| self.register(&mut locator, &mut unpacked, token, kind));

        info!(
            "{}ms for resource unpacking",
            started.elapsed().as_millis()
        );
        result?;
        Ok(locator)
    }

    fn register(
        &self,
        locator: &mut ArchiveLocator,
        unpacked: &mut HashMap<String, ManifestNode>,
        token: &str,
        kind: LibraryKind,
    ) -> Result<()> {
        let (manifest_rel, archive_rel) =
            split_token(token).ok_or_else(|| ConfigurationError::malformed_token(token))?;
        let manifest = existing(self.base_dir.join(manifest_rel))?;
        let archive = existing(self.base_dir.join(archive_rel))?;
        let key = manifest_key(&manifest);
        let label = infer_label(archive_rel);

        if let (LibraryKind::Direct, Some((package, target))) = (kind, label) {
            let file_name = manifest
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let alias = format!("//{package}:{target}/{file_name}");
            if locator.aliases.contains_key(&alias) {
                info!("Label '{alias}' is already registered, keeping the first archive");
            } else {
                locator.aliases.insert(alias, key.clone());
            }
        }

        let node = match unpacked.get(&key) {
            Some(node) => node.clone(),
            None => {
                let merge_root = match label {
                    Some((package, target)) => format!("{package}/{target}"),
                    None => manifest
                        .parent()
                        .map(|p| p.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                };
                let node = locator.unpack(&manifest, &archive, &merge_root)?;
                unpacked.insert(key.clone(), node.clone());
                node
            }
        };

        let map = match kind {
            LibraryKind::Direct => &mut locator.direct,
            LibraryKind::Transitive => &mut locator.transitive,
        };
        if !map.insert(key, node) {
            info!("Manifest '{manifest_rel}' is referenced by multiple library rules");
        }
        Ok(())
    }
}

/// Library manifests unpacked from `manifest:archive` tokens on the runner's
/// command line.
///
/// Extracted resources live in temporary directories owned by the locator
/// and are removed when it is dropped.
#[derive(Debug)]
pub struct ArchiveLocator {
    working_dir: PathBuf,
    direct: ManifestMap,
    transitive: ManifestMap,
    aliases: BTreeMap<String, String>,
    extraction_dirs: Vec<TempDir>,
}

impl ArchiveLocator {
    pub fn builder(working_dir: impl Into<PathBuf>, base_dir: impl Into<PathBuf>) -> ArchiveLocatorBuilder {
        ArchiveLocatorBuilder {
            working_dir: working_dir.into(),
            base_dir: base_dir.into(),
            direct_tokens: Vec::new(),
            transitive_tokens: Vec::new(),
        }
    }

    /// Builds from raw runner arguments. Token paths are relative to `base_dir`.
    pub fn from_args(args: &[String], working_dir: &Path, base_dir: &Path) -> Result<Self> {
        Self::builder(working_dir, base_dir)
            .direct(parse_flag(DIRECT_LIBRARIES_FLAG, args))
            .transitive(parse_flag(TRANSITIVE_LIBRARIES_FLAG, args))
            .build()
    }

    pub fn has_values(&self) -> bool {
        !self.direct.is_empty()
    }

    pub fn direct_manifests(&self) -> impl Iterator<Item = &ManifestNode> {
        self.direct.values()
    }

    pub fn transitive_manifests(&self) -> impl Iterator<Item = &ManifestNode> {
        self.transitive.values()
    }

    pub fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    /// The tree rooted at the direct library named by `candidate`: the
    /// other direct libraries then the remaining transitive ones become
    /// its libraries, each manifest at most once.
    pub fn create_manifest(&self, candidate: &Path) -> Result<Option<ManifestNode>> {
        if !self.has_values() {
            return Ok(None);
        }
        let key = self.resolve_key(candidate)?;
        let Some(primary) = self.direct.get(&key) else {
            return Err(self.unknown_label(candidate).into());
        };

        let mut added: HashSet<&str> = HashSet::new();
        added.insert(key.as_str());
        let mut libraries = Vec::new();
        for (library_key, node) in self.direct.iter().chain(self.transitive.iter()) {
            if added.insert(library_key) {
                libraries.push(node.clone());
            }
        }
        debug!(
            "{} resolved with {} libraries",
            key,
            libraries.len()
        );

        let manifest = ManifestNode::new(primary.manifest_file(), primary.res_dir(), primary.assets_dir())
            .with_constants(primary.constants().cloned())
            .with_libraries(libraries);
        Ok(Some(manifest))
    }

    /// Maps a candidate path to a direct manifest key, going through the
    /// label aliases when the path names a build rule.
    fn resolve_key(&self, candidate: &Path) -> Result<String> {
        let candidate_str = candidate.to_string_lossy();
        let working = self.working_dir.to_string_lossy();
        let relative = if working.is_empty() {
            candidate_str.as_ref()
        } else {
            candidate_str
                .strip_prefix(working.as_ref())
                .unwrap_or(candidate_str.as_ref())
        };
        let label = format!("/{relative}");
        if !label.contains(':') {
            return Err(ConfigurationError::DeprecatedManifestPath {
                known: self.known_labels(),
            }
            .into());
        }

        let key = self
            .aliases
            .get(&label)
            .cloned()
            .unwrap_or_else(|| manifest_key(candidate));
        if !self.direct.contains(&key) {
            return Err(self.unknown_label(candidate).into());
        }
        Ok(key)
    }

    fn known_labels(&self) -> Vec<String> {
        self.aliases.keys().cloned().collect()
    }

    fn unknown_label(&self, candidate: &Path) -> UnknownLabelError {
        UnknownLabelError {
            requested: candidate.display().to_string(),
            known: self.known_labels(),
        }
    }

    fn unpack(&mut self, manifest: &Path, archive: &Path, merge_root: &str) -> Result<ManifestNode> {
        let res_dir = merge_dir(&merge_dir_prefix(merge_root, "res"))?;
        let assets_dir = merge_dir(&merge_dir_prefix(merge_root, "assets"))?;
        let constants = extract(archive, res_dir.path(), assets_dir.path())?;
        debug!(
            "unpacked {} into {}",
            archive.display(),
            res_dir.path().display()
        );

        let node = ManifestNode::new(manifest, res_dir.path(), assets_dir.path())
            .with_constants(constants);
        self.extraction_dirs.push(res_dir);
        self.extraction_dirs.push(assets_dir);
        Ok(node)
    }

    #[cfg(test)]
    fn manifest_keys(&self) -> (Vec<&str>, Vec<&str>) {
        (
            self.direct.iter().map(|(key, _)| key).collect(),
            self.transitive.iter().map(|(key, _)| key).collect(),
        )
    }
}

fn manifest_key(manifest: &Path) -> String {
    canonical_path(manifest).to_string_lossy().into_owned()
}

fn existing(path: PathBuf) -> Result<PathBuf> {
    if path.exists() {
        Ok(path)
    } else {
        Err(MissingDependencyError::path(path).into())
    }
}

fn merge_dir(prefix: &str) -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .map_err(|source| {
            IoError::TempDirError {
                prefix: prefix.to_string(),
                source,
            }
            .into()
        })
}

/// Copies `res/` and `assets/` entries into their directories and returns
/// the archive's root symbol table, if any.
fn extract(archive: &Path, res_dir: &Path, assets_dir: &Path) -> Result<Option<ResourceTable>> {
    let file = File::open(archive).map_err(|e| IoError::read_error(archive, e))?;
    let mut zip = ZipArchive::new(file).map_err(|e| IoError::archive_error(archive, e))?;
    let mut constants = None;

    for idx in 0..zip.len() {
        let mut entry = zip
            .by_index(idx)
            .map_err(|e| IoError::archive_error(archive, e))?;
        let name = entry.name().to_string();

        let (root, relative) = if let Some(rest) = name.strip_prefix(RES_ENTRY_PREFIX) {
            (res_dir, rest)
        } else if let Some(rest) = name.strip_prefix(ASSETS_ENTRY_PREFIX) {
            (assets_dir, rest)
        } else if name == SYMBOL_FILE_NAME {
            let origin = archive.join(SYMBOL_FILE_NAME);
            let mut text = String::new();
            entry
                .read_to_string(&mut text)
                .map_err(|e| IoError::read_error(&origin, e))?;
            let mut table = ResourceTable::parse(&text, &origin)?;
            table.source = Some(origin);
            constants = Some(table);
            continue;
        } else {
            continue;
        };

        let relative = safe_relative(relative).ok_or_else(|| IoError::UnsafeEntry {
            path: archive.to_path_buf(),
            entry: name.clone(),
        })?;
        let target = root.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| IoError::write_error(&target, e))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| IoError::write_error(parent, e))?;
        }
        let mut out = File::create(&target).map_err(|e| IoError::write_error(&target, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| IoError::write_error(&target, e))?;
    }

    Ok(constants)
}
