use std::fmt::Debug;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ConfigurationError, MissingDependencyError, Result};

const PLATFORM_GROUP: &str = "org.robolectric";
const PLATFORM_ARTIFACT: &str = "android-all";

/// Platform jar versions by sdk level.
const PLATFORM_VERSIONS: &[(u32, &str)] = &[
    (16, "4.1.2_r1-robolectric-0"),
    (17, "4.2.2_r1.2-robolectric-0"),
    (18, "4.3_r2-robolectric-0"),
    (19, "4.4_r1-robolectric-1"),
    (21, "5.0.0_r2-robolectric-1"),
    (22, "5.1.1_r9-robolectric-1"),
    (23, "6.0.0_r1-robolectric-0"),
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyJar {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
}

impl DependencyJar {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            classifier: None,
        }
    }

    /// The platform implementation jar for an sdk level.
    pub fn platform(sdk: u32) -> Result<Self> {
        PLATFORM_VERSIONS
            .iter()
            .find(|(level, _)| *level == sdk)
            .map(|(_, version)| Self::new(PLATFORM_GROUP, PLATFORM_ARTIFACT, *version))
            .ok_or_else(|| ConfigurationError::invalid_value("sdk", sdk.to_string()).into())
    }

    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!("{}-{}-{classifier}.jar", self.artifact_id, self.version),
            None => format!("{}-{}.jar", self.artifact_id, self.version),
        }
    }

    pub fn coordinates(&self) -> String {
        format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

/// Locates platform binaries on disk. Resolution of the jars themselves
/// (downloads, checksums) happens elsewhere.
pub trait DependencyResolver: Send + Sync + Debug {
    fn locate(&self, jar: &DependencyJar) -> Result<PathBuf>;
}

/// Jars laid out flat in one directory.
#[derive(Debug, Clone)]
pub struct LocalDependencyResolver {
    dir: PathBuf,
}

impl LocalDependencyResolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DependencyResolver for LocalDependencyResolver {
    fn locate(&self, jar: &DependencyJar) -> Result<PathBuf> {
        existing(jar, self.dir.join(jar.file_name()))
    }
}

/// Jars in a local Maven repository (`group/path/artifact/version/`).
#[derive(Debug, Clone)]
pub struct MavenRepositoryResolver {
    repository: PathBuf,
}

impl MavenRepositoryResolver {
    pub fn new(repository: impl Into<PathBuf>) -> Self {
        Self {
            repository: repository.into(),
        }
    }

    pub fn in_home(home: &Path) -> Self {
        Self::new(home.join(".m2").join("repository"))
    }

    pub fn repository(&self) -> &Path {
        &self.repository
    }
}

impl DependencyResolver for MavenRepositoryResolver {
    fn locate(&self, jar: &DependencyJar) -> Result<PathBuf> {
        let mut path = self.repository.clone();
        path.extend(jar.group_id.split('.'));
        path.push(&jar.artifact_id);
        path.push(&jar.version);
        path.push(jar.file_name());
        existing(jar, path)
    }
}

fn existing(jar: &DependencyJar, path: PathBuf) -> Result<PathBuf> {
    if path.is_file() {
        debug!("{} -> {}", jar.coordinates(), path.display());
        Ok(path)
    } else {
        Err(MissingDependencyError::Jar {
            artifact: jar.coordinates(),
            path,
        }
        .into())
    }
}
