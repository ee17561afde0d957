use std::path::{Path, PathBuf};

/// Runfiles root of the sandboxed build; its presence marks a sandboxed run.
pub const TEST_SRCDIR: &str = "TEST_SRCDIR";
pub const TEST_WORKSPACE: &str = "TEST_WORKSPACE";
pub const DEPENDENCY_DIR: &str = "DEPENDENCY_DIR";
pub const ANDROID_PACKAGE: &str = "ANDROID_PACKAGE";

/// Snapshot of the process state the resolvers depend on.
///
/// Captured once per run so that resolution never reads ambient globals
/// directly, and so tests can describe an environment without touching
/// the real one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    pub working_dir: PathBuf,
    pub test_srcdir: Option<PathBuf>,
    pub test_workspace: Option<String>,
    pub dependency_dir: Option<PathBuf>,
    pub android_package: Option<String>,
    pub home_dir: Option<PathBuf>,
    pub args: Vec<String>,
}

impl Environment {
    pub fn from_process() -> Self {
        let working_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            working_dir,
            test_srcdir: read_var(TEST_SRCDIR).map(PathBuf::from),
            test_workspace: read_var(TEST_WORKSPACE),
            dependency_dir: read_var(DEPENDENCY_DIR).map(PathBuf::from),
            android_package: read_var(ANDROID_PACKAGE),
            home_dir: read_var("HOME")
                .or_else(|| read_var("USERPROFILE"))
                .map(PathBuf::from),
            args: std::env::args().skip(1).collect(),
        }
    }

    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_test_srcdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.test_srcdir = Some(dir.into());
        self
    }

    pub fn with_test_workspace(mut self, workspace: impl Into<String>) -> Self {
        self.test_workspace = Some(workspace.into());
        self
    }

    pub fn with_dependency_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dependency_dir = Some(dir.into());
        self
    }

    pub fn with_android_package(mut self, package: impl Into<String>) -> Self {
        self.android_package = Some(package.into());
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn is_sandboxed(&self) -> bool {
        self.test_srcdir.is_some()
    }
}

fn read_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
