//! Scope Filter
//!
//! Keeps only reports for sources of the library under test and rewrites
//! their header path to a build-location independent key:
//! `<namespace>/<path relative to project root>`.

use super::CoverageReport;
use crate::result::{SessionError, SessionResult};
use std::path::{Component, Path, PathBuf};

/// Decides which reports belong to the library under test
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    project_root: PathBuf,
    public_root: PathBuf,
    private_root: PathBuf,
    namespace: String,
}

impl ScopeFilter {
    /// Create a filter over the public and private source trees
    ///
    /// # Errors
    ///
    /// Returns `Config` if either root is outside `project_root` or the
    /// namespace is empty or has leading/trailing separators
    pub fn new(
        project_root: &Path,
        public_root: &Path,
        private_root: &Path,
        namespace: &str,
    ) -> SessionResult<Self> {
        let project_root = normalize_lexically(project_root);
        let public_root = normalize_lexically(public_root);
        let private_root = normalize_lexically(private_root);

        for root in [&public_root, &private_root] {
            if !root.starts_with(&project_root) {
                return Err(SessionError::config(format!(
                    "source root {} is not under project root {}",
                    root.display(),
                    project_root.display()
                )));
            }
        }
        if namespace.is_empty() || namespace.starts_with('/') || namespace.ends_with('/') {
            return Err(SessionError::config(format!(
                "invalid namespace `{namespace}`"
            )));
        }

        Ok(Self {
            project_root,
            public_root,
            private_root,
            namespace: namespace.to_string(),
        })
    }

    /// Canonical key for `source`, or `None` if it is out of scope
    #[must_use]
    pub fn canonicalize(&self, source: &str) -> Option<String> {
        let path = normalize_lexically(Path::new(source));
        if !(path.starts_with(&self.public_root) || path.starts_with(&self.private_root)) {
            return None;
        }
        let relative = path.strip_prefix(&self.project_root).ok()?;
        let mut key = self.namespace.clone();
        for component in relative.components() {
            key.push('/');
            key.push_str(&component.as_os_str().to_string_lossy());
        }
        Some(key)
    }

    /// Rename an in-scope report, dropping it otherwise
    #[must_use]
    pub fn apply(&self, report: CoverageReport) -> Option<CoverageReport> {
        let key = self.canonicalize(report.source())?;
        Some(report.with_source(key))
    }

    /// Project root all keys are relative to
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Prefix prepended to every key
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

/// Resolve `.` and `..` components without touching the filesystem
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` above the root is the root
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}
