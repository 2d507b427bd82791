//! Session configuration
//!
//! Built in code through [`SessionConfig::builder`] or loaded from YAML:
//!
//! ```yaml
//! accumulation_dir: src/.merged_gcov
//! scratch_dir: src/.gcov
//! project_root: /work/avm
//! public_root: /work/avm/src/inc
//! private_root: /work/avm/src/private
//! namespace: avm
//! generator:
//!   program: gcov
//!   args: []
//! artifact_pattern: "_ffi_*.gcda"
//! stale_policy: discard
//! ```

use crate::coverage::{normalize_lexically, ScopeFilter};
use crate::result::{IoContext, SessionError, SessionResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What `start` does with an accumulation area left by an earlier session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StalePolicy {
    /// Delete it
    #[default]
    Discard,
    /// Move it to `<dir>.previous` for postmortem inspection
    Preserve,
}

/// External report generator invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Program to run
    pub program: String,
    /// Arguments placed before the artifact path
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            program: "gcov".to_string(),
            args: Vec::new(),
        }
    }
}

fn default_artifact_pattern() -> String {
    "_ffi_*.gcda".to_string()
}

/// Coverage session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Durable per-session output, one report per source unit
    pub accumulation_dir: PathBuf,
    /// Per-run raw report directory
    pub scratch_dir: PathBuf,
    /// Root canonical keys are relative to
    pub project_root: PathBuf,
    /// Public header tree of the library under test
    pub public_root: PathBuf,
    /// Private source tree of the library under test
    pub private_root: PathBuf,
    /// Prefix of every canonical key
    pub namespace: String,
    /// Report generator invocation
    #[serde(default)]
    pub generator: GeneratorConfig,
    /// Glob for coverage data artifacts inside a build directory
    #[serde(default = "default_artifact_pattern")]
    pub artifact_pattern: String,
    /// Handling of leftover state at `start`
    #[serde(default)]
    pub stale_policy: StalePolicy,
}

impl SessionConfig {
    /// Create a builder for session config
    #[must_use]
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Parse and validate a YAML document
    ///
    /// # Errors
    ///
    /// Returns `Yaml` on decode failure, `Config` if validation fails
    pub fn from_yaml_str(yaml: &str) -> SessionResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    ///
    /// Relative directories in the file are taken relative to the
    /// directory containing it, which is made absolute against the
    /// current directory.
    ///
    /// # Errors
    ///
    /// Returns `Filesystem` if the file or the current directory cannot be
    /// read, otherwise as [`Self::from_yaml_str`]
    pub fn from_yaml_file(path: &Path) -> SessionResult<Self> {
        let cwd = std::env::current_dir().at(Path::new("."))?;
        Self::from_yaml_file_in(path, &cwd)
    }

    /// [`Self::from_yaml_file`] with a relative `path` taken from `cwd`
    ///
    /// # Errors
    ///
    /// As [`Self::from_yaml_file`]
    pub fn from_yaml_file_in(path: &Path, cwd: &Path) -> SessionResult<Self> {
        let path = cwd.join(path);
        let text = std::fs::read_to_string(&path).at(&path)?;
        let config: Self = serde_yaml_ng::from_str(&text)?;
        // gcov names sources by absolute path, so roots must be absolute too
        let base = normalize_lexically(path.parent().unwrap_or(cwd));
        let config = config.relative_to(&base);
        config.validate()?;
        Ok(config)
    }

    /// Join every relative directory onto `base`
    #[must_use]
    pub fn relative_to(mut self, base: &Path) -> Self {
        for dir in [
            &mut self.accumulation_dir,
            &mut self.scratch_dir,
            &mut self.project_root,
            &mut self.public_root,
            &mut self.private_root,
        ] {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        self
    }

    /// Serialize to YAML
    ///
    /// # Errors
    ///
    /// Returns `Yaml` if serialization fails
    pub fn to_yaml(&self) -> SessionResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Scope filter described by this configuration
    ///
    /// # Errors
    ///
    /// Returns `Config` if the roots or namespace are invalid
    pub fn scope_filter(&self) -> SessionResult<ScopeFilter> {
        ScopeFilter::new(
            &self.project_root,
            &self.public_root,
            &self.private_root,
            &self.namespace,
        )
    }

    /// Check the configuration for consistency
    ///
    /// # Errors
    ///
    /// Returns `Config` describing the first problem found
    pub fn validate(&self) -> SessionResult<()> {
        self.scope_filter()?;

        let acc = &self.accumulation_dir;
        let scratch = &self.scratch_dir;
        if acc.as_os_str().is_empty() || scratch.as_os_str().is_empty() {
            return Err(SessionError::config(
                "accumulation_dir and scratch_dir must be set",
            ));
        }
        if acc.starts_with(scratch) || scratch.starts_with(acc) {
            return Err(SessionError::config(format!(
                "accumulation_dir {} and scratch_dir {} must be disjoint",
                acc.display(),
                scratch.display()
            )));
        }
        if self.generator.program.is_empty() {
            return Err(SessionError::config("generator program must be set"));
        }
        if self.artifact_pattern.is_empty() {
            return Err(SessionError::config("artifact_pattern must be set"));
        }
        Ok(())
    }
}

/// Builder for session configuration
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    accumulation_dir: PathBuf,
    scratch_dir: PathBuf,
    project_root: PathBuf,
    public_root: PathBuf,
    private_root: PathBuf,
    namespace: String,
    generator: GeneratorConfig,
    artifact_pattern: Option<String>,
    stale_policy: StalePolicy,
}

impl SessionConfigBuilder {
    /// Set the accumulation directory
    #[must_use]
    pub fn accumulation_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.accumulation_dir = dir.into();
        self
    }

    /// Set the scratch directory
    #[must_use]
    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    /// Set the project root
    #[must_use]
    pub fn project_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_root = dir.into();
        self
    }

    /// Set the public source root
    #[must_use]
    pub fn public_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.public_root = dir.into();
        self
    }

    /// Set the private source root
    #[must_use]
    pub fn private_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.private_root = dir.into();
        self
    }

    /// Set the key namespace
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the report generator program and arguments
    #[must_use]
    pub fn generator<I, S>(mut self, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.generator = GeneratorConfig {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        };
        self
    }

    /// Set the artifact glob
    #[must_use]
    pub fn artifact_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.artifact_pattern = Some(pattern.into());
        self
    }

    /// Set the stale state policy
    #[must_use]
    pub fn stale_policy(mut self, policy: StalePolicy) -> Self {
        self.stale_policy = policy;
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `Config` if validation fails
    pub fn build(self) -> SessionResult<SessionConfig> {
        let config = SessionConfig {
            accumulation_dir: self.accumulation_dir,
            scratch_dir: self.scratch_dir,
            project_root: self.project_root,
            public_root: self.public_root,
            private_root: self.private_root,
            namespace: self.namespace,
            generator: self.generator,
            artifact_pattern: self
                .artifact_pattern
                .unwrap_or_else(default_artifact_pattern),
            stale_policy: self.stale_policy,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn builder() -> SessionConfigBuilder {
        SessionConfig::builder()
            .accumulation_dir("/work/avm/src/.merged_gcov")
            .scratch_dir("/work/avm/src/.gcov")
            .project_root("/work/avm")
            .public_root("/work/avm/src/inc")
            .private_root("/work/avm/src/private")
            .namespace("avm")
    }

    #[test]
    fn test_builder_defaults() {
        let config = builder().build().unwrap();
        assert_eq!(config.generator.program, "gcov");
        assert!(config.generator.args.is_empty());
        assert_eq!(config.artifact_pattern, "_ffi_*.gcda");
        assert_eq!(config.stale_policy, StalePolicy::Discard);
    }

    #[test]
    fn test_builder_overrides() {
        let config = builder()
            .generator("llvm-cov", ["gcov"])
            .artifact_pattern("*.gcda")
            .stale_policy(StalePolicy::Preserve)
            .build()
            .unwrap();
        assert_eq!(config.generator.program, "llvm-cov");
        assert_eq!(config.generator.args, vec!["gcov".to_string()]);
        assert_eq!(config.artifact_pattern, "*.gcda");
        assert_eq!(config.stale_policy, StalePolicy::Preserve);
    }

    #[test]
    fn test_overlapping_dirs_rejected() {
        let err = builder()
            .scratch_dir("/work/avm/src/.merged_gcov/raw")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("disjoint"));
    }

    #[test]
    fn test_missing_dirs_rejected() {
        let err = SessionConfig::builder()
            .project_root("/p")
            .public_root("/p/inc")
            .private_root("/p/src")
            .namespace("p")
            .build()
            .unwrap_err();
        assert!(matches!(err, SessionError::Config { .. }));
    }

    #[test]
    fn test_root_outside_project_rejected() {
        assert!(builder().public_root("/elsewhere").build().is_err());
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = builder().stale_policy(StalePolicy::Preserve).build().unwrap();
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("stale_policy: preserve"));
        assert_eq!(SessionConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn test_yaml_defaults_applied() {
        let yaml = "
accumulation_dir: out/merged
scratch_dir: out/raw
project_root: /work/avm
public_root: /work/avm/src/inc
private_root: /work/avm/src/private
namespace: avm
";
        let config = SessionConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.generator, GeneratorConfig::default());
        assert_eq!(config.artifact_pattern, "_ffi_*.gcda");
        assert_eq!(config.stale_policy, StalePolicy::Discard);
    }

    #[test]
    fn test_yaml_missing_field_is_error() {
        let err = SessionConfig::from_yaml_str("namespace: avm\n").unwrap_err();
        assert!(matches!(err, SessionError::Yaml(_)));
    }

    #[test]
    fn test_from_yaml_file_missing() {
        let err = SessionConfig::from_yaml_file(Path::new("/nonexistent/gcov-session.yaml"))
            .unwrap_err();
        assert!(matches!(err, SessionError::Filesystem { .. }));
    }

    #[test]
    fn test_from_yaml_file_resolves_relative_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gcov-session.yaml");
        std::fs::write(
            &path,
            "accumulation_dir: avm/src/.merged_gcov\n\
             scratch_dir: avm/src/.gcov\n\
             project_root: avm\n\
             public_root: avm/src/inc\n\
             private_root: avm/src/private\n\
             namespace: avm\n",
        )
        .unwrap();
        let config = SessionConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.project_root, dir.path().join("avm"));
        assert_eq!(config.scratch_dir, dir.path().join("avm/src/.gcov"));
    }

    #[test]
    fn test_relative_config_path_yields_absolute_roots() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("gcov-session.yaml"),
            "accumulation_dir: .merged_gcov\n\
             scratch_dir: .gcov\n\
             project_root: .\n\
             public_root: src/inc\n\
             private_root: src/private\n\
             namespace: avm\n",
        )
        .unwrap();
        let config =
            SessionConfig::from_yaml_file_in(Path::new("gcov-session.yaml"), dir.path()).unwrap();
        assert!(config.project_root.is_absolute());
        assert!(config.accumulation_dir.is_absolute());

        let source = dir.path().join("src/inc/x.h");
        let key = config
            .scope_filter()
            .unwrap()
            .canonicalize(&source.to_string_lossy());
        assert_eq!(key.as_deref(), Some("avm/src/inc/x.h"));
    }

    #[test]
    fn test_relative_to_keeps_absolute_dirs() {
        let mut config = SessionConfig::builder()
            .accumulation_dir("/work/avm/src/.merged_gcov")
            .scratch_dir("/work/avm/src/.gcov")
            .project_root("/work/avm")
            .public_root("/work/avm/src/inc")
            .private_root("/work/avm/src/private")
            .namespace("avm")
            .build()
            .unwrap();
        config.public_root = PathBuf::from("inc");
        let config = config.relative_to(Path::new("/cfg"));
        assert_eq!(config.project_root, PathBuf::from("/work/avm"));
        assert_eq!(config.public_root, PathBuf::from("/cfg/inc"));
    }
}
