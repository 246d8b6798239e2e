//! Provisioning manifest (stackup.toml) and environment file loading
//!
//! The manifest is loaded once, validated, and passed around by reference;
//! nothing mutates it afterwards. Environment files are parsed into an
//! immutable map handed to child processes - the orchestrator's own process
//! environment is never touched.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::unit::{RestartPolicy, UnitKind};

/// Immutable key=value environment loaded from an env file
pub type EnvVars = BTreeMap<String, String>;

/// The provisioning manifest
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub host: HostConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default, rename = "project")]
    pub projects: Vec<ProjectConfig>,

    pub database: DatabaseConfig,

    #[serde(default)]
    pub migration: Option<MigrationConfig>,

    #[serde(default, rename = "service")]
    pub services: Vec<ServiceConfig>,

    #[serde(default)]
    pub readiness: ReadinessConfig,
}

/// Host-level concerns: system packages and the optional env file
#[derive(Debug, Default, Deserialize)]
pub struct HostConfig {
    /// System packages the deployment needs (apt names)
    #[serde(default)]
    pub packages: Vec<String>,

    /// Env file exported to child processes; when set, the file must exist
    pub env_file: Option<String>,
}

/// Runtime pinning
#[derive(Debug, Deserialize)]
pub struct RuntimeConfig {
    /// package.json to read `engines.node` from; when unset the default
    /// version is used directly
    pub manifest: Option<String>,

    /// Fallback when no manifest is configured at all
    #[serde(default = "default_runtime_version")]
    pub default_version: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            manifest: None,
            default_version: default_runtime_version(),
        }
    }
}

/// One project directory whose dependencies get installed
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    pub dir: String,

    #[serde(default = "default_install_command")]
    pub install_command: String,
}

/// Database server and credential configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub user: String,
    pub password: String,
    /// Database name the user is scoped to
    pub name: String,

    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    /// Unit name of the database server under the service manager
    #[serde(default = "default_db_service")]
    pub service: String,
}

/// Schema migration invocation
#[derive(Debug, Clone, Deserialize)]
pub struct MigrationConfig {
    /// Project directory the migration CLI runs in
    pub dir: String,

    /// Deploy-mode command; never the interactive dev mode
    #[serde(default = "default_migrate_command")]
    pub command: String,
}

/// One long-running (or oneshot) process to register
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub command: String,
    pub dir: String,

    pub description: Option<String>,

    #[serde(default)]
    pub kind: UnitKind,

    #[serde(default)]
    pub restart: RestartPolicy,

    /// Start at boot
    #[serde(default = "default_true")]
    pub enable: bool,

    /// Extra environment baked into the unit (non-secret values only)
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// TCP port polled by the readiness gate after start
    pub port: Option<u16>,
}

/// Readiness poll tuning
#[derive(Debug, Clone, Deserialize)]
pub struct ReadinessConfig {
    #[serde(default = "default_readiness_interval")]
    pub interval_secs: u64,

    #[serde(default = "default_readiness_attempts")]
    pub max_attempts: u32,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_readiness_interval(),
            max_attempts: default_readiness_attempts(),
        }
    }
}

fn default_runtime_version() -> String {
    runtimekit::DEFAULT_VERSION.to_string()
}

fn default_install_command() -> String {
    "npm install".to_string()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    3306
}

fn default_db_service() -> String {
    "mysql".to_string()
}

fn default_migrate_command() -> String {
    "npx prisma migrate deploy".to_string()
}

fn default_true() -> bool {
    true
}

fn default_readiness_interval() -> u64 {
    3
}

fn default_readiness_attempts() -> u32 {
    30
}

impl Manifest {
    /// Load and validate a manifest from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let manifest: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid manifest format in {}", path.display()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Structural validation beyond what serde enforces
    pub fn validate(&self) -> Result<()> {
        if self.database.user.is_empty() || self.database.name.is_empty() {
            bail!("database user and name must not be empty");
        }
        if self.database.port == 0 {
            bail!("database port must not be 0");
        }
        if self.readiness.max_attempts == 0 {
            bail!("readiness max_attempts must be at least 1");
        }

        let mut seen = BTreeSet::new();
        for service in &self.services {
            if service.name.is_empty() {
                bail!("service name must not be empty");
            }
            if !seen.insert(service.name.as_str()) {
                bail!("duplicate service name: {}", service.name);
            }
            if service.port == Some(0) {
                bail!("service {}: port must not be 0", service.name);
            }
        }

        for project in &self.projects {
            if project.dir.is_empty() {
                bail!("project dir must not be empty");
            }
        }

        Ok(())
    }
}

/// Resolve a manifest-declared directory against the manifest's location
///
/// Absolute paths and `~` expansions pass through; relative paths are
/// anchored at the manifest's parent directory.
pub fn resolve_dir(base: &Path, raw: &str) -> PathBuf {
    let expanded = shellexpand::tilde(raw);
    let path = Path::new(expanded.as_ref());
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Load an env file into an immutable map
pub fn load_env_file(path: &Path) -> Result<EnvVars> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read env file {}", path.display()))?;
    Ok(parse_env(&content))
}

/// Parse key=value lines; comments and blanks are skipped
///
/// An optional `export ` prefix and surrounding quotes on the value are
/// stripped so ordinary dotenv files load as-is.
pub fn parse_env(content: &str) -> EnvVars {
    let mut vars = EnvVars::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
            .unwrap_or(value);

        vars.insert(key.to_string(), value.to_string());
    }

    vars
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [database]
        user = "app"
        password = "secret"
        name = "appdb"
    "#;

    #[test]
    fn test_minimal_manifest_defaults() {
        let manifest: Manifest = toml::from_str(MINIMAL).unwrap();
        manifest.validate().unwrap();

        assert!(manifest.host.packages.is_empty());
        assert_eq!(manifest.runtime.default_version, "16");
        assert_eq!(manifest.database.host, "localhost");
        assert_eq!(manifest.database.port, 3306);
        assert_eq!(manifest.database.service, "mysql");
        assert_eq!(manifest.readiness.interval_secs, 3);
        assert_eq!(manifest.readiness.max_attempts, 30);
        assert!(manifest.migration.is_none());
    }

    #[test]
    fn test_full_manifest() {
        let manifest: Manifest = toml::from_str(
            r#"
            [host]
            packages = ["mysql-server", "curl"]
            env_file = ".env"

            [runtime]
            manifest = "backend/package.json"

            [[project]]
            dir = "backend"

            [[project]]
            dir = "frontend"
            install_command = "npm ci"

            [database]
            user = "app"
            password = "secret"
            name = "appdb"
            port = 3307

            [migration]
            dir = "backend"

            [[service]]
            name = "backend"
            command = "node server.js"
            dir = "backend"
            port = 5000

            [readiness]
            interval_secs = 5
            max_attempts = 12
            "#,
        )
        .unwrap();
        manifest.validate().unwrap();

        assert_eq!(manifest.host.packages, vec!["mysql-server", "curl"]);
        assert_eq!(manifest.host.env_file.as_deref(), Some(".env"));
        assert_eq!(manifest.projects.len(), 2);
        assert_eq!(manifest.projects[0].install_command, "npm install");
        assert_eq!(manifest.projects[1].install_command, "npm ci");
        assert_eq!(manifest.database.port, 3307);
        assert_eq!(
            manifest.migration.as_ref().unwrap().command,
            "npx prisma migrate deploy"
        );
        assert_eq!(manifest.services[0].port, Some(5000));
        assert_eq!(manifest.readiness.interval_secs, 5);
    }

    #[test]
    fn test_validate_rejects_duplicate_service_names() {
        let manifest: Manifest = toml::from_str(
            r#"
            [database]
            user = "app"
            password = "secret"
            name = "appdb"

            [[service]]
            name = "backend"
            command = "a"
            dir = "x"

            [[service]]
            name = "backend"
            command = "b"
            dir = "y"
            "#,
        )
        .unwrap();

        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate service name"));
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut manifest: Manifest = toml::from_str(MINIMAL).unwrap();
        manifest.readiness.max_attempts = 0;
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("stackup.toml");
        std::fs::write(&path, MINIMAL).unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.database.user, "app");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Manifest::load(Path::new("/nonexistent/stackup.toml")).unwrap_err();
        assert!(err.to_string().contains("Could not read"));
    }

    #[test]
    fn test_resolve_dir() {
        let base = Path::new("/srv/app");
        assert_eq!(
            resolve_dir(base, "backend"),
            PathBuf::from("/srv/app/backend")
        );
        assert_eq!(resolve_dir(base, "/opt/other"), PathBuf::from("/opt/other"));
    }

    #[test]
    fn test_parse_env() {
        let vars = parse_env(
            r#"
            # comment
            DB_HOST=localhost
            export DB_PORT=3306
            QUOTED="hello world"
            SINGLE='x'
            EMPTY=

            not a pair
            "#,
        );

        assert_eq!(vars.get("DB_HOST").unwrap(), "localhost");
        assert_eq!(vars.get("DB_PORT").unwrap(), "3306");
        assert_eq!(vars.get("QUOTED").unwrap(), "hello world");
        assert_eq!(vars.get("SINGLE").unwrap(), "x");
        assert_eq!(vars.get("EMPTY").unwrap(), "");
        assert_eq!(vars.len(), 5);
    }

    #[test]
    fn test_load_env_file_missing_is_an_error() {
        let err = load_env_file(Path::new("/nonexistent/.env")).unwrap_err();
        assert!(err.to_string().contains("Could not read env file"));
    }
}
