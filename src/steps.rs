//! Pipeline step adapters
//!
//! Binds the components (package backend, runtime installer, dependency
//! installer, database admin, service manager, readiness probe) into
//! [`pipeline::Step`] implementations and assembles them into the fixed
//! provisioning order:
//!
//! packages -> runtime -> project deps -> database (service, database,
//! user, grants) -> migrations -> services -> readiness.
//!
//! Steps whose action is naturally idempotent at the tool level (grants,
//! migrations, dependency install) report "not satisfied" unconditionally;
//! everything else carries a real existence probe.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pipeline::{Plan, Step};
use runtimekit::NvmInstaller;
use syspkg::Backend;

use crate::config::{EnvVars, Manifest, resolve_dir};
use crate::db::{DbError, MysqlAdmin};
use crate::deps::DependencyInstaller;
use crate::migrate::SchemaMigrator;
use crate::readiness::{self, ReadinessTarget};
use crate::service::ServiceManager;
use crate::unit::{ServiceUnit, build_units};

/// Readiness polls target the host the services were just started on
const LOCAL_HOST: &str = "127.0.0.1";

/// The component set a plan is built against
///
/// Every member is a seam: production wiring uses the real apt/nvm/mysql/
/// systemd implementations, tests substitute mocks.
pub struct Components {
    pub packages: Arc<dyn Backend>,
    pub runtime: Arc<NvmInstaller>,
    pub database: Arc<MysqlAdmin>,
    pub services: Arc<dyn ServiceManager>,
}

/// Assemble the full provisioning plan in dependency order
pub fn build_plan(
    manifest: &Manifest,
    base: &Path,
    env: &EnvVars,
    components: &Components,
    user: &str,
) -> Plan {
    let mut plan = Plan::new();

    for package in &manifest.host.packages {
        plan.push(Box::new(PackageStep {
            backend: components.packages.clone(),
            package: package.clone(),
        }));
    }

    let source = match &manifest.runtime.manifest {
        Some(path) => VersionSource::Manifest(resolve_dir(base, path)),
        None => VersionSource::Fixed(manifest.runtime.default_version.clone()),
    };
    plan.push(Box::new(RuntimeStep {
        source,
        installer: components.runtime.clone(),
    }));

    let deps = Arc::new(DependencyInstaller::new(env.clone()));
    for project in &manifest.projects {
        plan.push(Box::new(DepsStep {
            installer: deps.clone(),
            dir: resolve_dir(base, &project.dir),
            command: project.install_command.clone(),
        }));
    }

    plan.push(Box::new(DbServiceStep {
        manager: components.services.clone(),
        service: manifest.database.service.clone(),
    }));
    plan.push(Box::new(DbDatabaseStep {
        admin: components.database.clone(),
    }));
    plan.push(Box::new(DbUserStep {
        admin: components.database.clone(),
    }));
    plan.push(Box::new(DbGrantStep {
        admin: components.database.clone(),
    }));

    if let Some(migration) = &manifest.migration {
        plan.push(Box::new(MigrateStep {
            migrator: SchemaMigrator::new(
                resolve_dir(base, &migration.dir),
                &migration.command,
                &manifest.database,
                env.clone(),
            ),
        }));
    }

    for unit in build_units(manifest, base, user) {
        plan.push(Box::new(ServiceStep {
            manager: components.services.clone(),
            unit,
        }));
    }

    for service in &manifest.services {
        if let Some(port) = service.port {
            plan.push(Box::new(ReadinessStep {
                name: service.name.clone(),
                target: ReadinessTarget::from_config(LOCAL_HOST, port, &manifest.readiness),
            }));
        }
    }

    plan
}

// ============================================================================
// Packages
// ============================================================================

struct PackageStep {
    backend: Arc<dyn Backend>,
    package: String,
}

impl Step for PackageStep {
    fn name(&self) -> String {
        format!("package:{}", self.package)
    }

    fn description(&self) -> String {
        format!("Install system package {}", self.package)
    }

    fn is_satisfied(&self) -> Result<bool> {
        Ok(self.backend.is_installed(&self.package)?)
    }

    fn apply(&self) -> Result<()> {
        self.backend.update()?;
        self.backend.install(&self.package)?;
        Ok(())
    }
}

// ============================================================================
// Runtime
// ============================================================================

enum VersionSource {
    /// Read engines.node from a package.json at apply time
    Manifest(PathBuf),
    /// Use a fixed version directly
    Fixed(String),
}

struct RuntimeStep {
    source: VersionSource,
    installer: Arc<NvmInstaller>,
}

impl RuntimeStep {
    fn resolve(&self) -> Result<String> {
        match &self.source {
            VersionSource::Manifest(path) => Ok(runtimekit::resolve_version(path)?),
            VersionSource::Fixed(version) => Ok(version.clone()),
        }
    }
}

impl Step for RuntimeStep {
    fn name(&self) -> String {
        "runtime:node".to_string()
    }

    fn description(&self) -> String {
        "Install pinned Node.js runtime".to_string()
    }

    fn is_satisfied(&self) -> Result<bool> {
        if !self.installer.is_manager_installed() {
            return Ok(false);
        }
        let version = self.resolve()?;
        Ok(self.installer.is_version_installed(&version)?)
    }

    fn apply(&self) -> Result<()> {
        if !self.installer.is_manager_installed() {
            self.installer.install_manager()?;
        }
        let version = self.resolve()?;
        self.installer.install(&version)?;
        Ok(())
    }
}

// ============================================================================
// Project dependencies
// ============================================================================

struct DepsStep {
    installer: Arc<DependencyInstaller>,
    dir: PathBuf,
    command: String,
}

impl Step for DepsStep {
    fn name(&self) -> String {
        format!("deps:{}", self.dir.display())
    }

    fn description(&self) -> String {
        format!("Install project dependencies in {}", self.dir.display())
    }

    fn is_satisfied(&self) -> Result<bool> {
        // The install command converges on its own; re-running is safe
        Ok(false)
    }

    fn apply(&self) -> Result<()> {
        self.installer.install(&self.dir, &self.command)?;
        Ok(())
    }
}

// ============================================================================
// Database
// ============================================================================

struct DbServiceStep {
    manager: Arc<dyn ServiceManager>,
    service: String,
}

impl Step for DbServiceStep {
    fn name(&self) -> String {
        "db:service".to_string()
    }

    fn description(&self) -> String {
        format!("Start database server ({})", self.service)
    }

    fn is_satisfied(&self) -> Result<bool> {
        Ok(self.manager.is_active(&self.service))
    }

    fn apply(&self) -> Result<()> {
        self.manager.start(&self.service).map_err(|e| {
            DbError::StartFailed {
                stderr: e.to_string(),
            }
        })?;
        Ok(())
    }
}

struct DbDatabaseStep {
    admin: Arc<MysqlAdmin>,
}

impl Step for DbDatabaseStep {
    fn name(&self) -> String {
        "db:database".to_string()
    }

    fn description(&self) -> String {
        format!("Create database {}", self.admin.config().name)
    }

    fn is_satisfied(&self) -> Result<bool> {
        Ok(self.admin.database_exists()?)
    }

    fn apply(&self) -> Result<()> {
        self.admin.create_database()?;
        Ok(())
    }
}

struct DbUserStep {
    admin: Arc<MysqlAdmin>,
}

impl Step for DbUserStep {
    fn name(&self) -> String {
        "db:user".to_string()
    }

    fn description(&self) -> String {
        format!("Create database user {}", self.admin.config().user)
    }

    fn is_satisfied(&self) -> Result<bool> {
        Ok(self.admin.user_exists()?)
    }

    fn apply(&self) -> Result<()> {
        self.admin.create_user()?;
        Ok(())
    }
}

struct DbGrantStep {
    admin: Arc<MysqlAdmin>,
}

impl Step for DbGrantStep {
    fn name(&self) -> String {
        "db:grant".to_string()
    }

    fn description(&self) -> String {
        format!(
            "Grant privileges on {} to {}",
            self.admin.config().name,
            self.admin.config().user
        )
    }

    fn is_satisfied(&self) -> Result<bool> {
        // Re-granting identical privileges is a no-op on the server
        Ok(false)
    }

    fn apply(&self) -> Result<()> {
        self.admin.grant_privileges()?;
        Ok(())
    }
}

// ============================================================================
// Migrations
// ============================================================================

struct MigrateStep {
    migrator: SchemaMigrator,
}

impl Step for MigrateStep {
    fn name(&self) -> String {
        "db:migrate".to_string()
    }

    fn description(&self) -> String {
        format!("Apply schema migrations in {}", self.migrator.dir().display())
    }

    fn is_satisfied(&self) -> Result<bool> {
        // Deploy mode is a no-op against an up-to-date schema
        Ok(false)
    }

    fn apply(&self) -> Result<()> {
        self.migrator.apply()?;
        Ok(())
    }
}

// ============================================================================
// Services
// ============================================================================

struct ServiceStep {
    manager: Arc<dyn ServiceManager>,
    unit: ServiceUnit,
}

impl Step for ServiceStep {
    fn name(&self) -> String {
        format!("service:{}", self.unit.name)
    }

    fn description(&self) -> String {
        format!("Register and start service {}", self.unit.name)
    }

    fn is_satisfied(&self) -> Result<bool> {
        let enabled_ok = !self.unit.enable || self.manager.is_enabled(&self.unit.name);
        Ok(self.manager.unit_current(&self.unit)
            && enabled_ok
            && self.manager.is_active(&self.unit.name))
    }

    fn apply(&self) -> Result<()> {
        let changed = self.manager.write_unit(&self.unit)?;
        if changed {
            self.manager.daemon_reload()?;
        }
        if self.unit.enable {
            self.manager.enable(&self.unit.name)?;
        }
        self.manager.start(&self.unit.name)?;
        Ok(())
    }
}

// ============================================================================
// Readiness
// ============================================================================

struct ReadinessStep {
    name: String,
    target: ReadinessTarget,
}

impl Step for ReadinessStep {
    fn name(&self) -> String {
        format!("ready:{}", self.name)
    }

    fn description(&self) -> String {
        format!(
            "Wait for {} to accept connections on port {}",
            self.name, self.target.port
        )
    }

    fn is_satisfied(&self) -> Result<bool> {
        Ok(readiness::check(&self.target))
    }

    fn apply(&self) -> Result<()> {
        readiness::wait_until_ready(&self.target)?;
        Ok(())
    }
}
