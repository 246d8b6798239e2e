//! MySQL provisioning - database, user, and grants
//!
//! All SQL goes through the [`MysqlClient`] trait so the provisioning steps
//! can be exercised against a fake in tests. The real client shells out to
//! the mysql CLI as root over the local socket, which is how the database
//! looks right after `apt-get install mysql-server`.

use std::process::Command;
use thiserror::Error;

use crate::config::DatabaseConfig;

/// Host written into created accounts; the deployment connects locally
const USER_HOST: &str = "localhost";

/// Errors from database provisioning
#[derive(Debug, Error)]
pub enum DbError {
    /// The database server could not be started
    #[error("database server failed to start: {stderr}")]
    StartFailed {
        stderr: String,
    },

    /// CREATE DATABASE failed
    #[error("database creation failed for {name}: {stderr}")]
    DatabaseCreation {
        name: String,
        stderr: String,
    },

    /// CREATE USER failed
    #[error("user creation failed for {user}: {stderr}")]
    UserCreation {
        user: String,
        stderr: String,
    },

    /// GRANT or FLUSH PRIVILEGES failed
    #[error("privilege grant failed for {user}: {stderr}")]
    PrivilegeGrant {
        user: String,
        stderr: String,
    },

    /// The mysql client itself failed (spawn error, bad exit, bad output)
    #[error("mysql client failed: {message}")]
    Client {
        message: String,
    },
}

/// Minimal SQL execution seam
pub trait MysqlClient: Send + Sync {
    /// Run a statement and return its batch-mode output
    fn query(&self, sql: &str) -> Result<String, DbError>;

    /// Run a statement, discarding output
    fn execute(&self, sql: &str) -> Result<(), DbError> {
        self.query(sql).map(|_| ())
    }
}

/// Real client shelling out to the mysql CLI (root socket auth)
pub struct MysqlCli;

impl MysqlClient for MysqlCli {
    fn query(&self, sql: &str) -> Result<String, DbError> {
        let output = Command::new("mysql")
            .args(["-N", "-B", "-e", sql])
            .output()
            .map_err(|e| DbError::Client {
                message: format!("failed to execute mysql: {e}"),
            })?;

        if !output.status.success() {
            return Err(DbError::Client {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Idempotent database/user/grant provisioning against one server
pub struct MysqlAdmin {
    client: Box<dyn MysqlClient>,
    config: DatabaseConfig,
}

impl MysqlAdmin {
    /// Admin over the real mysql CLI
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            client: Box::new(MysqlCli),
            config,
        }
    }

    /// Admin over a custom client (useful for testing)
    pub fn with_client(config: DatabaseConfig, client: Box<dyn MysqlClient>) -> Self {
        Self { client, config }
    }

    /// The credential configuration this admin provisions
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Existence probe for the configured database
    pub fn database_exists(&self) -> Result<bool, DbError> {
        let out = self.client.query(&format!(
            "SHOW DATABASES LIKE '{}'",
            escape_str(&self.config.name)
        ))?;
        Ok(!out.trim().is_empty())
    }

    /// Create the configured database
    pub fn create_database(&self) -> Result<(), DbError> {
        self.client
            .execute(&format!(
                "CREATE DATABASE `{}`",
                escape_ident(&self.config.name)
            ))
            .map_err(|e| DbError::DatabaseCreation {
                name: self.config.name.clone(),
                stderr: e.to_string(),
            })
    }

    /// Existence probe for the configured user at localhost
    pub fn user_exists(&self) -> Result<bool, DbError> {
        let out = self.client.query(&format!(
            "SELECT COUNT(*) FROM mysql.user WHERE user = '{}' AND host = '{USER_HOST}'",
            escape_str(&self.config.user)
        ))?;
        parse_count(&out).map(|n| n > 0)
    }

    /// Create the configured user with its password
    ///
    /// Never called when the user already exists; an existing account is
    /// left untouched, password included.
    pub fn create_user(&self) -> Result<(), DbError> {
        self.client
            .execute(&format!(
                "CREATE USER '{}'@'{USER_HOST}' IDENTIFIED BY '{}'",
                escape_str(&self.config.user),
                escape_str(&self.config.password)
            ))
            .map_err(|e| DbError::UserCreation {
                user: self.config.user.clone(),
                stderr: e.to_string(),
            })
    }

    /// (Re-)issue the grant and flush privileges
    ///
    /// No existence probe: re-granting identical privileges is a no-op on
    /// the server, so this runs unconditionally on every pipeline pass.
    pub fn grant_privileges(&self) -> Result<(), DbError> {
        let wrap = |e: DbError| DbError::PrivilegeGrant {
            user: self.config.user.clone(),
            stderr: e.to_string(),
        };

        self.client
            .execute(&format!(
                "GRANT ALL PRIVILEGES ON `{}`.* TO '{}'@'{USER_HOST}'",
                escape_ident(&self.config.name),
                escape_str(&self.config.user)
            ))
            .map_err(wrap)?;

        self.client.execute("FLUSH PRIVILEGES").map_err(wrap)
    }
}

/// Escape a value for a single-quoted SQL string
fn escape_str(s: &str) -> String {
    s.replace('\\', r"\\").replace('\'', "''")
}

/// Escape a name for a backtick-quoted identifier
fn escape_ident(s: &str) -> String {
    s.replace('`', "``")
}

/// Parse a single COUNT(*) value out of batch-mode output
fn parse_count(out: &str) -> Result<u64, DbError> {
    out.trim().parse().map_err(|_| DbError::Client {
        message: format!("unexpected count output: {out:?}"),
    })
}
