//! Disposable Postgres containers for integration tests.
//!
//! Requires the `docker` CLI on `PATH` and a reachable Docker daemon.
//!
//! ```ignore
//! let opts = TestDbOptions::default();
//! let mut util = TestUtil::new();
//! util.setup_postgres_container(&opts).await?;
//! let pool = util.connect_db(&opts).await?;
//! util.migrate_up(&pool, &["migrations/0001_init.sql"]).await?;
//! // ...
//! util.purge().await?;
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::process::Command;
use tokio::time::Instant;

/// Error type for the container harness
#[derive(Debug, thiserror::Error)]
pub enum TestUtilError {
    #[error("could not connect to Docker: {0}")]
    DockerUnavailable(String),

    #[error("could not start resource: {0}")]
    ContainerStart(String),

    #[error("container is not initialized")]
    NotInitialized,

    #[error("could not connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("could not read migrate SQL file {path}: {source}")]
    ReadMigration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not execute migrate SQL {path}: {source}")]
    Migrate {
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },

    #[error("could not purge resource: {0}")]
    Purge(String),

    #[error("docker command failed: {0}")]
    Docker(String),

    #[error("could not run docker: {0}")]
    Io(#[from] std::io::Error),
}

pub type TestUtilResult<T> = Result<T, TestUtilError>;

/// Database credentials the container is created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDbOptions {
    pub user: String,
    pub password: String,
    pub db_name: String,
}

impl Default for TestDbOptions {
    fn default() -> Self {
        Self {
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            db_name: "test_db".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerOptions {
    pub image: String,
    pub tag: String,
    /// Upper bound on the readiness poll in [`TestUtil::connect_db`].
    pub max_wait: Duration,
    pub retry_interval: Duration,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            image: "postgres".to_string(),
            tag: "14".to_string(),
            max_wait: Duration::from_secs(20),
            retry_interval: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone)]
struct Container {
    id: String,
    host_port: String,
}

/// Owns at most one running Postgres container.
#[derive(Debug, Default)]
pub struct TestUtil {
    options: ContainerOptions,
    container: Option<Container>,
}

impl TestUtil {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ContainerOptions) -> Self {
        Self {
            options,
            container: None,
        }
    }

    /// Start a Postgres container configured with `o`.
    ///
    /// The container is removed when stopped and never restarted.
    pub async fn setup_postgres_container(&mut self, o: &TestDbOptions) -> TestUtilResult<()> {
        docker(&["version", "--format", "{{.Server.Version}}"])
            .await
            .map_err(|e| TestUtilError::DockerUnavailable(e.to_string()))?;

        let name = format!("handyman-pg-{}", uuid::Uuid::new_v4().simple());
        let args = self.run_args(o, &name);
        let id = docker(&args.iter().map(String::as_str).collect::<Vec<_>>())
            .await
            .map_err(|e| TestUtilError::ContainerStart(e.to_string()))?;

        // Record the id first so a failed port lookup still gets cleaned up.
        self.container = Some(Container {
            id: id.clone(),
            host_port: String::new(),
        });

        let ports = docker(&["port", &id, "5432/tcp"])
            .await
            .map_err(|e| TestUtilError::ContainerStart(e.to_string()))?;
        let host_port = ports
            .lines()
            .next()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| TestUtilError::ContainerStart("no published port for 5432/tcp".to_string()))?
            .to_string();

        tracing::info!(container = %name, %host_port, "postgres container started");
        self.container = Some(Container { id, host_port });
        Ok(())
    }

    /// Connection URL for the running container. Credentials and database
    /// name are percent-encoded.
    pub fn database_url(&self, o: &TestDbOptions) -> TestUtilResult<String> {
        let container = self.container.as_ref().ok_or(TestUtilError::NotInitialized)?;
        Ok(format!(
            "postgres://{}:{}@{}/{}?sslmode=disable",
            urlencoding::encode(&o.user),
            urlencoding::encode(&o.password),
            container.host_port,
            urlencoding::encode(&o.db_name)
        ))
    }

    /// Connect to the container's database, polling until it is ready.
    ///
    /// A started container may not accept connections yet, so this retries
    /// every `retry_interval` until `max_wait` has elapsed.
    pub async fn connect_db(&self, o: &TestDbOptions) -> TestUtilResult<PgPool> {
        let url = self.database_url(o)?;
        let deadline = Instant::now() + self.options.max_wait;

        loop {
            match try_connect(&url).await {
                Ok(pool) => return Ok(pool),
                Err(e) if Instant::now() >= deadline => return Err(TestUtilError::Connect(e)),
                Err(e) => {
                    tracing::debug!(error = %e, "database not ready yet");
                    tokio::time::sleep(self.options.retry_interval).await;
                }
            }
        }
    }

    /// Execute each SQL file against `pool`, in order.
    pub async fn migrate_up<P: AsRef<Path>>(&self, pool: &PgPool, paths: &[P]) -> TestUtilResult<()> {
        if self.container.is_none() {
            return Err(TestUtilError::NotInitialized);
        }

        for path in paths {
            let path = path.as_ref();
            let sql = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| TestUtilError::ReadMigration {
                    path: path.to_path_buf(),
                    source,
                })?;

            sqlx::raw_sql(&sql)
                .execute(pool)
                .await
                .map_err(|source| TestUtilError::Migrate {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Remove the container. Does nothing if none is running.
    pub async fn purge(&mut self) -> TestUtilResult<()> {
        let Some(container) = self.container.take() else {
            return Ok(());
        };

        docker(&["rm", "--force", "--volumes", &container.id])
            .await
            .map_err(|e| TestUtilError::Purge(e.to_string()))?;
        tracing::info!(container = %container.id, "postgres container purged");
        Ok(())
    }

    fn run_args(&self, o: &TestDbOptions, name: &str) -> Vec<String> {
        vec![
            "run".to_string(),
            "--detach".to_string(),
            "--rm".to_string(),
            "--restart".to_string(),
            "no".to_string(),
            "--name".to_string(),
            name.to_string(),
            "--env".to_string(),
            format!("POSTGRES_PASSWORD={}", o.password),
            "--env".to_string(),
            format!("POSTGRES_USER={}", o.user),
            "--env".to_string(),
            format!("POSTGRES_DB={}", o.db_name),
            "--publish".to_string(),
            "127.0.0.1::5432".to_string(),
            format!("{}:{}", self.options.image, self.options.tag),
            "-c".to_string(),
            "listen_addresses=*".to_string(),
        ]
    }
}

impl Drop for TestUtil {
    fn drop(&mut self) {
        let Some(container) = self.container.take() else {
            return;
        };

        let removed = std::process::Command::new("docker")
            .args(["rm", "--force", "--volumes", &container.id])
            .output();
        match removed {
            Ok(out) if out.status.success() => {}
            Ok(out) => tracing::warn!(
                container = %container.id,
                stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                "could not purge resource"
            ),
            Err(e) => tracing::warn!(container = %container.id, error = %e, "could not purge resource"),
        }
    }
}

async fn try_connect(url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(2))
        .connect(url)
        .await?;
    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(pool)
}

/// Run `docker` with `args` and return its trimmed stdout.
async fn docker(args: &[&str]) -> TestUtilResult<String> {
    let out = Command::new("docker").args(args).output().await?;
    if !out.status.success() {
        return Err(TestUtilError::Docker(format!(
            "docker {} exited with {}: {}",
            args.first().copied().unwrap_or_default(),
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
}
