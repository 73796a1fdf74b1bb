//! Choosing a storage backend at startup.
//!
//! Backend crates export a [`RepositoryFactory`]; the binary registers the
//! ones it links and opens whichever [`DbConfig::backend`] names.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::repository::{CommissionRepository, RepositoryError};

/// Where to store record snapshots.
///
/// `connection_string` is handed to the backend untouched: a file path or
/// `:memory:` for `sqlite`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        }
    }
}

impl DbConfig {
    /// Builds a config from the `--backend` / `--db` command-line pair.
    ///
    /// Storage is optional: without a connection string there is nothing to
    /// open and this returns `None`. Backend names are matched lowercase.
    pub fn from_flags(
        backend: &str,
        connection_string: Option<String>,
    ) -> Option<Self> {
        let connection_string = connection_string?;
        Some(Self {
            backend: backend.trim().to_ascii_lowercase(),
            connection_string,
        })
    }
}

/// Opens repositories for one backend.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Lowercase name matched against [`DbConfig::backend`].
    fn backend_name(&self) -> &'static str;

    /// Opens the store described by `config`, ready for saves.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn CommissionRepository>, RepositoryError>;
}

/// Backends linked into the running binary, by name.
#[derive(Default)]
pub struct RepositoryRegistry {
    factories: BTreeMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `factory`, replacing any factory registered under the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Registered backend names in alphabetical order.
    pub fn available_backends(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    /// Opens a repository through the factory named by `config.backend`.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::Configuration`] when no such backend is registered;
    /// otherwise whatever the factory returns.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn CommissionRepository>, RepositoryError> {
        let Some(factory) = self.factories.get(config.backend.as_str()) else {
            return Err(RepositoryError::Configuration(format!(
                "unknown backend '{}'; registered: {}",
                config.backend,
                self.available_backends().join(", ")
            )));
        };
        factory.create(config).await
    }
}
