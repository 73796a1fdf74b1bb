pub mod factory;
pub mod repository;
pub mod save;
#[cfg(test)]
mod testing;

pub use factory::{DbConfig, RepositoryFactory, RepositoryRegistry};
pub use repository::{CommissionRepository, RepositoryError, StoredRecord};
pub use save::{SaveError, save_all};
