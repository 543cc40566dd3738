pub mod authorization_repo;
pub use authorization_repo::{AuthorizationStore, PgAuthorizationStore};
pub mod user_repo;
pub use user_repo::UserRepository;

#[cfg(test)]
pub mod memory_store;
