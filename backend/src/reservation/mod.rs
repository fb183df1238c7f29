pub mod model;
pub mod repository;
pub mod repository_sqlx;
pub mod store;

#[cfg(test)]
pub(crate) mod mock;
