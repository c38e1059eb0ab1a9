pub mod error;
pub mod owner_repo;
pub mod resource_repo;
