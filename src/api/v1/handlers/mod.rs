pub mod aquariums;
pub mod auth;
pub mod health;
