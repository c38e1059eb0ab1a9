pub mod api_response;
pub mod aquariums;
pub mod auth;
