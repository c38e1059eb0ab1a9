pub mod ownership;
pub mod password;
pub mod token;

pub use ownership::{OwnershipLookups, OwnershipService, ResourceKind};
pub use token::TokenService;
