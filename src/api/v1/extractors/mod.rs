mod identity;

pub use identity::{CurrentOwner, Identity};
