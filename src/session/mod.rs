pub mod identity;

pub use identity::SessionIdentity;
