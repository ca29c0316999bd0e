pub mod error;
pub mod redirect;
pub mod signature;
pub mod types;
