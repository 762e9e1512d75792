//! Entity store schema and initialization

pub mod init;

pub use init::*;
