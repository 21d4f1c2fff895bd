//! Ledger module containing request management and leave flows

pub mod core;
pub mod draft;
pub mod request;
pub mod requests;

pub use self::core::*;
pub use draft::*;
pub use request::*;
pub use requests::*;
