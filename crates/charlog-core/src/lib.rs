pub mod analysis;
pub mod body;
pub mod error;
pub mod filter;
pub mod record;

pub use error::{Error, Result};
