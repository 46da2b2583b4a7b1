//! Bridge Core - Fundamental types shared by every translation layer

mod error;
mod types;
mod version;

pub use error::*;
pub use types::*;
pub use version::*;
