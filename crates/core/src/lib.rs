//! Shard Client Core - Fundamental types shared by every layer

mod error;
mod types;
mod positions;

pub use error::*;
pub use types::*;
pub use positions::*;
