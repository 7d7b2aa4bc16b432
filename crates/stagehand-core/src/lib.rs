pub mod protocol;
pub mod record;
pub mod types;

pub use types::*;
