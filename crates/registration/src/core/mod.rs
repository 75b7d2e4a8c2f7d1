pub mod types;
pub mod context;
pub mod result;

pub use types::*;
pub use context::*;
pub use result::*;
