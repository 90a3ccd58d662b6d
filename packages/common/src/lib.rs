pub mod draft_store;
pub mod error;
pub mod result;

pub use draft_store::*;
pub use error::*;
pub use result::*;
