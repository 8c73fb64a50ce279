pub mod chunk;
pub mod timeline;
pub mod validate;

pub use chunk::*;
pub use timeline::*;
