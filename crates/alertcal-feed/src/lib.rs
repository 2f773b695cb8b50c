pub mod normalize;
pub mod raw;

pub use normalize::*;
pub use raw::*;
