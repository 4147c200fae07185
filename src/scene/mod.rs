pub mod placement;
pub mod composer;
pub mod resolve;

pub use placement::*;
pub use composer::*;
pub use resolve::*;
