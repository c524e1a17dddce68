pub mod aggregate;
pub mod hierarchy;
pub mod navigation;
pub mod selection;

pub use aggregate::*;
pub use hierarchy::*;
pub use navigation::*;
pub use selection::*;
