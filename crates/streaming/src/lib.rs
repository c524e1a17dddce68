pub mod cache;
mod pipeline;
pub mod priority;
pub mod protocol;
pub mod queue;
pub mod request;
pub mod residency;
pub mod source;

pub use cache::*;
pub use priority::*;
pub use protocol::*;
pub use queue::*;
pub use request::*;
pub use residency::*;
pub use source::*;
