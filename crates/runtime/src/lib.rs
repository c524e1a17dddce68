pub mod cancel;
pub mod event_bus;
pub mod work_queue;

pub use cancel::*;
pub use event_bus::*;
pub use work_queue::*;
