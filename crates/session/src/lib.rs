pub mod config;
pub mod events;
pub mod render;
pub mod session;
pub mod surface;

pub use config::*;
pub use events::*;
pub use render::*;
pub use session::*;
pub use surface::*;
