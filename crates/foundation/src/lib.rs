pub mod bounds;
pub mod containment;
pub mod geometry;
pub mod ids;
pub mod precision;
pub mod viewport;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use containment::*;
pub use geometry::*;
pub use ids::*;
pub use viewport::*;
