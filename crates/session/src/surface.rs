use foundation::BoundingBox;
use streaming::BoxFuture;

/// The map widget being driven.
pub trait MapSurface: Send + Sync {
    /// Animates the camera to frame `bounds`; resolves when the animation ends.
    fn fly_to_bounds<'a>(&'a self, bounds: BoundingBox) -> BoxFuture<'a, ()>;
}

/// A surface without animation, for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticSurface;

impl MapSurface for StaticSurface {
    fn fly_to_bounds<'a>(&'a self, _bounds: BoundingBox) -> BoxFuture<'a, ()> {
        Box::pin(async {})
    }
}
