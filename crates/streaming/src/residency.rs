/// Lifecycle of a boundary in the [`crate::BoundaryCache`].
///
/// `Absent → Pending → Resolved`, or `Pending → Absent` on failure. There is no
/// failed state: a failed key can be requested again.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BoundaryState {
    Absent,
    Pending,
    Resolved,
}

impl BoundaryState {
    /// Whether a new fetch for this key may be issued.
    pub fn is_fetchable(self) -> bool {
        self == BoundaryState::Absent
    }
}
