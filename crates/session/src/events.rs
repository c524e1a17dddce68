use scene::NavigationState;
use serde::Serialize;
use streaming::LeadRecord;

/// Notifications for the host, drained once per frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    MarkerActivated { record: LeadRecord },
    DataLoaded { records: usize, sub_regions: usize },
    Error { message: String },
    /// Full selection after a change, oldest first.
    SubRegionsSelected { names: Vec<String> },
    HoverChanged { name: Option<String> },
    NavigationChanged { state: NavigationState },
}

#[cfg(test)]
mod tests {
    use super::SessionEvent;
    use scene::NavigationState;
    use serde_json::json;

    #[test]
    fn events_serialize_tagged() {
        let v = serde_json::to_value(SessionEvent::HoverChanged { name: None }).unwrap();
        assert_eq!(v, json!({ "event": "hover_changed", "name": null }));

        let v = serde_json::to_value(SessionEvent::NavigationChanged {
            state: NavigationState::Unanchored,
        })
        .unwrap();
        assert_eq!(v, json!({ "event": "navigation_changed", "state": { "state": "unanchored" } }));
    }
}
