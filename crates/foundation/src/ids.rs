use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a top-level region (e.g. a media market).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub String);

impl RegionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Composite key of a sub-region: `name` within `parent_area`.
///
/// Displays as `name,parent_area`, the form used to key boundary lookups.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionKey {
    pub name: String,
    pub parent_area: String,
}

impl RegionKey {
    pub fn new(name: impl Into<String>, parent_area: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_area: parent_area.into(),
        }
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.name, self.parent_area)
    }
}
