use foundation::{LonLat, RegionId, Viewport};
use serde::Deserialize;
use streaming::{LeadQuery, TimeWindow};

/// A recorded interaction session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Script {
    pub campaign: String,
    #[serde(default)]
    pub window: TimeWindow,
    #[serde(default)]
    pub postal_codes: Vec<String>,
    pub steps: Vec<Step>,
}

impl Script {
    pub fn query(&self) -> LeadQuery {
        LeadQuery::new(&self.campaign)
            .with_window(self.window)
            .with_postal_codes(self.postal_codes.iter().cloned())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Viewport {
        center: [f64; 2],
        zoom: f64,
        #[serde(default = "default_half_width")]
        half_width: f64,
    },
    Select {
        region: RegionId,
    },
    Reset,
    Toggle {
        name: String,
    },
    Hover {
        name: Option<String>,
    },
    Marker {
        postal_code: String,
    },
    Reload,
    WaitIdle,
    Sleep {
        ms: u64,
    },
}

fn default_half_width() -> f64 {
    0.5
}

impl Step {
    pub fn viewport(&self) -> Option<Viewport> {
        match self {
            Self::Viewport {
                center,
                zoom,
                half_width,
            } => Some(Viewport::around(LonLat::from(*center), *zoom, *half_width)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Script, Step};
    use foundation::{LonLat, RegionId};
    use pretty_assertions::assert_eq;
    use streaming::TimeWindow;

    #[test]
    fn parses_steps() {
        let script: Script = serde_json::from_str(
            r#"{
                "campaign": "solar",
                "window": "30d",
                "steps": [
                    { "op": "viewport", "center": [-97.7, 30.3], "zoom": 9 },
                    { "op": "select", "region": "635" },
                    { "op": "hover", "name": null },
                    { "op": "wait_idle" },
                    { "op": "reset" }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(script.window, TimeWindow::Last30Days);
        assert_eq!(script.steps.len(), 5);
        assert_eq!(
            script.steps[1],
            Step::Select {
                region: RegionId::new("635")
            }
        );
        let v = script.steps[0].viewport().unwrap();
        assert_eq!(v.center, LonLat::new(-97.7, 30.3));
        assert_eq!(v.zoom, 9.0);
        assert_eq!(script.steps[3].viewport(), None);

        let pairs = script.query().query_pairs();
        assert_eq!(pairs[1], ("window", "30d".to_string()));
    }
}
