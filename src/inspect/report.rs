use crate::align::{Alignment, MarkerPose};
use crate::circles::CirclePair;
use crate::config::InspectionConfig;
use crate::geometry::Rect;
use crate::inspect::InspectionResult;
use crate::util::MarkAlignResult;
use serde::{Deserialize, Serialize};

/// Serializable summary of one configured region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlotReport {
    pub region: usize,
    pub label: String,
    pub blob: Option<Rect>,
    pub pair: Option<CirclePair>,
    pub pose: Option<MarkerPose>,
    pub alignment: Option<Alignment>,
}

/// Serializable summary of an inspection run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InspectionReport {
    pub message: String,
    pub regions: Vec<SlotReport>,
}

impl InspectionReport {
    /// Collects the configured regions of `result` in id order.
    pub fn new(cfg: &InspectionConfig, result: &InspectionResult) -> Self {
        let regions = cfg
            .regions
            .iter()
            .map(|(&id, region)| {
                let slot = result.slot(id);
                SlotReport {
                    region: id,
                    label: region.label.clone(),
                    blob: slot.and_then(|s| s.blob.as_ref()).map(|b| b.bbox),
                    pair: slot.and_then(|s| s.pair),
                    pose: slot.and_then(|s| s.pose),
                    alignment: slot.and_then(|s| s.alignment),
                }
            })
            .collect();
        Self {
            message: result.message.clone(),
            regions,
        }
    }

    pub fn to_json_pretty(&self) -> MarkAlignResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::InspectionReport;
    use crate::config::{AnchorRegion, InspectionConfig};
    use crate::geometry::Rect;
    use crate::inspect::InspectionResult;

    #[test]
    fn empty_result_lists_configured_regions() {
        let mut cfg = InspectionConfig::default();
        cfg.regions.insert(
            7,
            AnchorRegion {
                label: "clip".to_string(),
                rect: Rect::new(1, 2, 3, 4),
            },
        );
        let report = InspectionReport::new(&cfg, &InspectionResult::empty(&cfg));
        assert_eq!(report.message, "None");
        assert_eq!(report.regions.len(), 1);
        assert_eq!(report.regions[0].region, 7);
        assert!(report.regions[0].alignment.is_none());
        let json = report.to_json_pretty().unwrap();
        assert!(json.contains("\"clip\""));
    }
}
