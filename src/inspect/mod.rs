//! Region-aware inspection pipeline.
//!
//! An [`Inspector`] owns a configuration snapshot and runs the full chain on
//! one frame: mask stages and blob assignment, then a circle pair search in
//! every occupied anchor region, then alignment against the taught origins.
//! Regions are independent, so with the `rayon` feature the per-region work
//! can run in parallel.

use crate::align::{align, format_message, Alignment, MarkerPose};
use crate::blob::{find_blobs, Blob};
use crate::circles::{find_circle_pair, CirclePair};
use crate::config::InspectionConfig;
use crate::geometry::Rect;
use crate::image::{Frame, OwnedImage};
use crate::trace::{log_warn, trace_event, trace_span};
use crate::util::MarkAlignResult;
use std::collections::BTreeMap;
use std::sync::Arc;

mod render;
mod report;

pub use render::render;
pub use report::{InspectionReport, SlotReport};

/// Options that do not change results, only how they are produced.
#[derive(Clone, Debug)]
pub struct InspectOptions {
    /// Search regions in parallel (requires the `rayon` feature).
    pub parallel: bool,
    /// Produce the annotated frame.
    pub render: bool,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            render: true,
        }
    }
}

/// Everything found for one grid slot.
#[derive(Clone, Debug, Default)]
pub struct SlotResult {
    pub blob: Option<Blob>,
    pub pair: Option<CirclePair>,
    pub pose: Option<MarkerPose>,
    pub alignment: Option<Alignment>,
}

/// Output of one pipeline run.
#[derive(Clone, Debug)]
pub struct InspectionResult {
    /// Frame the result was computed from; `None` for an empty result.
    pub source: Option<Arc<Frame>>,
    pub annotated: Option<Frame>,
    pub mask: Option<OwnedImage>,
    /// One entry per grid slot, indexed by region id.
    pub slots: Vec<SlotResult>,
    /// Summary line sent to the trigger client.
    pub message: String,
}

impl InspectionResult {
    /// Result with no frame: every configured region reports `None`.
    pub fn empty(cfg: &InspectionConfig) -> Self {
        let slots = vec![SlotResult::default(); cfg.slot_count()];
        let message = format_message(cfg.regions.keys().map(|_| None));
        Self {
            source: None,
            annotated: None,
            mask: None,
            slots,
            message,
        }
    }

    /// Slot for `region`, if inside the grid.
    pub fn slot(&self, region: usize) -> Option<&SlotResult> {
        self.slots.get(region)
    }

    /// Poses of every slot with a detected pair, keyed by region id.
    pub fn poses(&self) -> BTreeMap<usize, MarkerPose> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.pose.map(|pose| (id, pose)))
            .collect()
    }
}

/// Runs the pipeline against a fixed configuration snapshot.
#[derive(Clone, Debug)]
pub struct Inspector {
    config: Arc<InspectionConfig>,
    opts: InspectOptions,
}

impl Inspector {
    /// Creates an inspector with default options.
    pub fn new(config: Arc<InspectionConfig>) -> Self {
        Self {
            config,
            opts: InspectOptions::default(),
        }
    }

    /// Replaces the options.
    pub fn with_options(mut self, opts: InspectOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn config(&self) -> &InspectionConfig {
        &self.config
    }

    pub fn options(&self) -> &InspectOptions {
        &self.opts
    }

    /// Empty result for the current configuration.
    pub fn empty_result(&self) -> InspectionResult {
        InspectionResult::empty(&self.config)
    }

    /// Full pipeline: blobs, circle pairs per occupied region, alignment.
    pub fn inspect(&self, frame: Arc<Frame>) -> MarkAlignResult<InspectionResult> {
        let _span = trace_span!("inspect", regions = self.config.regions.len()).entered();
        let cfg = &*self.config;
        let blobs = find_blobs(&frame, cfg)?;

        let jobs: Vec<(usize, Rect)> = cfg
            .regions
            .keys()
            .filter_map(|&id| blobs.get(id).map(|blob| (id, blob.bbox)))
            .collect();
        let pairs = self.search_regions(&frame, &jobs);

        let mut slots: Vec<SlotResult> = blobs
            .slots
            .into_iter()
            .map(|blob| SlotResult {
                blob,
                ..SlotResult::default()
            })
            .collect();
        for ((id, _), pair) in jobs.iter().zip(pairs) {
            let slot = &mut slots[*id];
            slot.pair = pair;
            slot.pose = pair.map(|p| p.pose());
            slot.alignment = cfg
                .origins
                .get(id)
                .and_then(|origin| align(origin, slot.pose.as_ref()));
        }

        let message = format_message(
            cfg.regions
                .keys()
                .map(|id| slots.get(*id).and_then(|s| s.alignment.as_ref())),
        );
        trace_event!(
            "inspected",
            pairs = slots.iter().filter(|s| s.pair.is_some()).count()
        );

        let mut result = InspectionResult {
            source: Some(frame),
            annotated: None,
            mask: Some(blobs.mask),
            slots,
            message,
        };
        if self.opts.render {
            result.annotated = result.source.as_ref().map(|f| render(f, cfg, &result));
        }
        Ok(result)
    }

    /// Mask stages and blob assignment only; no circle search.
    pub fn inspect_blobs(&self, frame: Arc<Frame>) -> MarkAlignResult<InspectionResult> {
        let cfg = &*self.config;
        let blobs = find_blobs(&frame, cfg)?;
        let slots = blobs
            .slots
            .into_iter()
            .map(|blob| SlotResult {
                blob,
                ..SlotResult::default()
            })
            .collect();
        let mut result = InspectionResult {
            source: Some(frame),
            annotated: None,
            mask: Some(blobs.mask),
            slots,
            message: format_message(cfg.regions.keys().map(|_| None)),
        };
        if self.opts.render {
            result.annotated = result.source.as_ref().map(|f| render(f, cfg, &result));
        }
        Ok(result)
    }

    /// Circle pair search inside the anchor box of `region`, without blobs.
    pub fn inspect_region(
        &self,
        frame: Arc<Frame>,
        region: usize,
    ) -> MarkAlignResult<InspectionResult> {
        let cfg = &*self.config;
        let mut result = InspectionResult::empty(cfg);
        if let Some(anchor) = cfg.regions.get(&region) {
            let pairs = self.search_regions(&frame, &[(region, anchor.rect)]);
            if let (Some(slot), Some(pair)) = (result.slots.get_mut(region), pairs[0]) {
                slot.pair = Some(pair);
                slot.pose = Some(pair.pose());
                slot.alignment = cfg
                    .origins
                    .get(&region)
                    .and_then(|origin| align(origin, slot.pose.as_ref()));
            }
        }
        result.message = format_message(
            cfg.regions
                .keys()
                .map(|id| result.slots.get(*id).and_then(|s| s.alignment.as_ref())),
        );
        result.source = Some(frame);
        if self.opts.render {
            result.annotated = result.source.as_ref().map(|f| render(f, cfg, &result));
        }
        Ok(result)
    }

    /// Runs the pipeline and returns the pose of every region with a pair.
    pub fn teach_origins(&self, frame: Arc<Frame>) -> MarkAlignResult<BTreeMap<usize, MarkerPose>> {
        Ok(self.inspect(frame)?.poses())
    }

    fn search_regions(&self, frame: &Frame, jobs: &[(usize, Rect)]) -> Vec<Option<CirclePair>> {
        #[cfg(feature = "rayon")]
        {
            if self.opts.parallel {
                return search_regions_par(frame, &self.config, jobs);
            }
        }
        jobs.iter()
            .map(|&(id, area)| search_region(frame, &self.config, id, area))
            .collect()
    }
}

#[cfg(feature = "rayon")]
fn search_regions_par(
    frame: &Frame,
    cfg: &InspectionConfig,
    jobs: &[(usize, Rect)],
) -> Vec<Option<CirclePair>> {
    use rayon::prelude::*;
    jobs.par_iter()
        .map(|&(id, area)| search_region(frame, cfg, id, area))
        .collect()
}

/// Failures inside one region leave that region absent.
fn search_region(frame: &Frame, cfg: &InspectionConfig, id: usize, area: Rect) -> Option<CirclePair> {
    match find_circle_pair(frame, area, &cfg.hough) {
        Ok(pair) => pair,
        Err(err) => {
            log_warn!("region {id}: circle search failed: {err}");
            None
        }
    }
}

/// Captures origin poses from a reference frame.
pub fn teach_origins(
    frame: Arc<Frame>,
    cfg: Arc<InspectionConfig>,
) -> MarkAlignResult<BTreeMap<usize, MarkerPose>> {
    Inspector::new(cfg)
        .with_options(InspectOptions {
            parallel: false,
            render: false,
        })
        .teach_origins(frame)
}

#[cfg(test)]
mod tests {
    use super::{InspectionResult, Inspector};
    use crate::config::{AnchorRegion, GridConfig, InspectionConfig};
    use crate::geometry::Rect;
    use crate::image::{Frame, OwnedImage};
    use std::sync::Arc;

    fn two_region_config() -> InspectionConfig {
        let mut cfg = InspectionConfig {
            grid: GridConfig {
                rows: 1,
                columns: 3,
            },
            ..InspectionConfig::default()
        };
        for (id, x) in [(0usize, 0), (2, 50)] {
            cfg.regions.insert(
                id,
                AnchorRegion {
                    label: format!("r{id}"),
                    rect: Rect::new(x, 0, 50, 50),
                },
            );
        }
        cfg
    }

    #[test]
    fn empty_result_reports_none_per_configured_region() {
        let result = InspectionResult::empty(&two_region_config());
        assert_eq!(result.slots.len(), 3);
        assert_eq!(result.message, "None_None");
        assert!(result.source.is_none());
    }

    #[test]
    fn blank_frame_yields_no_alignment() {
        let cfg = Arc::new(two_region_config());
        let frame = Frame::from_gray(OwnedImage::filled(100, 50, 128).unwrap());
        let result = Inspector::new(cfg).inspect(Arc::new(frame)).unwrap();
        assert_eq!(result.message, "None_None");
        assert!(result.slots.iter().all(|s| s.blob.is_none()));
        let annotated = result.annotated.unwrap();
        assert_eq!((annotated.width(), annotated.height()), (100, 50));
    }

    #[test]
    fn region_mode_outside_grid_is_empty() {
        let cfg = Arc::new(two_region_config());
        let frame = Arc::new(Frame::from_gray(OwnedImage::filled(100, 50, 0).unwrap()));
        let result = Inspector::new(cfg).inspect_region(frame, 1).unwrap();
        assert!(result.slots.iter().all(|s| s.pair.is_none()));
        assert_eq!(result.message, "None_None");
    }
}
