//! Blob extraction and anchor-region assignment.

use crate::config::{AnchorRegion, DetectionConfig, InspectionConfig};
use crate::contour::find_contours;
use crate::filter::{apply_blur, apply_morphology, apply_threshold};
use crate::geometry::{Point, Rect};
use crate::image::{Frame, OwnedImage};
use crate::trace::{trace_event, trace_span};
use crate::util::MarkAlignResult;
use std::collections::BTreeMap;

/// A contour that passed the size filter.
#[derive(Clone, Debug, PartialEq)]
pub struct Blob {
    pub bbox: Rect,
    pub contour: Vec<Point>,
    /// Anchor region the blob center fell into.
    pub region: Option<usize>,
}

impl Blob {
    /// Bounding-box center with integer division.
    pub fn center(&self) -> Point {
        self.bbox.center()
    }
}

/// Output of one blob extraction run.
#[derive(Clone, Debug)]
pub struct BlobSet {
    /// Binary mask after morphology.
    pub mask: OwnedImage,
    /// One entry per grid slot, indexed by region id.
    pub slots: Vec<Option<Blob>>,
    /// Every accepted blob in contour order, assigned or not.
    pub accepted: Vec<Blob>,
}

impl BlobSet {
    /// Blob assigned to `region`, if any.
    pub fn get(&self, region: usize) -> Option<&Blob> {
        self.slots.get(region).and_then(Option::as_ref)
    }
}

/// Gray conversion followed by blur, adaptive threshold and morphology.
pub fn preprocess(frame: &Frame, cfg: &InspectionConfig) -> MarkAlignResult<OwnedImage> {
    let gray = frame.to_gray();
    let blurred = apply_blur(gray.view(), &cfg.blur)?;
    let binary = apply_threshold(blurred.view(), &cfg.threshold)?;
    apply_morphology(binary.view(), &cfg.morphological)
}

/// Size filter: inclusive area bounds and a strict aspect skew bound.
pub fn accepts(bbox: &Rect, detection: &DetectionConfig) -> bool {
    let area = bbox.area();
    let skew = (bbox.width - bbox.height).abs() as f64;
    detection.area_min <= area && area <= detection.area_max && skew < detection.max_aspect_skew
}

/// First region, in id order, whose box contains `center`.
pub fn assign_region(center: Point, regions: &BTreeMap<usize, AnchorRegion>) -> Option<usize> {
    regions
        .iter()
        .find(|(_, region)| region.rect.contains(center))
        .map(|(&id, _)| id)
}

/// Runs the mask stages and assigns accepted contours to grid slots.
///
/// When several blobs land in the same slot the one found last wins.
pub fn find_blobs(frame: &Frame, cfg: &InspectionConfig) -> MarkAlignResult<BlobSet> {
    let _span = trace_span!("find_blobs", width = frame.width(), height = frame.height()).entered();

    let mask = preprocess(frame, cfg)?;
    let contours = find_contours(
        mask.view(),
        cfg.contour.retrieval_mode,
        cfg.contour.approximation_mode,
    );

    let mut slots: Vec<Option<Blob>> = vec![None; cfg.slot_count()];
    let mut accepted = Vec::new();
    for contour in &contours {
        if !accepts(&contour.bbox, &cfg.detection) {
            continue;
        }
        let region = assign_region(contour.bbox.center(), &cfg.regions);
        let blob = Blob {
            bbox: contour.bbox,
            contour: contour.points.clone(),
            region,
        };
        if let Some(slot) = region.and_then(|id| slots.get_mut(id)) {
            *slot = Some(blob.clone());
        }
        accepted.push(blob);
    }

    trace_event!(
        "blobs",
        contours = contours.len(),
        accepted = accepted.len(),
        assigned = slots.iter().filter(|s| s.is_some()).count()
    );
    Ok(BlobSet {
        mask,
        slots,
        accepted,
    })
}
