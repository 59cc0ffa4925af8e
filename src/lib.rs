//! MarkAlign is a CPU-only fiducial inspection library for fixtures laid out
//! on a grid.
//!
//! Each frame goes through blur, adaptive threshold and morphology to get a
//! mask, outer contours become blobs assigned to anchor regions, and inside
//! every occupied region a Hough circle transform looks for a small/large
//! circle pair. The pair's pose is compared against a taught origin to give
//! a per-region correction `dx,dy,dtheta`.
//!
//! The [`runtime`] module wraps the pipeline in a trigger-driven TCP loop and
//! a teaching loop. Optional features: `rayon` (regions searched in
//! parallel), `image-io` (file decoding and the folder camera) and `tracing`
//! (spans and log events).

pub mod align;
pub mod blob;
pub mod camera;
pub mod circles;
pub mod config;
pub mod contour;
pub mod filter;
pub mod geometry;
pub mod hough;
pub mod image;
pub mod inspect;
pub mod runtime;
mod trace;
pub mod util;

pub use align::{align, format_message, Alignment, MarkerPose};
pub use blob::{find_blobs, Blob, BlobSet};
pub use camera::{Camera, CameraError, CameraHandle, CameraState, StillCamera};
pub use circles::{find_circle_pair, CirclePair};
pub use config::{InspectionConfig, ModelStore};
pub use geometry::{Point, Rect, Vector};
pub use hough::{detect_circles, Circle};
pub use crate::image::{Frame, ImageView, OwnedImage};
pub use inspect::{teach_origins, InspectOptions, InspectionResult, Inspector};
pub use runtime::{ProcessMode, ResultBoard, ResultSink, Session, SharedState, TriggerSlot};
pub use util::{MarkAlignError, MarkAlignResult};
