//! Coverage-mask overlap maps from geo-referenced KMZ bundles.
//!
//! Each bundle carries one or more coverage masks (RGBA rasters whose fully-opaque pixels mark
//! covered ground) and a viewer placemark. The pipeline:
//!
//! - groups masks with the same name across bundles ([`MaskGroups`])
//! - counts, per pixel, how many masks in a group are fully opaque and colors that count
//!   ([`OverlapCompositor`], [`OccupancyColorPolicy`])
//! - jitters viewer positions so exact locations are not published ([`CoordinateAnonymizer`])
#![forbid(unsafe_code)]

pub mod anonymize;
pub mod archive;
pub mod composite;
pub mod config;
pub mod emit;
mod foundation;
pub mod mask;
pub mod pipeline;

pub use crate::anonymize::CoordinateAnonymizer;
pub use crate::archive::{BundleReader, KmzBundle, MaskCandidate, MemoryBundle, discover_bundles};
pub use crate::composite::compositor::{OutputRaster, OverlapCompositor};
pub use crate::composite::layer::RasterLayer;
pub use crate::composite::occupancy::OccupancyGrid;
pub use crate::composite::policy::OccupancyColorPolicy;
pub use crate::config::{ColorConfig, PipelineConfig};
pub use crate::emit::ResultEmitter;
pub use crate::foundation::core::{Coordinate, Dimensions, PlacemarkRecord, Rgba8};
pub use crate::foundation::error::{CoverlapError, CoverlapResult};
pub use crate::mask::group::{MaskGroup, MaskGroups};
pub use crate::mask::naming::MaskNaming;
pub use crate::pipeline::{BundleFailure, GroupFailure, KeyedRaster, Pipeline, PipelineOutput};
