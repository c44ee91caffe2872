use std::collections::HashSet;

use rayon::prelude::*;

use crate::anonymize::CoordinateAnonymizer;
use crate::archive::BundleReader;
use crate::composite::compositor::{OutputRaster, OverlapCompositor};
use crate::config::PipelineConfig;
use crate::foundation::core::Coordinate;
use crate::foundation::error::{CoverlapError, CoverlapResult};
use crate::mask::group::{MaskGroup, MaskGroups};
use crate::mask::naming::{MaskNaming, is_plain_file_name};

/// One composited group, keyed for the result emitter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyedRaster {
    /// Mask name as found in the bundles, e.g. `cloakpN44W094.png`.
    pub name: String,
    /// Output file key: the mask name with its prefix stripped, e.g. `N44W094.png`.
    pub key: String,
    pub raster: OutputRaster,
}

#[derive(Debug)]
pub struct GroupFailure {
    pub name: String,
    pub error: CoverlapError,
}

#[derive(Debug)]
pub struct BundleFailure {
    pub bundle: String,
    pub error: CoverlapError,
}

#[derive(Debug, Default)]
pub struct PipelineOutput {
    pub rasters: Vec<KeyedRaster>,
    /// Jittered viewer positions, one per bundle that had a viewer placemark.
    pub coordinates: Vec<Coordinate>,
    pub failed_groups: Vec<GroupFailure>,
    pub skipped_bundles: Vec<BundleFailure>,
}

impl PipelineOutput {
    /// Output keys in raster order, for the manifest.
    pub fn keys(&self) -> Vec<String> {
        self.rasters.iter().map(|r| r.key.clone()).collect()
    }

    /// True when neither a raster nor a coordinate came out.
    pub fn is_empty(&self) -> bool {
        self.rasters.is_empty() && self.coordinates.is_empty()
    }
}

/// Bundles in, overlap rasters and anonymized viewer positions out.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    naming: MaskNaming,
    compositor: OverlapCompositor,
    anonymizer: CoordinateAnonymizer,
    pool: rayon::ThreadPool,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> CoverlapResult<Self> {
        config.validate()?;
        Ok(Self {
            naming: config.naming(),
            compositor: OverlapCompositor::new(config.color_policy()),
            anonymizer: CoordinateAnonymizer::new(config.jitter_degrees)?,
            pool: build_thread_pool(config.threads)?,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[tracing::instrument(skip(self, bundles), fields(bundles = bundles.len()))]
    pub fn run<B: BundleReader>(&self, bundles: &[B]) -> PipelineOutput {
        let mut out = PipelineOutput::default();

        let groups = self.group_masks(bundles, &mut out.skipped_bundles);
        let (rasters, failed) = self.composite_groups(groups.into_groups());
        out.rasters = rasters;
        out.failed_groups = failed;

        let positions = self.viewer_positions(bundles);
        out.coordinates = self.anonymizer.anonymize(&positions);

        tracing::info!(
            rasters = out.rasters.len(),
            coordinates = out.coordinates.len(),
            failed_groups = out.failed_groups.len(),
            skipped_bundles = out.skipped_bundles.len(),
            "pipeline finished"
        );
        out
    }

    /// Merges every bundle's coverage masks by name, in bundle order. A bundle that cannot be
    /// read is recorded in `skipped` and contributes nothing.
    pub fn group_masks<B: BundleReader>(
        &self,
        bundles: &[B],
        skipped: &mut Vec<BundleFailure>,
    ) -> MaskGroups {
        let mut groups = MaskGroups::new();
        for bundle in bundles {
            match bundle.list_mask_candidates(&self.naming) {
                Ok(candidates) => {
                    for c in candidates {
                        groups.insert(bundle.id(), &c.name, c.bytes);
                    }
                }
                Err(error) => {
                    tracing::warn!(bundle = bundle.id(), error = %error, "skipping bundle masks");
                    skipped.push(BundleFailure {
                        bundle: bundle.id().to_string(),
                        error,
                    });
                }
            }
        }
        groups
    }

    /// Composites every group on the pipeline's pool. Output order follows group order; a group
    /// that fails is reported and does not affect the others.
    pub fn composite_groups(
        &self,
        groups: Vec<MaskGroup>,
    ) -> (Vec<KeyedRaster>, Vec<GroupFailure>) {
        let compositor = &self.compositor;
        let results = self.pool.install(|| {
            groups
                .par_iter()
                .map(|group| compositor.composite(group))
                .collect::<Vec<_>>()
        });

        let mut rasters = Vec::with_capacity(results.len());
        let mut failed = Vec::new();
        let mut keys = HashSet::new();
        for (group, result) in groups.into_iter().zip(results) {
            let key = self.naming.output_key(&group.name);
            let result = result.and_then(|raster| {
                if !is_plain_file_name(&key) {
                    Err(CoverlapError::invalid_key(format!(
                        "'{}' maps to '{key}', which is not a plain file name",
                        group.name
                    )))
                } else if keys.insert(key.clone()) {
                    Ok(raster)
                } else {
                    Err(CoverlapError::key_collision(format!(
                        "'{}' maps to '{key}', already produced by an earlier group",
                        group.name
                    )))
                }
            });
            match result {
                Ok(raster) => rasters.push(KeyedRaster {
                    key,
                    name: group.name,
                    raster,
                }),
                Err(error) => {
                    tracing::warn!(group = %group.name, error = %error, "mask group failed");
                    failed.push(GroupFailure {
                        name: group.name,
                        error,
                    });
                }
            }
        }
        (rasters, failed)
    }

    /// Un-jittered viewer positions, at most one per bundle.
    pub fn viewer_positions<B: BundleReader>(&self, bundles: &[B]) -> Vec<Coordinate> {
        bundles
            .iter()
            .filter_map(|b| b.extract_viewer_placemark(&self.config.viewer_sentinel))
            .map(|p| p.coordinate())
            .collect()
    }
}

/// `threads` has already been checked by [`PipelineConfig::validate`].
fn build_thread_pool(threads: Option<usize>) -> CoverlapResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| CoverlapError::config(format!("failed to build rayon thread pool: {e}")))
}
