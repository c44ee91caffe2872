//! Reading coverage masks and viewer placemarks out of source bundles.

pub mod kml;
pub mod kmz;

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::core::PlacemarkRecord;
use crate::foundation::error::CoverlapResult;
use crate::mask::naming::MaskNaming;

pub use kmz::KmzBundle;

/// One coverage-mask entry found inside a bundle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaskCandidate {
    /// Entry basename, e.g. `cloakpN44W094.png`.
    pub name: String,
    pub bytes: Vec<u8>,
}

pub trait BundleReader {
    /// Stable identifier used in logs and group bookkeeping.
    fn id(&self) -> &str;

    fn list_mask_candidates(&self, naming: &MaskNaming) -> CoverlapResult<Vec<MaskCandidate>>;

    /// The placemark whose description equals `sentinel`, if any.
    fn viewer_placemark(&self, sentinel: &str) -> CoverlapResult<Option<PlacemarkRecord>>;

    /// Like [`BundleReader::viewer_placemark`], but a malformed document only costs this bundle
    /// its placemark.
    fn extract_viewer_placemark(&self, sentinel: &str) -> Option<PlacemarkRecord> {
        match self.viewer_placemark(sentinel) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(bundle = self.id(), error = %e, "skipping viewer placemark");
                None
            }
        }
    }
}

/// A bundle held entirely in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryBundle {
    pub id: String,
    /// `(entry name, bytes)` pairs; names may contain `/`.
    pub entries: Vec<(String, Vec<u8>)>,
    /// `(description, placemark)` pairs, searched in order like a KML document.
    pub placemarks: Vec<(String, PlacemarkRecord)>,
}

impl BundleReader for MemoryBundle {
    fn id(&self) -> &str {
        &self.id
    }

    fn list_mask_candidates(&self, naming: &MaskNaming) -> CoverlapResult<Vec<MaskCandidate>> {
        Ok(self
            .entries
            .iter()
            .filter_map(|(entry, bytes)| {
                let name = crate::mask::naming::basename(entry);
                naming.matches(name).then(|| MaskCandidate {
                    name: name.to_string(),
                    bytes: bytes.clone(),
                })
            })
            .collect())
    }

    fn viewer_placemark(&self, sentinel: &str) -> CoverlapResult<Option<PlacemarkRecord>> {
        Ok(self
            .placemarks
            .iter()
            .find(|(description, _)| description.trim() == sentinel)
            .map(|(_, p)| p.clone()))
    }
}

/// `*.kmz` files directly inside `dir`, sorted by path so discovery order is stable.
pub fn discover_bundles(dir: impl AsRef<Path>) -> CoverlapResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut out = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("read bundle dir '{}'", dir.display()))?
    {
        let path = entry
            .with_context(|| format!("list bundle dir '{}'", dir.display()))?
            .path();
        let is_kmz = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("kmz"));
        if is_kmz && path.is_file() {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}
