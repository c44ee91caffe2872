use std::io::{Cursor, Read};
use std::path::Path;

use anyhow::Context;

use crate::archive::kml::parse_viewer_placemark;
use crate::archive::{BundleReader, MaskCandidate};
use crate::foundation::core::PlacemarkRecord;
use crate::foundation::error::{CoverlapError, CoverlapResult};
use crate::mask::naming::{MaskNaming, basename};

/// Upper bound on buffer space reserved up front from an entry's declared size.
const MAX_PREALLOC: u64 = 16 << 20;

/// The declared size comes from the archive header and is not trusted beyond [`MAX_PREALLOC`].
fn prealloc_hint(declared: u64) -> usize {
    declared.min(MAX_PREALLOC) as usize
}

/// A KMZ (zipped KML) bundle loaded into memory.
#[derive(Clone, Debug)]
pub struct KmzBundle {
    id: String,
    bytes: Vec<u8>,
}

impl KmzBundle {
    pub fn open(path: impl AsRef<Path>) -> CoverlapResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).with_context(|| format!("read kmz '{}'", path.display()))?;
        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let bundle = Self::from_bytes(id, bytes);
        bundle.archive()?;
        Ok(bundle)
    }

    pub fn from_bytes(id: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            bytes,
        }
    }

    fn archive(&self) -> CoverlapResult<zip::ZipArchive<Cursor<&[u8]>>> {
        zip::ZipArchive::new(Cursor::new(self.bytes.as_slice()))
            .map_err(|e| CoverlapError::archive(format!("open kmz '{}': {e}", self.id)))
    }

    /// Reads every entry whose full name satisfies `want`, in archive order.
    fn read_entries(
        &self,
        mut want: impl FnMut(&str) -> bool,
    ) -> CoverlapResult<Vec<(String, Vec<u8>)>> {
        let mut archive = self.archive()?;
        let mut out = Vec::new();
        for index in 0..archive.len() {
            let mut file = archive.by_index(index).map_err(|e| {
                CoverlapError::archive(format!("kmz '{}' entry {index}: {e}", self.id))
            })?;
            if !file.is_file() || !want(file.name()) {
                continue;
            }
            let name = file.name().to_string();
            let mut bytes = Vec::with_capacity(prealloc_hint(file.size()));
            file.read_to_end(&mut bytes)
                .with_context(|| format!("read '{name}' from kmz '{}'", self.id))?;
            out.push((name, bytes));
        }
        Ok(out)
    }
}

impl BundleReader for KmzBundle {
    fn id(&self) -> &str {
        &self.id
    }

    fn list_mask_candidates(&self, naming: &MaskNaming) -> CoverlapResult<Vec<MaskCandidate>> {
        let entries = self.read_entries(|entry| naming.matches(basename(entry)))?;
        Ok(entries
            .into_iter()
            .map(|(entry, bytes)| {
                tracing::debug!(bundle = %self.id, entry = %entry, "found coverage mask");
                MaskCandidate {
                    name: basename(&entry).to_string(),
                    bytes,
                }
            })
            .collect())
    }

    fn viewer_placemark(&self, sentinel: &str) -> CoverlapResult<Option<PlacemarkRecord>> {
        let mut found = false;
        let kml = self.read_entries(|entry| {
            let hit = !found && entry.to_ascii_lowercase().ends_with(".kml");
            found |= hit;
            hit
        })?;
        let Some((entry, bytes)) = kml.into_iter().next() else {
            return Ok(None);
        };
        let xml = String::from_utf8(bytes).map_err(|e| {
            CoverlapError::placemark_parse(format!("'{entry}' in '{}' is not utf-8: {e}", self.id))
        })?;
        parse_viewer_placemark(&xml, sentinel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prealloc_hint_caps_declared_size() {
        assert_eq!(prealloc_hint(0), 0);
        assert_eq!(prealloc_hint(1024), 1024);
        assert_eq!(prealloc_hint(u64::MAX), MAX_PREALLOC as usize);
    }
}
