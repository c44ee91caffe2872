use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::core::Coordinate;
use crate::foundation::error::{CoverlapError, CoverlapResult};
use crate::mask::naming::is_plain_file_name;
use crate::pipeline::{KeyedRaster, PipelineOutput};

pub const MANIFEST_FILE: &str = "tiles.json";
pub const COORDINATES_FILE: &str = "viewers.json";

/// Writes pipeline results into one output directory.
#[derive(Clone, Debug)]
pub struct ResultEmitter {
    out_dir: PathBuf,
}

impl ResultEmitter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Writes rasters, manifest and coordinates; returns every path written.
    pub fn emit(&self, output: &PipelineOutput) -> CoverlapResult<Vec<PathBuf>> {
        let mut written = self.write_rasters(&output.rasters)?;
        written.push(self.write_manifest(&output.keys())?);
        written.push(self.write_coordinates(&output.coordinates)?);
        Ok(written)
    }

    pub fn write_rasters(&self, rasters: &[KeyedRaster]) -> CoverlapResult<Vec<PathBuf>> {
        self.ensure_dir()?;
        let mut written = Vec::with_capacity(rasters.len());
        for r in rasters {
            let path = self.key_path(&r.key)?;
            image::save_buffer_with_format(
                &path,
                &r.raster.rgba8,
                r.raster.dims.width,
                r.raster.dims.height,
                image::ColorType::Rgba8,
                image::ImageFormat::Png,
            )
            .with_context(|| format!("write png '{}'", path.display()))?;
            tracing::debug!(path = %path.display(), "wrote overlap raster");
            written.push(path);
        }
        Ok(written)
    }

    pub fn write_manifest(&self, keys: &[String]) -> CoverlapResult<PathBuf> {
        self.write_json(MANIFEST_FILE, keys)
    }

    pub fn write_coordinates(&self, coords: &[Coordinate]) -> CoverlapResult<PathBuf> {
        self.write_json(COORDINATES_FILE, coords)
    }

    fn write_json<T: serde::Serialize + ?Sized>(
        &self,
        file_name: &str,
        value: &T,
    ) -> CoverlapResult<PathBuf> {
        self.ensure_dir()?;
        let path = self.out_dir.join(file_name);
        let f = File::create(&path).with_context(|| format!("create '{}'", path.display()))?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer(&mut w, value)
            .with_context(|| format!("write json '{}'", path.display()))?;
        w.flush()
            .with_context(|| format!("flush '{}'", path.display()))?;
        Ok(path)
    }

    fn ensure_dir(&self) -> CoverlapResult<()> {
        std::fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("create output dir '{}'", self.out_dir.display()))?;
        Ok(())
    }

    /// Keys come from archive entry names; refuse anything that would escape the output dir.
    fn key_path(&self, key: &str) -> CoverlapResult<PathBuf> {
        if !is_plain_file_name(key) {
            return Err(CoverlapError::invalid_key(format!(
                "output key '{key}' is not a plain file name"
            )));
        }
        Ok(self.out_dir.join(key))
    }
}
