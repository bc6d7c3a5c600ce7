//! Thumbnail geometry for image attributes

use crate::error::{ManifestError, ManifestResult};
use crate::grid::{CellRef, ImageAnchor};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Logical box a thumbnail must fit into, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageBox {
    pub width: f64,
    pub height: f64,
}

impl Default for ImageBox {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 100.0,
        }
    }
}

/// Fitted draw size of one thumbnail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePlacement {
    pub width: u32,
    pub height: u32,
}

impl ImagePlacement {
    pub fn anchor(&self, cell: CellRef, path: &Path) -> ImageAnchor {
        ImageAnchor {
            cell,
            path: path.to_path_buf(),
            width: self.width,
            height: self.height,
            offset_x: 0,
            offset_y: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ImagePlacer {
    target: ImageBox,
    rows_per_image: u32,
}

impl ImagePlacer {
    pub fn new(target: ImageBox, rows_per_image: u32) -> Self {
        Self {
            target,
            rows_per_image,
        }
    }

    /// Fit a `src_width` x `src_height` image inside the target box, keeping
    /// its aspect ratio
    pub fn fit(&self, src_width: u32, src_height: u32) -> (u32, u32) {
        let (sw, sh) = (f64::from(src_width), f64::from(src_height));
        let (tw, th) = (self.target.width, self.target.height);

        let (w, h) = if sw / sh > tw / th {
            (tw, sh * tw / sw)
        } else {
            (sw * th / sh, th)
        };

        (w.round().max(1.0) as u32, h.round().max(1.0) as u32)
    }

    /// Read the image's natural size and fit it
    pub fn place(&self, path: &Path) -> ManifestResult<ImagePlacement> {
        let (src_width, src_height) = image::image_dimensions(path).map_err(|e| {
            ManifestError::Image(format!("Failed to read {}: {}", path.display(), e))
        })?;

        if src_width == 0 || src_height == 0 {
            return Err(ManifestError::Image(format!(
                "{} has no pixels",
                path.display()
            )));
        }

        let (width, height) = self.fit(src_width, src_height);
        Ok(ImagePlacement { width, height })
    }

    /// Rows to reserve below an attribute block so its images do not run
    /// into the next block
    pub fn extra_row_span(&self, image_count: usize, attribute_count: usize) -> u32 {
        let reserved = image_count as u64 * u64::from(self.rows_per_image);
        reserved.saturating_sub(attribute_count as u64) as u32
    }
}
