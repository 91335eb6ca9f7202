// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::path::{Path, PathBuf};

use building_map::{DrawingLoader, Error, ErrorCode, ErrorKind, Result};

/// Reads drawing sizes from image files next to the building map.  Only
/// the image header is decoded.
pub struct ImageDrawings {
    base_dir: PathBuf,
}

impl ImageDrawings {
    pub fn new(base_dir: &Path) -> Self {
        ImageDrawings {
            base_dir: base_dir.to_path_buf(),
        }
    }
}

impl DrawingLoader for ImageDrawings {
    fn dimensions(&self, filename: &str) -> Result<(u32, u32)> {
        let path = self.base_dir.join(filename);
        log::debug!("reading drawing size from {}", path.display());
        image::image_dimensions(&path).map_err(|err| {
            Error::new(
                ErrorKind::Resource,
                ErrorCode::DrawingUnavailable,
                Some(format!("{}: {err}", path.display())),
            )
        })
    }
}
