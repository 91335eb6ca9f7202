// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use crate::common::{Error, ErrorCode, ErrorKind, Result};

/// Source of background drawing sizes.  Loading a level only needs the
/// pixel dimensions of its drawing, never the pixels themselves.
pub trait DrawingLoader {
    /// Width and height in pixels of the drawing named `filename`, as it
    /// appears in the level record.
    fn dimensions(&self, filename: &str) -> Result<(u32, u32)>;
}

/// A loader for contexts without file access; every drawing is unavailable
/// and levels fall back to their default size.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoDrawings;

impl DrawingLoader for NoDrawings {
    fn dimensions(&self, filename: &str) -> Result<(u32, u32)> {
        Err(Error::new(
            ErrorKind::Resource,
            ErrorCode::DrawingUnavailable,
            Some(format!("no drawings available (wanted {filename})")),
        ))
    }
}

impl<F> DrawingLoader for F
where
    F: Fn(&str) -> Result<(u32, u32)>,
{
    fn dimensions(&self, filename: &str) -> Result<(u32, u32)> {
        self(filename)
    }
}
