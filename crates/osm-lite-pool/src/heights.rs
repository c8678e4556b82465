// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Predicted building heights keyed by element id
//!
//! The regression model that produces these values runs elsewhere; it writes
//! one `id: height` pair per line, sometimes with a decimal comma.

use osm_lite_model::{ElementId, HeightPredictor, ModelError, Result};
use rustc_hash::FxHashMap;
use std::path::Path;

/// Lookup table of externally predicted heights (meters)
#[derive(Clone, Debug, Default)]
pub struct PredictedHeights {
    heights: FxHashMap<ElementId, f64>,
}

impl PredictedHeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `id: height` lines
    ///
    /// Blank lines are ignored, unreadable lines are skipped with a warning,
    /// and a repeated id keeps the last value.
    pub fn parse(text: &str) -> Self {
        let mut heights = FxHashMap::default();
        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(line) {
                Ok((id, h)) => {
                    heights.insert(id, h);
                }
                Err(e) => log::warn!("[Heights] line {}: {}", line_no + 1, e),
            }
        }
        Self { heights }
    }

    /// Read and parse a prediction file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    pub fn insert(&mut self, id: ElementId, height: f64) {
        self.heights.insert(id, height);
    }

    /// Predicted height, if one was recorded for this id
    #[inline]
    pub fn get(&self, id: ElementId) -> Option<f64> {
        self.heights.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }
}

impl HeightPredictor for PredictedHeights {
    fn predict_height(&self, id: ElementId) -> Option<f64> {
        self.get(id)
    }
}

fn parse_line(line: &str) -> Result<(ElementId, f64)> {
    let (id, value) = line
        .split_once(':')
        .ok_or_else(|| ModelError::format(format!("missing ':' in {line:?}")))?;
    let id = id
        .trim()
        .parse::<ElementId>()
        .map_err(|e| ModelError::format(format!("bad id {id:?}: {e}")))?;
    let value = value.trim().replace(',', ".");
    let height = value
        .parse::<f64>()
        .map_err(|e| ModelError::format(format!("bad height {value:?}: {e}")))?;
    Ok((id, height))
}
