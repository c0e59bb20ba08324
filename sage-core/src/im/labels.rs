// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

use std::collections::HashMap;
use std::path::Path;

use serde_json::json;

use crate::constant::{GOLDEN_RATIO_CONJUGATE, LABEL_SATURATION, LABEL_VALUE};
use crate::error::SageError;
use crate::im::{BinaryMask, SageBuffer};

/// Deterministic RGBA color for a label id.
///
/// Hues are spaced by the fractional part of the golden ratio so that
/// consecutive ids land far apart on the color wheel. Saturation and value
/// are fixed; alpha is always 1.0.
///
/// # Examples
///
/// ```
/// use sage_core::im::label_color;
///
/// let color = label_color(1);
/// assert_eq!(color[3], 1.0);
/// assert_eq!(color, label_color(1));
/// ```
pub fn label_color(id: u32) -> [f32; 4] {
    let hue = ((id as f64) * GOLDEN_RATIO_CONJUGATE).fract() as f32;
    let (r, g, b) = hsv_to_rgb(hue, LABEL_SATURATION, LABEL_VALUE);

    [r, g, b, 1.0]
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let i = (h * 6.0).floor();
    let f = h * 6.0 - i;

    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);

    match (i as i32).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

/// A mask accepted into the label map, kept for later boundary edits
#[derive(Debug, Clone)]
pub struct AcceptedMask {
    pub mask: BinaryMask,
    pub name: String,
    pub source_index: usize,
}

/// An integer-labeled raster with per-id names and colors.
///
/// The raster stores one u32 id per pixel with 0 reserved for background.
/// Accepting a mask under an existing name replaces that label's footprint
/// rather than accumulating pixels across accepts.
#[derive(Debug, Clone)]
pub struct LabelMap {
    raster: SageBuffer<u32>,
    names: HashMap<u32, String>,
    colors: HashMap<u32, [f32; 4]>,
    history: HashMap<u32, AcceptedMask>,
}

impl LabelMap {
    /// Initialize an empty label map for an image of the given size
    pub fn new(width: u32, height: u32) -> Self {
        LabelMap {
            raster: SageBuffer::filled(width, height, 1, 0u32),
            names: HashMap::new(),
            colors: HashMap::new(),
            history: HashMap::new(),
        }
    }

    /// Width of the label raster
    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    /// Height of the label raster
    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    /// The underlying id raster
    pub fn raster(&self) -> &SageBuffer<u32> {
        &self.raster
    }

    /// Number of labels currently in the map
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if the map holds no labels
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Label ids in ascending order
    pub fn ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.names.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// The id registered for a label name, if any
    pub fn id_of(&self, name: &str) -> Option<u32> {
        self.names
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(id, _)| *id)
    }

    /// The name registered for a label id, if any
    pub fn name_of(&self, id: u32) -> Option<&str> {
        self.names.get(&id).map(|name| name.as_str())
    }

    /// The color registered for a label id, if any
    pub fn color_of(&self, id: u32) -> Option<[f32; 4]> {
        self.colors.get(&id).copied()
    }

    /// The accepted mask history for a label id, if any
    pub fn history_of(&self, id: u32) -> Option<&AcceptedMask> {
        self.history.get(&id)
    }

    /// The id that would be allocated for the next new label name
    pub fn next_id(&self) -> u32 {
        self.names.keys().max().copied().unwrap_or(0) + 1
    }

    /// Write a binary mask into the raster under a label name.
    ///
    /// An existing name reuses its id and color; a new name allocates the
    /// next id and a generated color. The label's previous footprint is
    /// cleared before the new mask is written so repeated accepts under the
    /// same name replace rather than accumulate.
    ///
    /// # Arguments
    ///
    /// * `mask` - Binary mask matching the raster dimensions
    /// * `name` - Label name
    /// * `source_index` - Index of the candidate mask this accept came from
    pub fn accept_mask(
        &mut self,
        mask: &BinaryMask,
        name: &str,
        source_index: usize,
    ) -> Result<u32, SageError> {
        if mask.width() != self.width() || mask.height() != self.height() {
            return Err(SageError::LabelError(format!(
                "Mask shape ({}, {}) does not match label raster shape ({}, {})",
                mask.height(),
                mask.width(),
                self.height(),
                self.width()
            )));
        }

        let id = match self.id_of(name) {
            Some(id) => id,
            None => {
                let id = self.next_id();
                self.names.insert(id, name.to_string());
                self.colors.insert(id, label_color(id));
                id
            }
        };

        for (pixel, value) in self.raster.buffer.iter_mut().zip(mask.iter()) {
            if *pixel == id {
                *pixel = 0;
            }

            if *value > 0 {
                *pixel = id;
            }
        }

        self.history.insert(
            id,
            AcceptedMask {
                mask: mask.clone(),
                name: name.to_string(),
                source_index,
            },
        );

        Ok(id)
    }

    /// Serializable summary of all labels
    ///
    /// Produces `{"labels": {"<id>": {"name": ..., "color": ...}}}` with an
    /// optional `current_image` field naming the annotated image.
    pub fn export_info(&self, current_image: Option<&str>) -> serde_json::Value {
        let mut labels = serde_json::Map::new();

        for id in self.ids() {
            labels.insert(
                id.to_string(),
                json!({
                    "name": self.names[&id],
                    "color": self.colors[&id],
                }),
            );
        }

        let mut info = json!({ "labels": labels });

        if let Some(image) = current_image {
            info["current_image"] = json!(image);
        }

        info
    }

    /// Write the label summary to a JSON file
    pub fn export_to_file<P: AsRef<Path>>(
        &self,
        path: P,
        current_image: Option<&str>,
    ) -> Result<(), SageError> {
        let info = self.export_info(current_image);

        let contents = serde_json::to_string_pretty(&info)
            .map_err(|err| SageError::LabelError(err.to_string()))?;

        std::fs::write(path, contents).map_err(|err| SageError::LabelError(err.to_string()))?;

        Ok(())
    }

    /// Remove every label, clearing the raster and resetting id allocation
    pub fn clear_all(&mut self) {
        self.raster = SageBuffer::filled(self.width(), self.height(), 1, 0u32);
        self.names.clear();
        self.colors.clear();
        self.history.clear();
    }
}
