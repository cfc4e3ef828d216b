//! PASCAL VOC 2012 used as a 20-way image classifier.
//!
//! Expects the extracted devkit at `<root>/VOCdevkit/VOC2012/`. A sample's
//! class is the category of the first `<object>` in its annotation; images
//! are decoded and resized when the sample is fetched, which keeps the split
//! out of memory and lets the loader's worker do the decoding.

use std::fs;
use std::path::{Path, PathBuf};

use crate::data::dataset::Dataset;
use crate::datasets::registry::Split;
use crate::datasets::transform::image_bytes_to_rgb_chw;
use crate::error::{MonitorError, Result};

pub const RESIZE: usize = 300;

pub const OBJECT_CATEGORIES: [&str; 20] = [
    "aeroplane",
    "bicycle",
    "bird",
    "boat",
    "bottle",
    "bus",
    "car",
    "cat",
    "chair",
    "cow",
    "diningtable",
    "dog",
    "horse",
    "motorbike",
    "person",
    "pottedplant",
    "sheep",
    "sofa",
    "train",
    "tvmonitor",
];

pub fn category_index(name: &str) -> Result<usize> {
    OBJECT_CATEGORIES
        .iter()
        .position(|&c| c == name)
        .ok_or_else(|| MonitorError::Data(format!("unknown VOC category '{}'", name)))
}

/// Category name of the first object in a VOC annotation document.
pub fn first_object_name(annotation: &str) -> Result<&str> {
    let object = annotation
        .find("<object>")
        .ok_or_else(|| MonitorError::Data("annotation has no <object>".into()))?;
    let rest = &annotation[object..];
    let start = rest
        .find("<name>")
        .map(|i| i + "<name>".len())
        .ok_or_else(|| MonitorError::Data("first <object> has no <name>".into()))?;
    let len = rest[start..]
        .find("</name>")
        .ok_or_else(|| MonitorError::Data("unterminated <name> in annotation".into()))?;
    Ok(rest[start..start + len].trim())
}

pub struct VocClassification {
    base: PathBuf,
    ids: Vec<String>,
}

impl VocClassification {
    /// Reads the image-set list for `split` (`train.txt` or `val.txt`).
    pub fn open(root: &Path, split: Split) -> Result<VocClassification> {
        let base = root.join("VOCdevkit").join("VOC2012");
        let list = match split {
            Split::Train => "train.txt",
            Split::Test => "val.txt",
        };
        let ids = fs::read_to_string(base.join("ImageSets").join("Main").join(list))?
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned)
            .collect();
        Ok(VocClassification { base, ids })
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn label(&self, index: usize) -> Result<usize> {
        let id = self.id(index)?;
        let xml = fs::read_to_string(self.base.join("Annotations").join(format!("{}.xml", id)))?;
        category_index(first_object_name(&xml)?)
    }

    fn id(&self, index: usize) -> Result<&str> {
        self.ids
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| MonitorError::Data(format!("sample index {} out of range", index)))
    }
}

impl Dataset for VocClassification {
    fn len(&self) -> usize {
        self.ids.len()
    }

    fn features(&self) -> usize {
        3 * RESIZE * RESIZE
    }

    fn get(&self, index: usize) -> Result<(Vec<f64>, usize)> {
        let label = self.label(index)?;
        let id = self.id(index)?;
        let jpeg = fs::read(self.base.join("JPEGImages").join(format!("{}.jpg", id)))?;
        let input = image_bytes_to_rgb_chw(&jpeg, RESIZE as u32, RESIZE as u32)?;
        Ok((input, label))
    }
}
