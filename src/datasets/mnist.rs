//! MNIST in its IDX form, laid out as `<root>/MNIST/raw/`.

use std::fs;
use std::path::Path;

use crate::data::dataset::TensorDataset;
use crate::datasets::registry::Split;
use crate::datasets::transform::to_unit_range;
use crate::error::{MonitorError, Result};

pub const SIDE: usize = 28;
const CLASSES: usize = 10;

pub fn load(root: &Path, split: Split) -> Result<TensorDataset> {
    let dir = root.join("MNIST").join("raw");
    let prefix = match split {
        Split::Train => "train",
        Split::Test => "t10k",
    };
    let images = fs::read(dir.join(format!("{}-images-idx3-ubyte", prefix)))?;
    let labels = fs::read(dir.join(format!("{}-labels-idx1-ubyte", prefix)))?;
    let dataset = parse_idx_pair(&images, &labels, CLASSES)?;
    Ok(dataset)
}

fn read_u32_be(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

/// Checks the 4-byte IDX magic: two reserved zero bytes, dtype 0x08 (uint8),
/// then the number of dimensions.
fn check_magic(bytes: &[u8], dims: u8, header_len: usize, what: &str) -> Result<()> {
    if bytes.len() < header_len {
        return Err(MonitorError::Data(format!(
            "IDX {} file too short: expected at least {} header bytes, got {}",
            what, header_len, bytes.len()
        )));
    }
    if bytes[..4] != [0x00, 0x00, 0x08, dims] {
        return Err(MonitorError::Data(format!(
            "IDX {} file: bad magic {:02X?}, expected [00, 00, 08, {:02X}]",
            what, &bytes[..4], dims
        )));
    }
    Ok(())
}

/// Parses an IDX3 image file and an IDX1 label file.
///
/// # IDX3 image file layout
/// ```text
/// bytes  0-3:   0x00 0x00 0x08 0x03
/// bytes  4-7:   N           (number of images, big-endian u32)
/// bytes  8-11:  rows        (big-endian u32)
/// bytes 12-15:  cols        (big-endian u32)
/// bytes 16..:   N * rows * cols bytes, row-major, uint8
/// ```
///
/// # IDX1 label file layout
/// ```text
/// bytes  0-3:   0x00 0x00 0x08 0x01
/// bytes  4-7:   N           (number of labels, big-endian u32)
/// bytes  8..:   N bytes, each a class index in [0, n_classes)
/// ```
///
/// Pixels are scaled to [0, 1]; each image becomes one single-channel plane.
pub fn parse_idx_pair(image_bytes: &[u8], label_bytes: &[u8], n_classes: usize) -> Result<TensorDataset> {
    check_magic(image_bytes, 0x03, 16, "image")?;
    check_magic(label_bytes, 0x01, 8, "label")?;

    let n_items = read_u32_be(image_bytes, 4) as usize;
    let rows = read_u32_be(image_bytes, 8) as usize;
    let cols = read_u32_be(image_bytes, 12) as usize;
    let n_labels = read_u32_be(label_bytes, 4) as usize;

    if n_labels != n_items {
        return Err(MonitorError::Data(format!(
            "IDX file mismatch: image file declares {} items but label file declares {}",
            n_items, n_labels
        )));
    }

    let n_pixels = rows
        .checked_mul(cols)
        .ok_or_else(|| MonitorError::Data(format!("IDX image file: {}x{} overflows", rows, cols)))?;
    let image_len = n_items
        .checked_mul(n_pixels)
        .and_then(|n| n.checked_add(16))
        .ok_or_else(|| MonitorError::Data("IDX image file: data length overflows".into()))?;
    if image_bytes.len() < image_len {
        return Err(MonitorError::Data(format!(
            "IDX image file too short: header declares {} images of {}x{} pixels but file is {} bytes",
            n_items, rows, cols, image_bytes.len()
        )));
    }
    if label_bytes.len() < 8 + n_items {
        return Err(MonitorError::Data(format!(
            "IDX label file too short: header declares {} labels but file is {} bytes",
            n_items, label_bytes.len()
        )));
    }

    let inputs = image_bytes[16..image_len]
        .chunks_exact(n_pixels.max(1))
        .map(to_unit_range)
        .collect();

    let labels = label_bytes[8..8 + n_items]
        .iter()
        .enumerate()
        .map(|(i, &class)| {
            let class = class as usize;
            if class >= n_classes {
                Err(MonitorError::Data(format!(
                    "IDX label at index {}: class {} out of range for {} classes",
                    i, class, n_classes
                )))
            } else {
                Ok(class)
            }
        })
        .collect::<Result<Vec<usize>>>()?;

    TensorDataset::new(inputs, labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::Dataset;

    fn idx_images(n: u32, rows: u32, cols: u32, fill: u8) -> Vec<u8> {
        let mut bytes = vec![0x00, 0x00, 0x08, 0x03];
        for v in [n, rows, cols] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.extend(std::iter::repeat(fill).take((n * rows * cols) as usize));
        bytes
    }

    fn idx_labels(labels: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0x00, 0x00, 0x08, 0x01];
        bytes.extend_from_slice(&(labels.len() as u32).to_be_bytes());
        bytes.extend_from_slice(labels);
        bytes
    }

    #[test]
    fn parses_images_and_class_indices() {
        let ds = parse_idx_pair(&idx_images(2, 2, 2, 255), &idx_labels(&[3, 9]), 10).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.features(), 4);
        let (x, y) = ds.get(1).unwrap();
        assert_eq!(x, vec![1.0; 4]);
        assert_eq!(y, 9);
    }

    #[test]
    fn rejects_swapped_files() {
        let err = parse_idx_pair(&idx_labels(&[1]), &idx_images(1, 1, 1, 0), 10).unwrap_err();
        assert!(err.to_string().contains("bad magic"));
    }

    #[test]
    fn rejects_truncated_pixels() {
        let mut images = idx_images(2, 2, 2, 0);
        images.pop();
        assert!(parse_idx_pair(&images, &idx_labels(&[0, 1]), 10).is_err());
    }

    #[test]
    fn rejects_out_of_range_labels() {
        assert!(parse_idx_pair(&idx_images(1, 1, 1, 0), &idx_labels(&[10]), 10).is_err());
    }

    #[test]
    fn loads_torchvision_layout_from_disk() {
        let root = tempfile::tempdir().unwrap();
        let raw = root.path().join("MNIST").join("raw");
        fs::create_dir_all(&raw).unwrap();
        fs::write(raw.join("t10k-images-idx3-ubyte"), idx_images(3, 28, 28, 0)).unwrap();
        fs::write(raw.join("t10k-labels-idx1-ubyte"), idx_labels(&[0, 1, 2])).unwrap();

        let ds = load(root.path(), Split::Test).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.features(), SIDE * SIDE);
    }
}
