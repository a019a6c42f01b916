//! Labeled image sources
//!
//! Training and testing consume one source per class. A source is either a directory of image
//! files or a collection of images which were loaded beforehand.
use std::path::{Path, PathBuf};

use image::DynamicImage;
use walkdir::WalkDir;

use crate::error::Result;

/// File extensions recognized as images, compared case-insensitively
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "bmp", "gif", "jpg", "jpe", "jpeg", "png", "pbm", "pgm", "ppm", "tif", "tiff", "webp",
];

/// Where the images of a class come from
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// All image files directly inside this directory
    Directory(PathBuf),
    /// Images already held in memory
    Images(Vec<DynamicImage>),
}

/// An image source together with the class its images belong to
#[derive(Debug, Clone)]
pub struct LabeledSource {
    pub class_name: String,
    pub source: ImageSource,
}

impl LabeledSource {
    pub fn new<S: Into<String>>(class_name: S, source: ImageSource) -> Self {
        LabeledSource {
            class_name: class_name.into(),
            source,
        }
    }

    pub fn directory<S: Into<String>, P: Into<PathBuf>>(class_name: S, path: P) -> Self {
        Self::new(class_name, ImageSource::Directory(path.into()))
    }

    pub fn images<S: Into<String>>(class_name: S, images: Vec<DynamicImage>) -> Self {
        Self::new(class_name, ImageSource::Images(images))
    }
}

/// Whether the path carries one of the known image extensions
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// List the image files of a directory, ordered by file name
///
/// Sub-directories are not descended into.
pub fn image_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_file() && is_image_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
