//! Data collection
//!
//! Walks a labeled image source, runs the feature extractors on every image and appends the
//! usable rows to a feature table.
use std::fmt;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use log::{debug, info};

use crate::display::{PreviewFrame, PreviewSink};
use crate::error::Result;
use crate::extractor::{extract_all, FeatureExtractor};
use crate::source::{image_files, ImageSource, LabeledSource};
use crate::table::{FeatureRow, FeatureTable};

/// Options shared by training and testing runs
///
/// | Name | Default | Purpose |
/// | :--- | :--- | :--- |
/// | [subset](Self::subset) | none | Consume at most this many images per class |
/// | [save_data](Self::save_data) | none | Export the collected table as tab-delimited file |
/// | [verbose](Self::verbose) | `false` | Log opened files, classifications and the results |
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOptions {
    subset: Option<usize>,
    save_data: Option<PathBuf>,
    verbose: bool,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use at most `subset` images of every class, `0` uses all images
    pub fn subset(mut self, subset: usize) -> Self {
        self.subset = Some(subset);
        self
    }

    /// Write the collected table to `path`
    pub fn save_data<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.save_data = Some(path.into());
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Effective per-class cap, a cap of zero means no cap
    pub fn subset_limit(&self) -> Option<usize> {
        self.subset.filter(|&n| n > 0)
    }

    pub fn save_data_path(&self) -> Option<&Path> {
        self.save_data.as_deref()
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Stage of a run, used for preview captions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Training,
    Testing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Phase::Training => write!(f, "Training"),
            Phase::Testing => write!(f, "Testing"),
        }
    }
}

/// Display sink which drops every frame
pub struct NoDisplay;

impl PreviewSink for NoDisplay {
    fn show(&mut self, _: &PreviewFrame) {}
}

/// Collect the rows of a single class into `table`
///
/// Images for which any extractor yields no value are skipped. Returns the number of rows
/// appended.
pub fn collect<S: PreviewSink + ?Sized>(
    extractors: &[Box<dyn FeatureExtractor>],
    labeled: &LabeledSource,
    table: &mut FeatureTable,
    opts: &RunOptions,
    phase: Phase,
    mut display: Option<&mut S>,
) -> Result<usize> {
    let limit = opts.subset_limit().unwrap_or(usize::MAX);
    let mut count = 0;

    let mut accept = |image: &DynamicImage, name: &dyn fmt::Display| -> Result<()> {
        let values = match extract_all(extractors, image)? {
            Some(values) => values,
            None => {
                debug!("Skipping {}, no features extracted", name);
                return Ok(());
            }
        };

        table.push(FeatureRow::new(values, labeled.class_name.as_str()))?;
        if let Some(sink) = display.as_deref_mut() {
            let caption = format!("{}: {}", phase, labeled.class_name);
            sink.show(&PreviewFrame::new(image, caption));
        }
        count += 1;

        Ok(())
    };

    match &labeled.source {
        ImageSource::Directory(dir) => {
            for path in image_files(dir)?.into_iter().take(limit) {
                if opts.verbose {
                    info!("Opening file: {}", path.display());
                }
                let image = image::open(&path)?;
                accept(&image, &path.display())?;
            }
        }
        ImageSource::Images(images) => {
            for (idx, image) in images.iter().take(limit).enumerate() {
                let name = format!("{} image #{}", labeled.class_name, idx);
                if opts.verbose {
                    info!("Opening {}", name);
                }
                accept(image, &name)?;
            }
        }
    }

    Ok(count)
}
