//! Preview frames
//!
//! While collecting data every accepted image can be shown on a display together with the class
//! it is used for. The display itself is supplied by the caller through [`PreviewSink`].
use image::{imageops::FilterType, DynamicImage, GenericImageView, RgbaImage};

/// Largest width of a preview frame
pub const PREVIEW_WIDTH: u32 = 640;
/// Largest height of a preview frame
pub const PREVIEW_HEIGHT: u32 = 480;

/// Image scaled for display with a caption
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    pub image: RgbaImage,
    pub caption: String,
}

impl PreviewFrame {
    /// Scale the image to fit into the preview bounds, keeping its aspect ratio
    ///
    /// Images smaller than the bounds are not enlarged.
    pub fn new<S: Into<String>>(image: &DynamicImage, caption: S) -> Self {
        let (w, h) = image.dimensions();
        let image = if w > PREVIEW_WIDTH || h > PREVIEW_HEIGHT {
            image
                .resize(PREVIEW_WIDTH, PREVIEW_HEIGHT, FilterType::Triangle)
                .to_rgba8()
        } else {
            image.to_rgba8()
        };

        PreviewFrame {
            image,
            caption: caption.into(),
        }
    }
}

/// Receives preview frames
pub trait PreviewSink {
    fn show(&mut self, frame: &PreviewFrame);
}

/// Keeps every frame in memory
impl PreviewSink for Vec<PreviewFrame> {
    fn show(&mut self, frame: &PreviewFrame) {
        self.push(frame.clone());
    }
}
