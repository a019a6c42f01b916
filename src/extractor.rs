//! Feature extractors
//!
//! A feature extractor turns an image into a fixed-length vector of numbers. The crate does not
//! ship any extractors, they are supplied by the caller and combined in order. The output of all
//! extractors is concatenated into a single row of the feature table.
use image::DynamicImage;
use log::debug;

use crate::error::{ClassifierError, Result};

/// Convert an image into a fixed number of named features
///
/// Implementors have to return exactly as many values from [`extract`](Self::extract) as they
/// declare names in [`field_names`](Self::field_names). Returning `None` marks the image as
/// unusable and excludes it from training and testing.
pub trait FeatureExtractor {
    /// Extract the feature values of an image
    fn extract(&self, image: &DynamicImage) -> Option<Vec<f64>>;

    /// Names of the features produced by `extract`, in order
    fn field_names(&self) -> Vec<String>;
}

/// Concatenated field names of all extractors
pub fn field_names(extractors: &[Box<dyn FeatureExtractor>]) -> Vec<String> {
    extractors.iter().flat_map(|e| e.field_names()).collect()
}

/// Run every extractor on the image and concatenate their output
///
/// Returns `Ok(None)` if any extractor yields no value or a value that is not finite. An
/// extractor returning a different number of values than it declares is an error.
pub fn extract_all(
    extractors: &[Box<dyn FeatureExtractor>],
    image: &DynamicImage,
) -> Result<Option<Vec<f64>>> {
    let mut row = Vec::new();
    for extractor in extractors {
        let values = match extractor.extract(image) {
            Some(values) => values,
            None => return Ok(None),
        };

        let expected = extractor.field_names().len();
        if values.len() != expected {
            return Err(ClassifierError::FieldCount {
                expected,
                found: values.len(),
            });
        }

        if values.iter().any(|v| !v.is_finite()) {
            debug!("Extractor {:?} produced non-finite values", extractor.field_names());
            return Ok(None);
        }

        row.extend(values);
    }

    Ok(Some(row))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{extract_all, field_names, FeatureExtractor};
    use crate::error::ClassifierError;
    use image::{DynamicImage, GenericImageView, Rgb, RgbImage};

    /// Mean of each colour channel, scaled to `[0, 1]`
    pub struct MeanColor;

    impl FeatureExtractor for MeanColor {
        fn extract(&self, image: &DynamicImage) -> Option<Vec<f64>> {
            let (w, h) = image.dimensions();
            if w == 0 || h == 0 {
                return None;
            }

            let mut sum = [0.0f64; 3];
            for (_, _, px) in image.pixels() {
                for (s, c) in sum.iter_mut().zip(px.0.iter()) {
                    *s += *c as f64 / 255.;
                }
            }

            let n = (w * h) as f64;
            Some(sum.iter().map(|s| s / n).collect())
        }

        fn field_names(&self) -> Vec<String> {
            vec!["red".into(), "green".into(), "blue".into()]
        }
    }

    /// Fails for images wider than `max_width`
    pub struct WidthGate {
        pub max_width: u32,
    }

    impl FeatureExtractor for WidthGate {
        fn extract(&self, image: &DynamicImage) -> Option<Vec<f64>> {
            if image.width() > self.max_width {
                None
            } else {
                Some(vec![image.width() as f64])
            }
        }

        fn field_names(&self) -> Vec<String> {
            vec!["width".into()]
        }
    }

    /// Yields the same value for every image
    pub struct Constant(pub f64);

    impl FeatureExtractor for Constant {
        fn extract(&self, _: &DynamicImage) -> Option<Vec<f64>> {
            Some(vec![self.0])
        }

        fn field_names(&self) -> Vec<String> {
            vec!["constant".into()]
        }
    }

    struct Liar;

    impl FeatureExtractor for Liar {
        fn extract(&self, _: &DynamicImage) -> Option<Vec<f64>> {
            Some(vec![1.0, 2.0])
        }

        fn field_names(&self) -> Vec<String> {
            vec!["only".into()]
        }
    }

    pub fn solid(w: u32, h: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(color)))
    }

    #[test]
    fn concatenates_in_order() {
        let extractors: Vec<Box<dyn FeatureExtractor>> =
            vec![Box::new(WidthGate { max_width: 100 }), Box::new(MeanColor)];

        assert_eq!(
            field_names(&extractors),
            vec!["width", "red", "green", "blue"]
        );

        let row = extract_all(&extractors, &solid(4, 2, [255, 0, 255]))
            .unwrap()
            .unwrap();
        assert_eq!(row, vec![4.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn missing_output_skips_image() {
        let extractors: Vec<Box<dyn FeatureExtractor>> =
            vec![Box::new(MeanColor), Box::new(WidthGate { max_width: 3 })];

        let row = extract_all(&extractors, &solid(4, 4, [0, 0, 0])).unwrap();
        assert!(row.is_none());
    }

    #[test]
    fn wrong_width_is_an_error() {
        let extractors: Vec<Box<dyn FeatureExtractor>> = vec![Box::new(Liar)];

        let err = extract_all(&extractors, &solid(1, 1, [0, 0, 0])).unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::FieldCount {
                expected: 1,
                found: 2
            }
        ));
    }

    #[test]
    fn non_finite_output_skips_image() {
        for value in &[f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let extractors: Vec<Box<dyn FeatureExtractor>> =
                vec![Box::new(MeanColor), Box::new(Constant(*value))];

            let row = extract_all(&extractors, &solid(2, 2, [10, 20, 30])).unwrap();
            assert!(row.is_none());
        }
    }
}
