//! Color histograms and the stored reference table.

use anyhow::{anyhow, Context, Result};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::coords::Resolution;

pub const HISTOGRAM_BINS: usize = 256;

/// 256-bin histogram of a capture's blue channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Histogram(pub Vec<f32>);

impl Histogram {
    pub fn from_image(img: &RgbaImage) -> Self {
        let mut bins = vec![0f32; HISTOGRAM_BINS];
        for pixel in img.pixels() {
            bins[pixel[2] as usize] += 1.0;
        }
        Self(bins)
    }

    /// Bhattacharyya distance: 0.0 for identical distributions, 1.0 for disjoint ones.
    pub fn distance(&self, other: &Histogram) -> f64 {
        let mut sum_a = 0f64;
        let mut sum_b = 0f64;
        let mut overlap = 0f64;
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            let (a, b) = (*a as f64, *b as f64);
            sum_a += a;
            sum_b += b;
            overlap += (a * b).sqrt();
        }

        let norm = sum_a * sum_b;
        let scale = if norm.abs() > f64::EPSILON {
            1.0 / norm.sqrt()
        } else {
            1.0
        };
        (1.0 - overlap * scale).max(0.0).sqrt()
    }
}

/// Reference histograms for one resolution, keyed like `teams/usmc/active`.
#[derive(Clone, Debug, Default)]
pub struct ReferenceHistograms {
    entries: HashMap<String, Histogram>,
}

impl ReferenceHistograms {
    /// Loads the table for `resolution` from a JSON file of the form
    /// `{ "720p": { "<key>": [256 numbers] } }`.
    pub fn load(path: &Path, resolution: Resolution) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read reference histograms from {}", path.display()))?;
        Self::parse(&contents, resolution)
    }

    pub fn parse(json: &str, resolution: Resolution) -> Result<Self> {
        let mut all: HashMap<String, HashMap<String, Histogram>> =
            serde_json::from_str(json).context("Failed to parse reference histograms")?;
        let entries = all
            .remove(resolution.as_str())
            .ok_or_else(|| anyhow!("No reference histograms for {}", resolution))?;

        for (key, histogram) in &entries {
            if histogram.0.len() != HISTOGRAM_BINS {
                return Err(anyhow!(
                    "Reference histogram {} has {} bins, expected {}",
                    key,
                    histogram.0.len(),
                    HISTOGRAM_BINS
                ));
            }
        }

        Ok(Self { entries })
    }

    pub fn from_entries(entries: HashMap<String, Histogram>) -> Self {
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&Histogram> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn uniform(value: u8) -> Histogram {
        let img: RgbaImage = ImageBuffer::from_pixel(4, 4, Rgba([0, 0, value, 255]));
        Histogram::from_image(&img)
    }

    #[test]
    fn test_from_image_counts_blue_channel() {
        let hist = uniform(200);
        assert_eq!(hist.0[200], 16.0);
        assert_eq!(hist.0.iter().sum::<f32>(), 16.0);
    }

    #[test]
    fn test_distance_bounds() {
        assert!(uniform(10).distance(&uniform(10)) < 1e-6);
        assert!((uniform(10).distance(&uniform(240)) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_distance_partial_overlap() {
        let mut bins = vec![0f32; HISTOGRAM_BINS];
        bins[10] = 8.0;
        bins[240] = 8.0;
        let d = Histogram(bins).distance(&uniform(10));
        assert!(d > 0.2 && d < 0.9, "{}", d);
    }

    #[test]
    fn test_parse_selects_resolution() {
        let bins = vec![1.0; HISTOGRAM_BINS];
        let json = serde_json::json!({
            "720p": { "teams/usmc/active": bins },
            "900p": {}
        })
        .to_string();

        let refs = ReferenceHistograms::parse(&json, Resolution::Hd720).unwrap();
        assert_eq!(refs.len(), 1);
        assert!(refs.get("teams/usmc/active").is_some());

        let refs = ReferenceHistograms::parse(&json, Resolution::Hd900).unwrap();
        assert_eq!(refs.len(), 0);
    }

    #[test]
    fn test_parse_rejects_wrong_bin_count() {
        let json = r#"{ "720p": { "short": [1.0, 2.0] } }"#;
        assert!(ReferenceHistograms::parse(json, Resolution::Hd720).is_err());
    }

    #[test]
    fn test_parse_rejects_missing_resolution() {
        assert!(ReferenceHistograms::parse("{}", Resolution::Hd900).is_err());
    }
}
