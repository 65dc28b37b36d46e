use glam::DVec2;

use sediment_spatial::Aabb2;

use crate::MeshError;

/// A row-major 2D raster of f64 samples.
///
/// Fresh images are NaN-filled: NaN marks pixels no cell has written
/// yet, which keeps "unwritten" distinguishable from a deposited zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScalarImage {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl ScalarImage {
    /// Creates a NaN-filled image.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![f64::NAN; width * height],
        }
    }

    /// Wraps an existing sample buffer.
    ///
    /// The buffer length must match `width * height`.
    pub fn from_raw(data: Vec<f64>, width: usize, height: usize) -> Result<Self, MeshError> {
        if data.len() != width * height {
            return Err(MeshError::ImageShape {
                width,
                height,
                samples: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Returns the image dimensions as (width, height).
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the sample at pixel (x, y).
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }

    /// Writes the sample at pixel (x, y).
    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        self.data[y * self.width + x] = value;
    }

    /// Overwrites every sample with `value`.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Returns the raw samples in row-major order.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Consumes the image and returns the raw samples.
    pub fn into_raw(self) -> Vec<f64> {
        self.data
    }

    /// Returns the world coordinate of the center of pixel (x, y) when
    /// the image spans `domain`.
    pub fn pixel_center(&self, x: usize, y: usize, domain: Aabb2) -> DVec2 {
        let step = domain.size() / DVec2::new(self.width as f64, self.height as f64);
        domain.min + DVec2::new((x as f64 + 0.5) * step.x, (y as f64 + 0.5) * step.y)
    }

    /// Counts the pixels no write has touched.
    pub fn unwritten(&self) -> usize {
        self.data.iter().filter(|v| v.is_nan()).count()
    }
}
