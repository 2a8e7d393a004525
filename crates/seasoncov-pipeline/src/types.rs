//! Shared types for the seasoncov pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference
/// intermediate raster data without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbaImage` so downstream crates can build a
/// [`PixelBuffer`] without depending on `image` directly.
pub use image::RgbaImage;

/// A 2D integer point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: i32,
    /// Vertical position (pixels from top edge).
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Total number of pixels (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Row-major index of the pixel at `(x, y)`.
    #[must_use]
    pub const fn index(self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// A decoded RGBA8 frame.
///
/// Construction validates that both dimensions are non-zero and that the
/// pixel data holds exactly `width * height * 4` bytes. The buffer is
/// never resized afterwards, and the pipeline only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer(pub(crate) RgbaImage);

impl PixelBuffer {
    /// Wrap raw RGBA8 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] if `width` or `height` is
    /// zero, or if `pixels.len() != width * height * 4`.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidInput(format!(
                "frame must have non-zero area, got {width}x{height}"
            )));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| {
                PipelineError::InvalidInput(format!("frame {width}x{height} is too large"))
            })?;
        if pixels.len() != expected {
            return Err(PipelineError::InvalidInput(format!(
                "expected {expected} bytes for a {width}x{height} RGBA frame, got {}",
                pixels.len()
            )));
        }
        RgbaImage::from_raw(width, height, pixels)
            .map(Self)
            .ok_or_else(|| PipelineError::InvalidInput("pixel data does not fit frame".into()))
    }

    /// Wrap an already decoded [`RgbaImage`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] if the image has zero area.
    pub fn from_image(image: RgbaImage) -> Result<Self, PipelineError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(PipelineError::InvalidInput(format!(
                "frame must have non-zero area, got {}x{}",
                image.width(),
                image.height()
            )));
        }
        Ok(Self(image))
    }

    /// Frame width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    /// Frame height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.0.height()
    }

    /// Frame dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.0.width(),
            height: self.0.height(),
        }
    }

    /// The raw RGBA8 bytes, row-major.
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        self.0.as_raw()
    }

    /// Borrow the underlying image.
    #[must_use]
    pub const fn as_image(&self) -> &RgbaImage {
        &self.0
    }

    /// Consume the buffer and return the underlying image.
    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.0
    }

    /// Iterate over pixels as `[r, g, b, a]` in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
        self.0.pixels().map(|p| p.0)
    }
}

/// Binary region-of-interest grid, one entry per pixel.
///
/// `true` means the pixel belongs to the chip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    dimensions: Dimensions,
    bits: Vec<bool>,
}

impl Mask {
    /// A mask that selects nothing.
    #[must_use]
    pub fn empty(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            bits: vec![false; dimensions.pixel_count()],
        }
    }

    /// Build a mask from a binary image: any non-zero pixel is inside.
    #[must_use]
    pub fn from_gray(image: &GrayImage) -> Self {
        Self {
            dimensions: Dimensions {
                width: image.width(),
                height: image.height(),
            },
            bits: image.as_raw().iter().map(|&v| v != 0).collect(),
        }
    }

    /// Build a mask from row-major pixel indices.
    ///
    /// Indices outside the grid are ignored.
    #[must_use]
    pub fn from_indices(dimensions: Dimensions, indices: &[usize]) -> Self {
        let mut mask = Self::empty(dimensions);
        for &i in indices {
            if let Some(bit) = mask.bits.get_mut(i) {
                *bit = true;
            }
        }
        mask
    }

    /// Mask dimensions (always equal to the source frame's).
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Whether the pixel at `(x, y)` is inside the region.
    ///
    /// Out-of-range coordinates are outside.
    #[must_use]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.dimensions.width
            && y < self.dimensions.height
            && self.bits[self.dimensions.index(x, y)]
    }

    /// Per-pixel membership in row-major order.
    #[must_use]
    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    /// Number of pixels inside the region.
    #[must_use]
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Returns `true` if the mask selects no pixel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.bits.iter().any(|&b| b)
    }

    /// Render as a 0/255 grayscale image (255 = inside).
    #[must_use]
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.dimensions.width, self.dimensions.height, |x, y| {
            image::Luma([if self.bits[self.dimensions.index(x, y)] {
                255
            } else {
                0
            }])
        })
    }
}

/// An ordered closed boundary traced from a binary map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contour(Vec<Point>);

impl Contour {
    /// Create a contour from boundary points in traversal order.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns the number of points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the contour has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Area enclosed by the closed boundary (shoelace formula).
    #[must_use]
    pub fn area(&self) -> f64 {
        shoelace_area(&self.0)
    }

    /// Length of the closed boundary, including the closing segment.
    #[must_use]
    pub fn perimeter(&self) -> f64 {
        closed_length(&self.0)
    }
}

/// A simplified closed polygon used to fill the chip mask.
///
/// Consecutive duplicate vertices and a trailing vertex equal to the
/// first are dropped on construction, so the vertex list never repeats
/// its starting point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon(Vec<Point>);

impl Polygon {
    /// Create a polygon from vertices in boundary order.
    #[must_use]
    pub fn new(mut vertices: Vec<Point>) -> Self {
        vertices.dedup();
        while vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        Self(vertices)
    }

    /// Returns the number of vertices.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the polygon has no vertices.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a slice of all vertices.
    #[must_use]
    pub fn vertices(&self) -> &[Point] {
        &self.0
    }

    /// Enclosed area (shoelace formula).
    #[must_use]
    pub fn area(&self) -> f64 {
        shoelace_area(&self.0)
    }

    /// Iterate over the closed edges `(v[i], v[i + 1])`, wrapping at the end.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.0.len();
        (0..n).map(move |i| (self.0[i], self.0[(i + 1) % n]))
    }
}

fn shoelace_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let twice: i64 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y)
        })
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let area = twice.unsigned_abs() as f64 / 2.0;
    area
}

fn closed_length(points: &[Point]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let n = points.len();
    (0..n)
        .map(|i| points[i].distance(points[(i + 1) % n]))
        .sum()
}

/// Per-pixel classification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelClass {
    /// Not part of the chip region; excluded from all counts.
    Outside,
    /// Inside the chip, no seasoning detected.
    Untreated,
    /// Inside the chip, seasoning detected.
    Treated,
}

/// Dense per-pixel classification, parallel to the frame and its mask.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    dimensions: Dimensions,
    classes: Vec<PixelClass>,
    mean_value: f64,
    darkness_threshold: f64,
}

impl Classification {
    pub(crate) const fn new(
        dimensions: Dimensions,
        classes: Vec<PixelClass>,
        mean_value: f64,
        darkness_threshold: f64,
    ) -> Self {
        Self {
            dimensions,
            classes,
            mean_value,
            darkness_threshold,
        }
    }

    /// Grid dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Per-pixel classes in row-major order.
    #[must_use]
    pub fn as_slice(&self) -> &[PixelClass] {
        &self.classes
    }

    /// Class of the pixel at `(x, y)`; out-of-range coordinates are outside.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> PixelClass {
        if x < self.dimensions.width && y < self.dimensions.height {
            self.classes[self.dimensions.index(x, y)]
        } else {
            PixelClass::Outside
        }
    }

    /// Mean HSV value (0-255 scale) over the masked pixels.
    #[must_use]
    pub const fn mean_value(&self) -> f64 {
        self.mean_value
    }

    /// Value (0-255 scale) below which a masked pixel counts as a dark speckle.
    #[must_use]
    pub const fn darkness_threshold(&self) -> f64 {
        self.darkness_threshold
    }
}

/// Aggregated seasoning coverage over the chip mask.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageResult {
    /// Masked pixels classified as treated.
    pub treated_pixels: u64,
    /// All masked pixels (treated + untreated).
    pub masked_pixels: u64,
    /// `100 * treated_pixels / masked_pixels`, or 0 when nothing is masked.
    pub percentage: f64,
}

/// Errors that can occur during pipeline processing.
///
/// Failing to find a chip is deliberately absent: region extraction
/// always falls back to a default region instead of failing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The frame has zero area or its pixel data does not match its
    /// declared dimensions.
    #[error("invalid input frame: {0}")]
    InvalidInput(String),

    /// Failed to decode encoded image bytes.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}
