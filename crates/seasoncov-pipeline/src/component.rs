//! Color-threshold strategy: the chip is the largest 4-connected blob
//! of pixels darker than the (bright) background.
//!
//! The flood fill is breadth-first over an explicit work-list and a
//! visited bitmap, so stack depth stays constant however large the
//! component is.

use std::collections::VecDeque;

use crate::config::ComponentParams;
use crate::types::{Dimensions, Mask, PixelBuffer};

/// What the component strategy saw, for logs and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComponentStats {
    /// Pixels below the brightness cut-off.
    pub foreground_pixels: u64,
    /// Distinct 4-connected components among them.
    pub component_count: usize,
    /// Size of the largest component.
    pub largest_size: usize,
}

/// Foreground flags: mean of R, G and B strictly below `cutoff`.
#[must_use]
pub fn darker_than(buffer: &PixelBuffer, cutoff: u8) -> Vec<bool> {
    buffer
        .pixels()
        .map(|[r, g, b, _]| {
            let sum = u16::from(r) + u16::from(g) + u16::from(b);
            sum < 3 * u16::from(cutoff)
        })
        .collect()
}

/// Pixel indices of the largest 4-connected component of `foreground`.
///
/// Components are discovered in raster order; on a size tie the first
/// discovered wins. Returns the indices together with the number of
/// components seen. An all-background grid yields an empty list.
#[must_use]
pub fn largest_component(foreground: &[bool], dimensions: Dimensions) -> (Vec<usize>, usize) {
    let width = dimensions.width as usize;
    let height = dimensions.height as usize;
    debug_assert_eq!(foreground.len(), width * height);

    let mut visited = vec![false; foreground.len()];
    let mut queue = VecDeque::new();
    let mut best: Vec<usize> = Vec::new();
    let mut count = 0;

    for seed in 0..foreground.len() {
        if !foreground[seed] || visited[seed] {
            continue;
        }
        count += 1;

        let mut component = Vec::new();
        visited[seed] = true;
        queue.push_back(seed);

        while let Some(p) = queue.pop_front() {
            component.push(p);
            let x = p % width;
            let y = p / width;

            let neighbors = [
                (x + 1 < width).then(|| p + 1),
                (x > 0).then(|| p - 1),
                (y + 1 < height).then(|| p + width),
                (y > 0).then(|| p - width),
            ];
            for n in neighbors.into_iter().flatten() {
                if foreground[n] && !visited[n] {
                    visited[n] = true;
                    queue.push_back(n);
                }
            }
        }

        if component.len() > best.len() {
            best = component;
        }
    }

    (best, count)
}

/// Run the component strategy.
///
/// Returns `None` when no pixel is darker than the cut-off, telling the
/// caller to fall back.
#[must_use]
pub fn locate(buffer: &PixelBuffer, params: &ComponentParams) -> (Option<Mask>, ComponentStats) {
    let dimensions = buffer.dimensions();
    let foreground = darker_than(buffer, params.brightness_cutoff);
    let foreground_pixels = foreground.iter().map(|&f| u64::from(f)).sum();

    let (best, component_count) = largest_component(&foreground, dimensions);
    let stats = ComponentStats {
        foreground_pixels,
        component_count,
        largest_size: best.len(),
    };

    tracing::debug!(
        foreground_pixels,
        component_count,
        largest = best.len(),
        "connected components"
    );

    if best.is_empty() {
        (None, stats)
    } else {
        (Some(Mask::from_indices(dimensions, &best)), stats)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    /// Parse a grid where `#` is foreground.
    fn grid(rows: &[&str]) -> (Vec<bool>, Dimensions) {
        let height = u32::try_from(rows.len()).unwrap();
        let width = u32::try_from(rows[0].len()).unwrap();
        let cells = rows
            .iter()
            .flat_map(|r| r.chars().map(|c| c == '#'))
            .collect();
        (cells, dims(width, height))
    }

    #[test]
    fn empty_grid_has_no_component() {
        let (fg, d) = grid(&["....", "...."]);
        let (best, count) = largest_component(&fg, d);
        assert!(best.is_empty());
        assert_eq!(count, 0);
    }

    #[test]
    fn picks_largest_component() {
        let (fg, d) = grid(&[
            "##....", //
            "##..##", //
            "....##", //
            "....##",
        ]);
        let (best, count) = largest_component(&fg, d);
        assert_eq!(count, 2);
        assert_eq!(best.len(), 6);
        assert!(best.contains(&(6 + 4)));
    }

    #[test]
    fn diagonal_pixels_are_not_connected() {
        let (fg, d) = grid(&[
            "#.", //
            ".#",
        ]);
        let (best, count) = largest_component(&fg, d);
        assert_eq!(count, 2);
        assert_eq!(best.len(), 1);
    }

    #[test]
    fn tie_keeps_first_in_raster_order() {
        let (fg, d) = grid(&[
            "##..##", //
            "......",
        ]);
        let (best, _) = largest_component(&fg, d);
        let mut sorted = best;
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1]);
    }

    #[test]
    fn components_do_not_wrap_across_rows() {
        // Pixel at the end of row 0 and start of row 1 are adjacent in
        // memory but not in the image.
        let (fg, d) = grid(&[
            "...#", //
            "#...",
        ]);
        let (_, count) = largest_component(&fg, d);
        assert_eq!(count, 2);
    }

    #[test]
    fn large_component_does_not_overflow_stack() {
        let d = dims(1000, 1000);
        let fg = vec![true; d.pixel_count()];
        let (best, count) = largest_component(&fg, d);
        assert_eq!(count, 1);
        assert_eq!(best.len(), 1_000_000);
    }

    #[test]
    fn darker_than_uses_channel_mean() {
        let img = image::RgbaImage::from_fn(3, 1, |x, _| match x {
            0 => image::Rgba([209, 209, 209, 255]),
            1 => image::Rgba([210, 210, 210, 255]),
            _ => image::Rgba([255, 0, 0, 255]),
        });
        let buffer = PixelBuffer::from_image(img).unwrap();
        assert_eq!(darker_than(&buffer, 210), vec![true, false, true]);
    }

    #[test]
    fn locate_returns_chip_blob() {
        let img = image::RgbaImage::from_fn(50, 40, |x, y| {
            let chip = (10..30).contains(&x) && (5..25).contains(&y);
            let speck = x == 45 && y == 35;
            if chip || speck {
                image::Rgba([200, 120, 40, 255])
            } else {
                image::Rgba([250, 250, 250, 255])
            }
        });
        let buffer = PixelBuffer::from_image(img).unwrap();
        let (mask, stats) = locate(&buffer, &ComponentParams::default());
        let mask = mask.unwrap();
        assert_eq!(mask.count(), 400);
        assert!(mask.contains(10, 5));
        assert!(!mask.contains(45, 35));
        assert_eq!(stats.component_count, 2);
        assert_eq!(stats.foreground_pixels, 401);
    }

    #[test]
    fn locate_on_white_frame_is_none() {
        let img = image::RgbaImage::from_fn(10, 10, |_, _| image::Rgba([255, 255, 255, 255]));
        let buffer = PixelBuffer::from_image(img).unwrap();
        let (mask, stats) = locate(&buffer, &ComponentParams::default());
        assert!(mask.is_none());
        assert_eq!(stats.foreground_pixels, 0);
    }
}
