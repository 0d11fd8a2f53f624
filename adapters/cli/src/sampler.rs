//! Image decoding and downsampling into engine seed grids.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use image::{imageops::FilterType, DynamicImage, GenericImageView};
use mazm_core::PixelGrid;
use mazm_engine::MAX_CELLS;

/// Target dimensions of the sampled grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Sampling {
    /// Number of sampled columns.
    pub(crate) width: u32,
    /// Fixed number of sampled rows, or `None` to follow the aspect ratio.
    pub(crate) height: Option<u32>,
}

impl Sampling {
    /// Resolves the grid size for an image of the provided natural size.
    ///
    /// A derived height is truncated like a canvas would and never drops
    /// below one row.
    pub(crate) fn target_dimensions(&self, natural_width: u32, natural_height: u32) -> (u32, u32) {
        let height = self.height.unwrap_or_else(|| {
            if natural_width == 0 {
                return 1;
            }
            let derived =
                u64::from(self.width) * u64::from(natural_height) / u64::from(natural_width);
            u32::try_from(derived).unwrap_or(u32::MAX).max(1)
        });
        (self.width, height)
    }
}

/// Decodes the image at `path` and samples it into a pixel grid.
pub(crate) fn sample(path: &Path, sampling: Sampling) -> Result<PixelGrid> {
    let image = image::open(path)
        .with_context(|| format!("failed to decode image {}", path.display()))?;
    sample_image(&image, sampling)
        .with_context(|| format!("failed to sample image {}", path.display()))
}

/// Resizes a decoded image to the sampling dimensions and extracts RGBA bytes.
pub(crate) fn sample_image(image: &DynamicImage, sampling: Sampling) -> Result<PixelGrid> {
    let (natural_width, natural_height) = image.dimensions();
    let (width, height) = sampling.target_dimensions(natural_width, natural_height);
    ensure!(
        u64::from(width) * u64::from(height) <= MAX_CELLS as u64,
        "sampling {natural_width}x{natural_height} image to {width}x{height} exceeds the limit of {MAX_CELLS} cells"
    );
    let resized = image.resize_exact(width, height, FilterType::Triangle).to_rgba8();
    let grid = PixelGrid::new(width, height, resized.into_raw())?;
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn derived_height_follows_aspect_ratio() {
        let sampling = Sampling {
            width: 64,
            height: None,
        };
        assert_eq!(sampling.target_dimensions(1920, 1080), (64, 36));
        assert_eq!(sampling.target_dimensions(300, 400), (64, 85));
        assert_eq!(sampling.target_dimensions(10_000, 10), (64, 1));
    }

    #[test]
    fn fixed_height_ignores_aspect_ratio() {
        let sampling = Sampling {
            width: 64,
            height: Some(64),
        };
        assert_eq!(sampling.target_dimensions(1920, 1080), (64, 64));
    }

    #[test]
    fn sampled_grid_matches_target_dimensions() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 20, Rgba([255, 255, 255, 255])));
        let grid = sample_image(
            &image,
            Sampling {
                width: 8,
                height: None,
            },
        )
        .expect("samples");

        assert_eq!((grid.width(), grid.height()), (8, 4));
        assert_eq!(grid.as_bytes().len(), 8 * 4 * 4);
        assert!(grid.samples().all(|sample| sample.brightness() >= 760));
    }

    #[test]
    fn derived_height_over_the_cell_limit_is_rejected() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(1, 4_096));
        let error = sample_image(
            &image,
            Sampling {
                width: 2_048,
                height: None,
            },
        )
        .expect_err("derived height is too tall");

        assert!(error.to_string().contains("exceeds the limit"));
    }

    #[test]
    fn fixed_dimensions_over_the_cell_limit_are_rejected() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(4, 4));
        let result = sample_image(
            &image,
            Sampling {
                width: 60_000,
                height: Some(60_000),
            },
        );

        assert!(result.is_err());
    }

    #[test]
    fn missing_files_report_the_path() {
        let error = sample(
            Path::new("does/not/exist.png"),
            Sampling {
                width: 8,
                height: None,
            },
        )
        .expect_err("missing file");

        assert!(format!("{error:#}").contains("does/not/exist.png"));
    }
}
