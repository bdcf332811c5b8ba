//! PNG export of surface maps.

use image::{GrayImage, Luma, Rgb, RgbImage};
use std::path::{Path, PathBuf};

use crate::error::OceanError;
use crate::ocean::SurfaceMaps;

/// Write the displacement, normal and fold maps of one frame into `dir`
///
/// Files are named `displacement_NNNNN.png`, `normal_NNNNN.png` and
/// `fold_NNNNN.png`. Displacement components are remapped from
/// [−max, max] (max = largest absolute component this frame) to [0, 255].
/// Returns the paths written.
pub fn save_maps(
    maps: &SurfaceMaps,
    dir: impl AsRef<Path>,
    frame: usize,
) -> Result<[PathBuf; 3], OceanError> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let n = maps.resolution() as u32;

    let max_component = maps
        .displacement
        .iter()
        .map(|d| d.abs().max_element())
        .fold(0.0f32, f32::max);
    let scale = if max_component > 0.0 {
        0.5 / max_component
    } else {
        0.0
    };

    let displacement = RgbImage::from_fn(n, n, |x, y| {
        let d = maps.displacement[(y * n + x) as usize] * scale + 0.5;
        Rgb([to_byte(d.x), to_byte(d.y), to_byte(d.z)])
    });
    let normal = RgbImage::from_fn(n, n, |x, y| {
        let v = maps.normal[(y * n + x) as usize] * 0.5 + 0.5;
        Rgb([to_byte(v.x), to_byte(v.y), to_byte(v.z)])
    });
    let fold = GrayImage::from_fn(n, n, |x, y| Luma([to_byte(maps.fold[(y * n + x) as usize])]));

    let paths = [
        dir.join(format!("displacement_{:05}.png", frame)),
        dir.join(format!("normal_{:05}.png", frame)),
        dir.join(format!("fold_{:05}.png", frame)),
    ];
    displacement.save(&paths[0])?;
    normal.save(&paths[1])?;
    fold.save(&paths[2])?;

    log::debug!("Exported frame {} to {}", frame, dir.display());
    Ok(paths)
}

/// Map [0, 1] to a byte, clamping out-of-range values
fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_to_byte() {
        assert_eq!(to_byte(0.0), 0);
        assert_eq!(to_byte(0.5), 128);
        assert_eq!(to_byte(1.0), 255);
        assert_eq!(to_byte(-3.0), 0);
        assert_eq!(to_byte(7.0), 255);
    }

    #[test]
    fn test_save_maps_writes_three_images() {
        let dir = std::env::temp_dir().join(format!("fftocean_export_{}", std::process::id()));
        let mut maps = SurfaceMaps::flat(4);
        maps.displacement[0] = Vec3::new(2.0, -1.0, 0.0);
        maps.fold[5] = 1.0;

        let paths = save_maps(&maps, &dir, 7).unwrap();
        assert!(paths[0].ends_with("displacement_00007.png"));
        assert!(paths[2].ends_with("fold_00007.png"));

        let displacement = image::open(&paths[0]).unwrap().to_rgb8();
        assert_eq!(displacement.dimensions(), (4, 4));
        // +max → 255, −max/2 → 64, zero → 128
        assert_eq!(displacement.get_pixel(0, 0).0, [255, 64, 128]);

        let normal = image::open(&paths[1]).unwrap().to_rgb8();
        assert_eq!(normal.get_pixel(3, 3).0, [128, 255, 128]);

        let fold = image::open(&paths[2]).unwrap().to_luma8();
        assert_eq!(fold.get_pixel(1, 1).0, [255]);
        assert_eq!(fold.get_pixel(0, 0).0, [0]);

        std::fs::remove_dir_all(&dir).ok();
    }
}
