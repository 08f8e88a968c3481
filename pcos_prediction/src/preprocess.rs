use image::{
    imageops::{self, FilterType},
    DynamicImage, GrayImage, Luma,
};
use ndarray::Array4;

pub const INPUT_SIZE: u32 = 224;
pub const INPUT_CHANNELS: usize = 3;

/// ITU-R 601-2 luma in 16-bit fixed point: 0.299, 0.587 and 0.114 scaled by 2^16.
fn luma_601(r: u8, g: u8, b: u8) -> u8 {
    let weighted = r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471;
    ((weighted + 0x8000) >> 16) as u8
}

/// Collapses any color mode to a single 8-bit channel. Images without color
/// information keep their luma values; alpha is dropped.
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    if !image.color().has_color() {
        return image.to_luma8();
    }

    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        Luma([luma_601(r, g, b)])
    })
}

/// Turns a decoded image into the `(1, 224, 224, 3)` NHWC tensor the
/// classifier expects, values scaled to `[0, 1]`.
///
/// The image is stretched to 224x224 without keeping its aspect ratio.
pub fn preprocess(image: &DynamicImage) -> Array4<f32> {
    let gray = to_grayscale(image);
    let replicated = DynamicImage::ImageLuma8(gray).to_rgb8();
    let resized = imageops::resize(&replicated, INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom);

    let side = INPUT_SIZE as usize;
    let mut input = Array4::zeros((1, side, side, INPUT_CHANNELS));
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for (c, value) in pixel.0.iter().enumerate() {
            input[[0, y, x, c]] = (*value as f32) / 255.;
        }
    }

    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, LumaA, Rgb, Rgba};

    fn assert_valid_tensor(tensor: &Array4<f32>) {
        assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
        assert!(tensor.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_rgb_image_yields_fixed_shape() {
        let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_fn(300, 300, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });

        let tensor = preprocess(&DynamicImage::ImageRgb8(img));

        assert_valid_tensor(&tensor);
    }

    #[test]
    fn test_odd_sizes_and_modes_yield_fixed_shape() {
        let rgba = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_pixel(17, 533, Rgba([10, 200, 30, 0]));
        let luma_alpha = ImageBuffer::<LumaA<u8>, Vec<u8>>::from_pixel(1, 1, LumaA([255, 12]));
        let luma16 = ImageBuffer::<Luma<u16>, Vec<u16>>::from_pixel(640, 48, Luma([u16::MAX]));

        for image in [
            DynamicImage::ImageRgba8(rgba),
            DynamicImage::ImageLumaA8(luma_alpha),
            DynamicImage::ImageLuma16(luma16),
        ] {
            assert_valid_tensor(&preprocess(&image));
        }
    }

    #[test]
    fn test_channels_are_replicated() {
        let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_fn(64, 40, |x, y| {
            Rgb([(x * 4) as u8, 255 - (y * 5) as u8, ((x + y) * 2) as u8])
        });

        let tensor = preprocess(&DynamicImage::ImageRgb8(img));

        for y in 0..224 {
            for x in 0..224 {
                let r = tensor[[0, y, x, 0]];
                assert_eq!(r, tensor[[0, y, x, 1]]);
                assert_eq!(r, tensor[[0, y, x, 2]]);
            }
        }
    }

    #[test]
    fn test_grayscale_matches_rgb_with_same_luminance() {
        let shade = |x: u32, y: u32| ((x * 7 + y * 3) % 256) as u8;
        let gray = ImageBuffer::<Luma<u8>, Vec<u8>>::from_fn(120, 90, |x, y| Luma([shade(x, y)]));
        let rgb = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_fn(120, 90, |x, y| {
            let v = shade(x, y);
            Rgb([v, v, v])
        });

        let from_gray = preprocess(&DynamicImage::ImageLuma8(gray));
        let from_rgb = preprocess(&DynamicImage::ImageRgb8(rgb));

        assert_eq!(from_gray, from_rgb);
    }

    #[test]
    fn test_luma_uses_601_weights() {
        assert_eq!(luma_601(255, 0, 0), 76);
        assert_eq!(luma_601(0, 255, 0), 150);
        assert_eq!(luma_601(0, 0, 255), 29);
        assert_eq!(luma_601(255, 255, 255), 255);
        assert_eq!(luma_601(0, 0, 0), 0);
    }

    #[test]
    fn test_uniform_image_keeps_its_value() {
        let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(10, 10, Rgb([255, 0, 0]));

        let tensor = preprocess(&DynamicImage::ImageRgb8(img));

        let expected = 76.0 / 255.0;
        assert!(tensor.iter().all(|v| (*v - expected).abs() < 1e-6));
    }
}
