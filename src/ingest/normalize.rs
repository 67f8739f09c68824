use anyhow::{anyhow, Result};

/// Expected byte length of an RGB24 frame.
pub(crate) fn rgb_len(width: u32, height: u32) -> Result<usize> {
    width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(3))
        .map(|v| v as usize)
        .ok_or_else(|| anyhow!("RGB frame dimensions overflow"))
}

pub(crate) fn validate_rgb(pixels: &[u8], width: u32, height: u32) -> Result<()> {
    let expected = rgb_len(width, height)?;
    if pixels.len() != expected {
        return Err(anyhow!(
            "RGB frame length mismatch: expected {}, got {}",
            expected,
            pixels.len()
        ));
    }
    Ok(())
}

/// Nearest-neighbour resize of an RGB24 buffer.
pub(crate) fn resize_rgb(
    pixels: &[u8],
    width: u32,
    height: u32,
    out_width: u32,
    out_height: u32,
) -> Result<Vec<u8>> {
    validate_rgb(pixels, width, height)?;
    if out_width == 0 || out_height == 0 {
        return Err(anyhow!(
            "cannot resize to empty frame {}x{}",
            out_width,
            out_height
        ));
    }

    let (sw, sh) = (width as usize, height as usize);
    let (dw, dh) = (out_width as usize, out_height as usize);
    let mut out = vec![0u8; rgb_len(out_width, out_height)?];
    for y in 0..dh {
        let sy = y * sh / dh;
        for x in 0..dw {
            let sx = x * sw / dw;
            let src = (sy * sw + sx) * 3;
            let dst = (y * dw + x) * 3;
            out[dst..dst + 3].copy_from_slice(&pixels[src..src + 3]);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downscale_picks_nearest_source_pixels() -> Result<()> {
        // 2x2 image, each pixel a distinct gray level.
        let pixels = [10u8, 10, 10, 20, 20, 20, 30, 30, 30, 40, 40, 40];
        let out = resize_rgb(&pixels, 2, 2, 1, 1)?;
        assert_eq!(out, vec![10, 10, 10]);
        Ok(())
    }

    #[test]
    fn upscale_repeats_pixels() -> Result<()> {
        let pixels = [1u8, 2, 3];
        let out = resize_rgb(&pixels, 1, 1, 2, 2)?;
        assert_eq!(out, [1u8, 2, 3].repeat(4));
        Ok(())
    }

    #[test]
    fn rgb_length_is_validated() {
        let err = resize_rgb(&[0u8; 5], 1, 2, 1, 1).unwrap_err();
        assert!(err.to_string().contains("length mismatch"));
    }
}
