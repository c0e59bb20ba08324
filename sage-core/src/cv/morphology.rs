// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

use crate::im::BinaryMask;

/// Direction of a single-step mask boundary adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryOp {
    Dilate,
    Erode,
}

/// Expand a binary mask by one pixel with a 3x3 structuring element.
///
/// A pixel is foreground in the output if any pixel in its 3x3
/// neighborhood is foreground. Windows are clamped at the image border.
pub fn dilate(mask: &BinaryMask) -> BinaryMask {
    morphology_3x3(mask, true)
}

/// Shrink a binary mask by one pixel with a 3x3 structuring element.
///
/// A pixel stays foreground only if every pixel in its 3x3 neighborhood
/// is foreground. Windows are clamped at the image border.
pub fn erode(mask: &BinaryMask) -> BinaryMask {
    morphology_3x3(mask, false)
}

/// Apply a single dilation or erosion step to a binary mask
pub fn adjust_boundary(mask: &BinaryMask, op: BoundaryOp) -> BinaryMask {
    match op {
        BoundaryOp::Dilate => dilate(mask),
        BoundaryOp::Erode => erode(mask),
    }
}

fn morphology_3x3(mask: &BinaryMask, dilate: bool) -> BinaryMask {
    let w = mask.width();
    let h = mask.height();

    let mut output = BinaryMask::filled(w, h, 1, 0u8);

    for y in 0..h {
        for x in 0..w {
            let y0 = y.saturating_sub(1);
            let y1 = (y + 1).min(h.saturating_sub(1));
            let x0 = x.saturating_sub(1);
            let x1 = (x + 1).min(w.saturating_sub(1));

            let mut any = false;
            let mut all = true;

            for ny in y0..=y1 {
                for nx in x0..=x1 {
                    let fg = mask
                        .get(nx, ny)
                        .map(|&value| value > 0)
                        .unwrap_or(false);

                    any |= fg;
                    all &= fg;
                }
            }

            let value = if dilate { any } else { all };

            if value {
                output.buffer[(y * w + x) as usize] = 1u8;
            }
        }
    }

    output
}

#[cfg(test)]
mod test {

    use super::*;

    fn mask_from(width: u32, height: u32, data: Vec<u8>) -> BinaryMask {
        BinaryMask::new(width, height, 1, data).unwrap()
    }

    #[test]
    fn test_dilate_single_pixel() {
        #[rustfmt::skip]
        let mask = mask_from(4, 4, vec![
            0, 0, 0, 0,
            0, 1, 0, 0,
            0, 0, 0, 0,
            0, 0, 0, 0,
        ]);

        #[rustfmt::skip]
        let expected = vec![
            1, 1, 1, 0,
            1, 1, 1, 0,
            1, 1, 1, 0,
            0, 0, 0, 0,
        ];

        assert_eq!(dilate(&mask).as_raw(), &expected[..]);
    }

    #[test]
    fn test_erode_block_to_center() {
        #[rustfmt::skip]
        let mask = mask_from(5, 5, vec![
            0, 0, 0, 0, 0,
            0, 1, 1, 1, 0,
            0, 1, 1, 1, 0,
            0, 1, 1, 1, 0,
            0, 0, 0, 0, 0,
        ]);

        #[rustfmt::skip]
        let expected = vec![
            0, 0, 0, 0, 0,
            0, 0, 0, 0, 0,
            0, 0, 1, 0, 0,
            0, 0, 0, 0, 0,
            0, 0, 0, 0, 0,
        ];

        assert_eq!(erode(&mask).as_raw(), &expected[..]);
    }

    #[test]
    fn test_dilate_clamps_at_border() {
        let mask = mask_from(2, 2, vec![1, 0, 0, 0]);

        assert_eq!(dilate(&mask).as_raw(), &[1, 1, 1, 1]);
    }

    #[test]
    fn test_erode_empty_stays_empty() {
        let mask = mask_from(3, 3, vec![0; 9]);

        assert_eq!(erode(&mask).as_raw(), &[0; 9][..]);
    }

    #[test]
    fn test_erode_full_stays_full() {
        // With clamped borders a fully-set mask has no boundary to shrink
        let mask = mask_from(3, 3, vec![1; 9]);

        assert_eq!(erode(&mask).as_raw(), &[1; 9][..]);
    }

    #[test]
    fn test_adjust_boundary_round_trip() {
        #[rustfmt::skip]
        let mask = mask_from(5, 5, vec![
            0, 0, 0, 0, 0,
            0, 1, 1, 1, 0,
            0, 1, 1, 1, 0,
            0, 1, 1, 1, 0,
            0, 0, 0, 0, 0,
        ]);

        let adjusted = adjust_boundary(&adjust_boundary(&mask, BoundaryOp::Erode), BoundaryOp::Dilate);

        assert_eq!(adjusted.as_raw(), &mask.as_raw()[..]);
    }
}
