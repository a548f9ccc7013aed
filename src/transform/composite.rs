use crate::{
    data::samples::Samples,
    foundation::{
        core::Region,
        error::{ImagecatError, ImagecatResult},
    },
};

/// `fg * alpha + bg * (1 - alpha)`, applied per channel.
pub fn mix(bg: f32, fg: f32, alpha: f32) -> f32 {
    fg * alpha + bg * (1.0 - alpha)
}

/// Blend `fg` over the `region` of `background` using the single-channel `alpha`, returning
/// the new background. Pixels outside `region` keep their values; the background buffer is
/// only copied when it is shared.
pub fn mix_into_region(
    mut background: Samples,
    fg: &Samples,
    alpha: &Samples,
    region: Region,
) -> ImagecatResult<Samples> {
    let channels = background.channels();
    if fg.channels() != channels {
        return Err(ImagecatError::validation(format!(
            "foreground has {} channels but background has {channels}",
            fg.channels()
        )));
    }
    if alpha.channels() != 1 {
        return Err(ImagecatError::validation(format!(
            "alpha must have one channel, received {}",
            alpha.channels()
        )));
    }
    let (rows, cols) = (region.rows(), region.cols());
    if fg.rows() != rows || fg.cols() != cols || alpha.rows() != rows || alpha.cols() != cols {
        return Err(ImagecatError::validation(format!(
            "blend inputs must match the {rows}x{cols} region"
        )));
    }
    if region.row_end > background.rows() || region.col_end > background.cols() {
        return Err(ImagecatError::validation(format!(
            "region {region:?} exceeds the {}x{} background",
            background.rows(),
            background.cols()
        )));
    }
    if region.is_empty() {
        return Ok(background);
    }

    let bg_cols = background.cols();
    let dst = background.make_mut();
    for r in 0..rows {
        for c in 0..cols {
            let a = alpha.get(r, c, 0);
            let o = ((region.row_start + r) * bg_cols + region.col_start + c) * channels;
            for (d, &f) in dst[o..o + channels].iter_mut().zip(fg.pixel(r, c)) {
                *d = mix(*d, f, a);
            }
        }
    }
    Ok(background)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_endpoints() {
        assert_eq!(mix(0.2, 0.8, 0.0), 0.2);
        assert_eq!(mix(0.2, 0.8, 1.0), 0.8);
        assert!((mix(0.0, 1.0, 0.25) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn blend_touches_only_the_region() {
        let bg = Samples::filled(4, 4, &[0.0, 0.0]).unwrap();
        let fg = Samples::filled(2, 2, &[1.0, 0.5]).unwrap();
        let alpha = Samples::filled(2, 2, &[1.0]).unwrap();
        let region = Region {
            row_start: 1,
            row_end: 3,
            col_start: 2,
            col_end: 4,
        };
        let out = mix_into_region(bg.clone(), &fg, &alpha, region).unwrap();
        assert_eq!(out.pixel(1, 2), &[1.0, 0.5]);
        assert_eq!(out.pixel(2, 3), &[1.0, 0.5]);
        assert_eq!(out.pixel(0, 0), &[0.0, 0.0]);
        assert_eq!(out.pixel(1, 1), &[0.0, 0.0]);
        assert!(bg.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn empty_region_is_a_no_op() {
        let bg = Samples::filled(3, 3, &[0.3]).unwrap();
        let empty = Samples::zeros(0, 0, 1).unwrap();
        let out = mix_into_region(bg.clone(), &empty, &empty, Region::default()).unwrap();
        assert!(out.shares_buffer(&bg));
    }

    #[test]
    fn channel_mismatch_is_rejected() {
        let bg = Samples::filled(2, 2, &[0.0; 3]).unwrap();
        let fg = Samples::filled(2, 2, &[0.0; 4]).unwrap();
        let alpha = Samples::filled(2, 2, &[1.0]).unwrap();
        let region = Region {
            row_start: 0,
            row_end: 2,
            col_start: 0,
            col_end: 2,
        };
        assert!(matches!(
            mix_into_region(bg, &fg, &alpha, region),
            Err(ImagecatError::Validation(_))
        ));
    }
}
