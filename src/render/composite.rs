use crate::foundation::error::{UnfurlError, UnfurlResult};
use crate::foundation::math::{mul_div255_u8, unit_to_u8};

pub type PremulRgba8 = [u8; 4];

pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = unit_to_u8(opacity);
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Porter-Duff source-in: `src` scaled by the coverage of `mask`.
pub fn src_in(src: PremulRgba8, mask: PremulRgba8) -> PremulRgba8 {
    let ma = u16::from(mask[3]);
    src.map(|c| mul_div255_u8(u16::from(c), ma))
}

/// Porter-Duff destination-out: `dst` with the coverage of `mask` removed.
pub fn dst_out(dst: PremulRgba8, mask: PremulRgba8) -> PremulRgba8 {
    let keep = 255u16 - u16::from(mask[3]);
    dst.map(|c| mul_div255_u8(u16::from(c), keep))
}

fn check_same_len(op: &str, a: &[u8], b: &[u8]) -> UnfurlResult<()> {
    if a.len() != b.len() || !a.len().is_multiple_of(4) {
        return Err(UnfurlError::render(format!(
            "{op} expects equal-length rgba8 buffers"
        )));
    }
    Ok(())
}

pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> UnfurlResult<()> {
    check_same_len("over_in_place", dst, src)?;
    if opacity <= 0.0 {
        return Ok(());
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Keep `content` only where `mask` is opaque.
pub fn src_in_in_place(content: &mut [u8], mask: &[u8]) -> UnfurlResult<()> {
    check_same_len("src_in_in_place", content, mask)?;
    for (c, m) in content.chunks_exact_mut(4).zip(mask.chunks_exact(4)) {
        let out = src_in([c[0], c[1], c[2], c[3]], [m[0], m[1], m[2], m[3]]);
        c.copy_from_slice(&out);
    }
    Ok(())
}

/// Erase `content` wherever `mask` is opaque.
pub fn dst_out_in_place(content: &mut [u8], mask: &[u8]) -> UnfurlResult<()> {
    check_same_len("dst_out_in_place", content, mask)?;
    for (c, m) in content.chunks_exact_mut(4).zip(mask.chunks_exact(4)) {
        let out = dst_out([c[0], c[1], c[2], c[3]], [m[0], m[1], m[2], m[3]]);
        c.copy_from_slice(&out);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_opacity_0_is_noop() {
        let dst = [1, 2, 3, 4];
        let src = [200, 200, 200, 200];
        assert_eq!(over(dst, src, 0.0), dst);
    }

    #[test]
    fn over_src_opaque_replaces_dst() {
        let dst = [0, 0, 0, 255];
        let src = [255, 0, 0, 255];
        assert_eq!(over(dst, src, 1.0), src);
    }

    #[test]
    fn over_dst_transparent_returns_scaled_src() {
        let dst = [0, 0, 0, 0];
        let src = [100, 110, 120, 200];
        assert_eq!(over(dst, src, 1.0), src);
    }

    #[test]
    fn src_in_follows_mask_alpha() {
        let content = [200, 100, 50, 255];
        assert_eq!(src_in(content, [0, 0, 0, 255]), content);
        assert_eq!(src_in(content, [9, 9, 9, 0]), [0, 0, 0, 0]);
        assert_eq!(src_in(content, [0, 0, 0, 128])[3], 128);
    }

    #[test]
    fn dst_out_is_the_complement_of_src_in() {
        let content = [200, 100, 50, 255];
        assert_eq!(dst_out(content, [0, 0, 0, 255]), [0, 0, 0, 0]);
        assert_eq!(dst_out(content, [0, 0, 0, 0]), content);
    }

    #[test]
    fn in_place_ops_reject_mismatched_buffers() {
        let mut a = vec![0u8; 8];
        assert!(over_in_place(&mut a, &[0u8; 4], 1.0).is_err());
        assert!(src_in_in_place(&mut a, &[0u8; 12]).is_err());
        assert!(dst_out_in_place(&mut a, &[0u8; 7]).is_err());
    }
}
