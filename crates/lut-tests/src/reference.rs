//! Reference CMS wrappers
//!
//! Float transforms through lcms2 and moxcms, used as ground truth for the
//! chain. Profiles are passed as ICC bytes.

use lcms2::{Intent, PixelFormat, Profile, Transform};

/// RGB → PCS XYZ through lcms2 (white Y = 1.0)
pub fn lcms2_rgb_to_xyz(profile: &[u8], rgb: &[[f32; 3]], intent: Intent) -> Result<Vec<[f32; 3]>, String> {
    let src = Profile::new_icc(profile).map_err(|e| format!("lcms2 profile: {e}"))?;
    let xyz = Profile::new_xyz();
    let transform = Transform::<[f32; 3], [f32; 3]>::new(
        &src,
        PixelFormat::RGB_FLT,
        &xyz,
        PixelFormat::XYZ_FLT,
        intent,
    )
    .map_err(|e| format!("lcms2 transform: {e}"))?;

    let mut out = vec![[0.0f32; 3]; rgb.len()];
    transform.transform_pixels(rgb, &mut out);
    Ok(out)
}

/// RGB → RGB between two profiles through lcms2
pub fn lcms2_rgb_to_rgb(
    src_profile: &[u8],
    dst_profile: &[u8],
    rgb: &[[f32; 3]],
    intent: Intent,
) -> Result<Vec<[f32; 3]>, String> {
    let src = Profile::new_icc(src_profile).map_err(|e| format!("lcms2 src profile: {e}"))?;
    let dst = Profile::new_icc(dst_profile).map_err(|e| format!("lcms2 dst profile: {e}"))?;
    let transform = Transform::<[f32; 3], [f32; 3]>::new(
        &src,
        PixelFormat::RGB_FLT,
        &dst,
        PixelFormat::RGB_FLT,
        intent,
    )
    .map_err(|e| format!("lcms2 transform: {e}"))?;

    let mut out = vec![[0.0f32; 3]; rgb.len()];
    transform.transform_pixels(rgb, &mut out);
    Ok(out)
}

/// RGB → RGB between two profiles through moxcms, interleaved `f32`
pub fn moxcms_rgb_to_rgb(src_profile: &[u8], dst_profile: &[u8], rgb: &[f32]) -> Result<Vec<f32>, String> {
    use moxcms::{ColorProfile, Layout, TransformOptions};

    let src = ColorProfile::new_from_slice(src_profile).map_err(|e| format!("moxcms src profile: {e:?}"))?;
    let dst = ColorProfile::new_from_slice(dst_profile).map_err(|e| format!("moxcms dst profile: {e:?}"))?;
    let transform = src
        .create_transform_f32(Layout::Rgb, &dst, Layout::Rgb, TransformOptions::default())
        .map_err(|e| format!("moxcms transform: {e:?}"))?;

    let mut out = vec![0.0f32; rgb.len()];
    transform
        .transform(rgb, &mut out)
        .map_err(|e| format!("moxcms execute: {e:?}"))?;
    Ok(out)
}

/// Evenly spaced RGB samples on a `steps³` lattice, blue fastest
pub fn rgb_lattice(steps: usize) -> Vec<[f32; 3]> {
    let n = (steps.max(2) - 1) as f32;
    let mut out = Vec::with_capacity(steps * steps * steps);
    for r in 0..steps {
        for g in 0..steps {
            for b in 0..steps {
                out.push([r as f32 / n, g as f32 / n, b as f32 / n]);
            }
        }
    }
    out
}
