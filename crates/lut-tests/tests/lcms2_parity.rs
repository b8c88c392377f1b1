//! Agreement with lcms2 on the same profile bytes

use lcms2::Intent;
use lut_tests::accuracy::{DeltaEStats, delta_e_2000, xyz_to_lab_d50};
use lut_tests::reference::{lcms2_rgb_to_rgb, lcms2_rgb_to_xyz, rgb_lattice};
use lut_tests::{compare_xyz, fixtures, init_tracing};
use oxlut_core::{ColorProfile, ProfileChain, RenderingIntent, SpaceType};

fn to_pcs(profile: &ColorProfile, rgb: &[[f32; 3]]) -> Vec<[f64; 3]> {
    let mut chain = ProfileChain::new(
        SpaceType::DeviceSpecific,
        SpaceType::ProfileConnectionSpace,
        RenderingIntent::RelativeColorimetric,
    );
    chain.add_profile(profile).unwrap();
    rgb.iter()
        .map(|p| {
            let out = chain.transform(&p.map(f64::from)).unwrap();
            [out[0], out[1], out[2]]
        })
        .collect()
}

#[test]
fn srgb_to_xyz_matches() {
    init_tracing();
    let bytes = fixtures::srgb().build();
    let profile = ColorProfile::from_bytes(&bytes).unwrap();
    let samples = rgb_lattice(9);

    let ours = to_pcs(&profile, &samples);
    let theirs: Vec<[f64; 3]> = lcms2_rgb_to_xyz(&bytes, &samples, Intent::RelativeColorimetric)
        .unwrap()
        .into_iter()
        .map(|p| p.map(f64::from))
        .collect();

    let stats = compare_xyz(&theirs, &ours);
    assert!(stats.is_excellent(), "{stats:?}");
}

#[test]
fn srgb_to_p3_matches() {
    let srgb_bytes = fixtures::srgb().build();
    let p3_bytes = fixtures::display_p3(80.0).build();
    let srgb = ColorProfile::from_bytes(&srgb_bytes).unwrap();
    let p3 = ColorProfile::from_bytes(&p3_bytes).unwrap();

    let mut chain = ProfileChain::new(
        SpaceType::DeviceSpecific,
        SpaceType::DeviceSpecific,
        RenderingIntent::RelativeColorimetric,
    );
    chain.add_profile(&srgb).unwrap();
    chain.add_profile(&p3).unwrap();

    let samples = rgb_lattice(9);
    let theirs = lcms2_rgb_to_rgb(&srgb_bytes, &p3_bytes, &samples, Intent::RelativeColorimetric).unwrap();

    let mut worst = 0.0f64;
    for (input, expected) in samples.iter().zip(&theirs) {
        let out = chain.transform(&input.map(f64::from)).unwrap();
        for c in 0..3 {
            worst = worst.max((out[c] - f64::from(expected[c])).abs());
        }
    }
    assert!(worst < 2e-3, "worst channel difference {worst}");
}

#[test]
fn lab_table_profile_matches() {
    let bytes = fixtures::srgb_lab_lut(17).build();
    let profile = ColorProfile::from_bytes(&bytes).unwrap();
    let samples = rgb_lattice(7);

    let ours = to_pcs(&profile, &samples);
    let theirs = lcms2_rgb_to_xyz(&bytes, &samples, Intent::RelativeColorimetric).unwrap();

    let deltas = ours
        .iter()
        .zip(&theirs)
        .map(|(lab, xyz)| delta_e_2000(*lab, xyz_to_lab_d50(xyz.map(f64::from))))
        .collect();
    let stats = DeltaEStats::from_deltas(deltas);
    assert!(stats.mean < 1.0, "{stats:?}");
    assert!(stats.is_acceptable(), "{stats:?}");
}
