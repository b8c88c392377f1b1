//! LUT sampling over profiles loaded from ICC bytes

use lut_tests::fixtures;
use lut_tests::{init_tracing, max_code_diff};
use oxlut_core::{
    CancelFlag, ChainOptions, ColorProfile, Error, GeneratorOptions, LutGenerator, ProfileChain,
    RenderingIntent, SpaceType, lattice_coords, quantize,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn load(builder: &fixtures::ProfileBuilder) -> ColorProfile {
    ColorProfile::from_bytes(&builder.build()).expect("fixture should load")
}

fn device_chain<'a>(intent: RenderingIntent, profiles: &[&'a ColorProfile]) -> ProfileChain<'a> {
    let mut chain = ProfileChain::new(SpaceType::DeviceSpecific, SpaceType::DeviceSpecific, intent);
    for profile in profiles {
        chain.add_profile(profile).expect("compatible profiles");
    }
    chain
}

#[test]
fn every_grid_fills_every_entry() {
    init_tracing();
    let srgb = load(&fixtures::srgb());
    let p3 = load(&fixtures::display_p3(80.0));
    let chain = device_chain(RenderingIntent::RealisticColorimetricWithLuminance, &[&srgb, &p3]);
    let generator = LutGenerator::default();

    for grid in 2..=9 {
        let lut = generator.generate(&chain, grid).unwrap();
        let entries = grid * grid * grid;
        assert_eq!(lut.grid, grid);
        assert_eq!((lut.r.len(), lut.g.len(), lut.b.len()), (entries, entries, entries));
        for channel in [&lut.r, &lut.g, &lut.b] {
            assert!(channel.iter().all(|&v| v <= 65535));
        }
    }
}

#[test]
fn two_point_grid_samples_cube_corners() {
    let srgb = load(&fixtures::srgb());
    let chain = device_chain(RenderingIntent::RealisticColorimetricWithLuminance, &[&srgb, &srgb]);
    let lut = LutGenerator::default().generate(&chain, 2).unwrap();

    assert_eq!(lut.get(0, 0, 0), Some([0, 0, 0]));
    assert_eq!(lut.get(1, 1, 1), Some([65535, 65535, 65535]));
    for index in 0..8 {
        let (r, g, b) = lattice_coords(index, 2);
        let expected = [r, g, b].map(|c| c as u32 * 65535);
        assert_eq!([lut.r[index], lut.g[index], lut.b[index]], expected, "corner {index}");
    }
}

#[test]
fn identity_chain_reproduces_the_lattice() {
    let profile = load(&fixtures::gamma_rgb(2.2));
    let chain = device_chain(RenderingIntent::RelativeColorimetric, &[&profile, &profile]);
    let grid = 17;
    let lut = LutGenerator::default().generate(&chain, grid).unwrap();

    for index in 0..lut.len() {
        let (r, g, b) = lattice_coords(index, grid);
        let expected = [r, g, b].map(|c| quantize(c as f64 / (grid - 1) as f64));
        let actual = [lut.r[index], lut.g[index], lut.b[index]];
        for c in 0..3 {
            assert!(actual[c].abs_diff(expected[c]) <= 1, "{index}: {actual:?} vs {expected:?}");
        }
    }
}

#[test]
fn parallel_and_sequential_agree() {
    let srgb = load(&fixtures::srgb());
    let p3 = load(&fixtures::display_p3(120.0));
    let chain = device_chain(RenderingIntent::RealisticColorimetricWithLuminance, &[&p3, &srgb]);

    let parallel = LutGenerator::new(GeneratorOptions::new().parallel(true))
        .generate(&chain, 17)
        .unwrap();
    let sequential = LutGenerator::new(GeneratorOptions::new().parallel(false))
        .generate(&chain, 17)
        .unwrap();
    assert_eq!(max_code_diff(&parallel, &sequential), 0);
    assert_eq!(parallel, sequential);
}

#[test]
fn luminance_ratio_scales_output() {
    let ga = load(&fixtures::gamma_rgb(1.0).luminance(100.0));
    let display = load(&fixtures::gamma_rgb(1.0).luminance(400.0));
    let chain = device_chain(RenderingIntent::RealisticColorimetricWithLuminance, &[&ga, &display]);
    assert_eq!(chain.luminance_factor(), 0.25);
    let lut = LutGenerator::default().generate(&chain, 5).unwrap();

    // u8Fixed8 gamma 1.0 is exact, so the output is the input quartered
    assert_eq!(lut.get(4, 4, 4), Some([16384, 16384, 16384]));
    assert_eq!(lut.get(4, 0, 2), Some([16384, 0, 8192]));
}

#[test]
fn missing_luminance_falls_back_to_unity() {
    let ga = load(&fixtures::gamma_rgb(1.0).luminance(100.0));
    let display = load(&fixtures::gamma_rgb(1.0));
    let chain = device_chain(RenderingIntent::RealisticColorimetricWithLuminance, &[&ga, &display]);
    assert_eq!(chain.luminance_factor(), 1.0);

    let lut = LutGenerator::default().generate(&chain, 5).unwrap();
    assert_eq!(lut.get(4, 4, 4), Some([65535, 65535, 65535]));
    assert_eq!(lut.get(1, 1, 1), Some([16384, 16384, 16384]));
}

#[test]
fn out_of_gamut_values_clamp() {
    // P3 red is outside sRGB: relative colorimetric pushes channels past [0, 1]
    let srgb = load(&fixtures::srgb());
    let p3 = load(&fixtures::display_p3(80.0));
    let chain = device_chain(RenderingIntent::RelativeColorimetric, &[&p3, &srgb]);

    let raw = chain.transform(&[1.0, 0.0, 0.0]).unwrap();
    assert!(raw[0] > 1.0 && raw[1] < 0.0, "{raw:?}");

    let lut = LutGenerator::default().generate(&chain, 2).unwrap();
    let red = lut.get(1, 0, 0).unwrap();
    assert_eq!(red[0], 65535);
    assert_eq!(red[1], 0);
}

#[test]
fn cancellation_stops_generation() {
    let srgb = load(&fixtures::srgb());
    let chain = device_chain(RenderingIntent::RelativeColorimetric, &[&srgb, &srgb]);
    let cancel = CancelFlag::new();
    let generator = LutGenerator::new(GeneratorOptions::new().with_cancel(cancel.clone()));

    assert!(generator.generate(&chain, 4).is_ok());
    cancel.cancel();
    assert_eq!(generator.generate(&chain, 4), Err(Error::Cancelled));
}

#[test]
fn lut_profiles_sample_like_matrix_profiles() {
    let srgb = load(&fixtures::srgb());
    let mab = load(&fixtures::srgb_mab());
    let options = ChainOptions::default().with_intent(RenderingIntent::RelativeColorimetric);

    let mut reference = ProfileChain::with_options(SpaceType::DeviceSpecific, SpaceType::DeviceSpecific, options);
    reference.add_profile(&srgb).unwrap();
    reference.add_profile(&srgb).unwrap();
    let mut tables = ProfileChain::with_options(SpaceType::DeviceSpecific, SpaceType::DeviceSpecific, options);
    tables.add_profile(&mab).unwrap();
    tables.add_profile(&mab).unwrap();

    let generator = LutGenerator::default();
    let a = generator.generate(&reference, 9).unwrap();
    let b = generator.generate(&tables, 9).unwrap();
    // s15Fixed16 rounding of the table matrices, worst near black
    let diff = max_code_diff(&a, &b);
    assert!(diff <= 256, "max diff {diff}");
}

#[test]
fn quantize_never_decreases() {
    let mut rng = ChaCha8Rng::seed_from_u64(65535);
    for _ in 0..20_000 {
        let a: f64 = rng.gen_range(-2.0..3.0);
        let b: f64 = rng.gen_range(-2.0..3.0);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        assert!(quantize(lo) <= quantize(hi), "quantize({lo}) > quantize({hi})");
        assert!(quantize(hi) <= 65535);
    }
}
