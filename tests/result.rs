use std::sync::{Arc, Mutex};

use approx::assert_abs_diff_eq;
use liquant::{Attr, Error, Image};

mod common;

#[test]
fn speed_changes_output() {
    let data = common::photo(64, 64, 5);

    let outputs: Vec<Vec<u8>> = [1, 5, 10].iter().map(|&speed| {
        let mut attr = Attr::new();
        attr.set_speed(speed).unwrap();
        attr.set_max_colors(32).unwrap();

        let img = Image::new(&attr, &data, 64, 64, 0.0).unwrap();
        img.quantize(&attr).unwrap().remapped(&img).unwrap()
    }).collect();

    assert_ne!(outputs[0], outputs[1]);
    assert_ne!(outputs[1], outputs[2]);
    assert_ne!(outputs[0], outputs[2]);
}

#[test]
fn quality_too_low() {
    let data = common::noise(64, 64, 2);

    for min in [90, 95, 100] {
        let mut attr = Attr::new();
        attr.set_max_colors(10).unwrap();
        attr.set_quality(min, 100).unwrap();

        let img = Image::new(&attr, &data, 64, 64, 0.0).unwrap();
        assert_eq!(Error::QualityTooLow, img.quantize(&attr).err().unwrap());
    }

    let mut attr = Attr::new();
    attr.set_max_colors(10).unwrap();
    let img = Image::new(&attr, &data, 64, 64, 0.0).unwrap();
    assert!(img.quantize(&attr).is_ok());
}

#[test]
fn quality_threshold_is_exact() {
    let data = common::photo(32, 32, 9);

    let mut attr = Attr::new();
    attr.set_max_colors(10).unwrap();
    let img = Image::new(&attr, &data, 32, 32, 0.0).unwrap();
    let quality = img.quantize(&attr).unwrap().quantization_quality() as i32;
    assert!(quality < 100);

    attr.set_min_quality(quality).unwrap();
    assert!(img.quantize(&attr).is_ok());

    attr.set_min_quality(quality + 1).unwrap();
    assert_eq!(Error::QualityTooLow, img.quantize(&attr).err().unwrap());
}

#[test]
fn lower_quality_thresholds_pass() {
    let data: Vec<u8> = (0..256).flat_map(|i| [i as u8, 255 - i as u8, 40, 255]).collect();

    for min in [0, 25, 75] {
        let mut attr = Attr::new();
        attr.set_quality(min, 100).unwrap();

        let img = Image::new(&attr, &data, 16, 16, 0.0).unwrap();
        assert!(img.quantize(&attr).is_ok());
    }
}

#[test]
fn transparent_entries_first() {
    let attr = Attr::new();
    let data = common::alpha_gradient();
    let img = Image::new(&attr, &data, 16, 16, 0.0).unwrap();

    let res = img.quantize(&attr).unwrap();
    let colors = res.palette().colors();

    assert_eq!(0, colors[0].a);
    assert_eq!(255, colors[colors.len() - 1].a);
}

#[test]
fn transparent_entries_last() {
    let mut attr = Attr::new();
    attr.set_last_index_transparent(true);
    let data = common::alpha_gradient();
    let img = Image::new(&attr, &data, 16, 16, 0.0).unwrap();

    let res = img.quantize(&attr).unwrap();
    let colors = res.palette().colors();

    assert_eq!(255, colors[0].a);
    assert_eq!(0, colors[colors.len() - 1].a);
}

#[test]
fn remapping_metrics() {
    let attr = Attr::new();
    let data = common::photo(64, 64, 4);
    let img = Image::new(&attr, &data, 64, 64, 0.0).unwrap();

    let mut res = img.quantize(&attr).unwrap();
    assert_eq!(None, res.remapping_error());
    assert_eq!(None, res.remapping_quality());

    res.remapped(&img).unwrap();

    let error = res.remapping_error().unwrap();
    let quality = res.remapping_quality().unwrap();
    assert!(error > 0.0 && error < 255.0, "{}", error);
    assert!(quality > 0 && quality < 100, "{}", quality);
}

#[test]
fn undithered_remap_matches_quantization_error() {
    let mut attr = Attr::new();
    attr.set_max_colors(256).unwrap();

    // Fits in the palette, so remapping is exact
    let data: Vec<u8> = (0..64).flat_map(|i| [i as u8 * 4, 0, 255 - i as u8 * 4, 255]).collect();
    let img = Image::new(&attr, &data, 8, 8, 0.0).unwrap();

    let mut res = img.quantize(&attr).unwrap();
    res.set_dithering_level(0.0).unwrap();
    res.remapped(&img).unwrap();

    assert_abs_diff_eq!(0.0, res.quantization_error(), epsilon = 1e-9);
    assert_abs_diff_eq!(0.0, res.remapping_error().unwrap(), epsilon = 1e-3);
}

#[test]
fn buffer_too_small() {
    let attr = Attr::new();
    let data = common::photo(8, 8, 0);
    let img = Image::new(&attr, &data, 8, 8, 0.0).unwrap();

    let mut res = img.quantize(&attr).unwrap();
    let mut buf = vec![0u8; 63];

    assert_eq!(Err(Error::BufferTooSmall), res.remap_image(&img, &mut buf));

    let mut buf = vec![0u8; 64];
    assert_eq!(Ok(()), res.remap_image(&img, &mut buf));
}

#[test]
fn output_gamma_rebuilds_palette() {
    let attr = Attr::new();
    let data = common::photo(16, 16, 8);
    let img = Image::new(&attr, &data, 16, 16, 0.0).unwrap();

    let mut res = img.quantize(&attr).unwrap();
    let before = res.palette().colors().to_vec();

    res.set_output_gamma(0.8).unwrap();
    assert_eq!(before.len(), res.palette().len());
    assert_ne!(before, res.palette().colors());

    assert_eq!(Err(Error::ValueOutOfRange), res.set_output_gamma(0.0));
    assert_eq!(Err(Error::ValueOutOfRange), res.set_output_gamma(1.0));
    assert_eq!(0.8, res.output_gamma());

    res.remapped(&img).unwrap();
}

#[test]
fn progress_is_monotonic() {
    let seen = Arc::new(Mutex::new(Vec::<f32>::new()));
    let sink = seen.clone();

    let mut attr = Attr::new();
    attr.set_speed(1).unwrap();
    attr.set_max_colors(32).unwrap();
    attr.set_progress_callback(move |p| {
        sink.lock().unwrap().push(p);
        true
    });

    let data = common::photo(32, 32, 2);
    let img = Image::new(&attr, &data, 32, 32, 0.0).unwrap();
    let mut res = img.quantize(&attr).unwrap();

    {
        let seen = seen.lock().unwrap();
        assert!(!seen.is_empty());
        assert!(seen.iter().all(|p| (0.0..=100.0).contains(p)));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(100.0, *seen.last().unwrap());
    }

    let remap_seen = Arc::new(Mutex::new(Vec::<f32>::new()));
    let sink = remap_seen.clone();
    res.set_progress_callback(move |p| {
        sink.lock().unwrap().push(p);
        true
    });
    res.remapped(&img).unwrap();

    let remap_seen = remap_seen.lock().unwrap();
    assert!(remap_seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(100.0, *remap_seen.last().unwrap());
}

#[test]
fn abort_generation() {
    let mut attr = Attr::new();
    attr.set_progress_callback(|_| false);

    let data = common::photo(16, 16, 2);
    let img = Image::new(&attr, &data, 16, 16, 0.0).unwrap();

    assert_eq!(Error::Aborted, img.quantize(&attr).err().unwrap());
}

#[test]
fn abort_late_in_generation() {
    let mut attr = Attr::new();
    attr.set_speed(1).unwrap();
    attr.set_max_colors(16).unwrap();
    attr.set_progress_callback(|p| p < 60.0);

    let data = common::photo(16, 16, 2);
    let img = Image::new(&attr, &data, 16, 16, 0.0).unwrap();

    assert_eq!(Error::Aborted, img.quantize(&attr).err().unwrap());
}

#[test]
fn abort_remap() {
    let attr = Attr::new();
    let data = common::photo(16, 16, 2);
    let img = Image::new(&attr, &data, 16, 16, 0.0).unwrap();

    let mut res = img.quantize(&attr).unwrap();
    res.set_progress_callback(|_| false);
    assert_eq!(Err(Error::Aborted), res.remapped(&img).map(|_| ()));
    assert_eq!(None, res.remapping_error());

    res.clear_progress_callback();
    assert!(res.remapped(&img).is_ok());
}
