use liquant::{Attr, Color, Error, Image};

mod common;

#[test]
fn rejects_bad_dimensions() {
    let attr = Attr::new();
    let data = vec![0u8; 16];

    assert_eq!(Error::ValueOutOfRange, Image::new(&attr, &data, 0, 4, 0.0).unwrap_err());
    assert_eq!(Error::ValueOutOfRange, Image::new(&attr, &data, 4, 0, 0.0).unwrap_err());
    assert_eq!(Error::BufferTooSmall, Image::new(&attr, &data, 3, 2, 0.0).unwrap_err());
    assert_eq!(Error::ValueOutOfRange, Image::new(&attr, &data, 2, 2, 1.0).unwrap_err());
    assert!(Image::new(&attr, &data, 2, 2, 0.5).is_ok());
}

#[test]
fn importance_map_excludes_pixels() {
    let attr = Attr::new();
    let data = [255, 0, 0, 255, 0, 0, 255, 255];

    let mut img = Image::new(&attr, &data, 2, 1, 0.0).unwrap();
    img.set_importance_map(&[255, 0]).unwrap();

    let res = img.quantize(&attr).unwrap();
    assert_eq!(&[Color::new(255, 0, 0, 255)], res.palette().colors());
}

#[test]
fn row_callback_matches_slice() {
    let mut attr = Attr::new();
    attr.set_max_colors(20).unwrap();

    let data = common::photo(24, 24, 7);
    let rows = data.clone();

    let slice_img = Image::new(&attr, &data, 24, 24, 0.0).unwrap();
    let row_img = Image::from_rows(&attr, move |y, row: &mut [Color]| {
        for (x, c) in row.iter_mut().enumerate() {
            let i = (y * 24 + x) * 4;
            *c = Color::new(rows[i], rows[i + 1], rows[i + 2], rows[i + 3]);
        }
    }, 24, 24, 0.0).unwrap();

    let mut a = slice_img.quantize(&attr).unwrap();
    let mut b = row_img.quantize(&attr).unwrap();

    assert_eq!(a.palette().colors(), b.palette().colors());
    assert_eq!(a.remapped(&slice_img).unwrap(), b.remapped(&row_img).unwrap());
}

#[test]
fn fixed_colors_are_kept() {
    let mut attr = Attr::new();
    attr.set_max_colors(8).unwrap();

    let data = common::photo(32, 32, 3);
    let mut img = Image::new(&attr, &data, 32, 32, 0.0).unwrap();
    img.add_fixed_color(Color::new(1, 2, 3, 255)).unwrap();
    img.add_fixed_color(Color::new(250, 0, 250, 128)).unwrap();

    let res = img.quantize(&attr).unwrap();
    let colors = res.palette().colors();

    assert_eq!(8, colors.len());
    assert!(colors.contains(&Color::new(1, 2, 3, 255)));
    assert!(colors.contains(&Color::new(250, 0, 250, 128)));
}

#[test]
fn too_many_fixed_colors() {
    let attr = Attr::new();
    let data = [0u8; 4];
    let mut img = Image::new(&attr, &data, 1, 1, 0.0).unwrap();

    for i in 0..256 {
        img.add_fixed_color(Color::new(i as u8, 7, 7, 255)).unwrap();
    }

    assert_eq!(Err(Error::Unsupported), img.add_fixed_color(Color::new(0, 0, 0, 0)));
}

#[test]
fn background_must_match() {
    let attr = Attr::new();
    let small = common::photo(4, 4, 1);
    let big = common::photo(5, 5, 1);

    let mut img = Image::new(&attr, &small, 4, 4, 0.0).unwrap();

    let bg = Image::new(&attr, &big, 5, 5, 0.0).unwrap();
    assert_eq!(Err(Error::BufferTooSmall), img.set_background(bg));

    let bg = Image::new(&attr, &small, 4, 4, 0.0).unwrap();
    assert_eq!(Ok(()), img.set_background(bg));
    assert_eq!(4, img.background().map(|bg| bg.height()).unwrap_or(0));

    // Dropping the owner drops the background exactly once
    drop(img);
}

#[test]
fn transparent_pixels_use_background() {
    let attr = Attr::new();
    let fg = [0u8, 0, 0, 0, 0, 255, 0, 255];
    let bg = [0u8, 0, 255, 255, 0, 0, 255, 255];

    // Palette made from green and blue
    let palette_src = [0u8, 255, 0, 255, 0, 0, 255, 255];
    let src = Image::new(&attr, &palette_src, 2, 1, 0.0).unwrap();
    let mut res = src.quantize(&attr).unwrap();
    res.set_dithering_level(0.0).unwrap();

    let mut img = Image::new(&attr, &fg, 2, 1, 0.0).unwrap();
    img.set_background(Image::new(&attr, &bg, 2, 1, 0.0).unwrap()).unwrap();

    let out = res.remapped(&img).unwrap();
    let colors = res.palette().colors();

    assert_eq!(Color::new(0, 0, 255, 255), colors[out[0] as usize]);
    assert_eq!(Color::new(0, 255, 0, 255), colors[out[1] as usize]);
}
