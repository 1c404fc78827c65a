use std::env;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use liquant::{Attr, Image, Palette, QuantizeResult};

fn load_image(path: &str) -> Result<(Vec<u8>, usize, usize), Box<dyn std::error::Error>> {
    let mut decoder = png::Decoder::new(File::open(path)?);
    // Expand palettes, grayscale and 16-bit input to 8-bit channels
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);

    let mut reader = decoder.read_info()?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;

    let width = info.width as usize;
    let height = info.height as usize;
    let bytes = &buf[..info.buffer_size()];

    let rgba = match info.color_type {
        png::ColorType::Rgba => bytes.to_vec(),
        png::ColorType::Rgb => bytes.chunks_exact(3).flat_map(|p| [p[0], p[1], p[2], 255]).collect(),
        png::ColorType::GrayscaleAlpha => bytes.chunks_exact(2).flat_map(|p| [p[0], p[0], p[0], p[1]]).collect(),
        png::ColorType::Grayscale => bytes.iter().flat_map(|&v| [v, v, v, 255]).collect(),
        png::ColorType::Indexed => return Err("unexpected indexed output".into()),
    };

    Ok((rgba, width, height))
}

fn save_image(path: &str, palette: &Palette, indexes: &[u8], width: usize, height: usize) -> Result<(), Box<dyn std::error::Error>> {
    let colors = palette.colors();

    let rgb_palette: Vec<u8> = colors.iter().flat_map(|c| [c.r, c.g, c.b]).collect();
    let trans: Vec<u8> = colors.iter().map(|c| c.a).collect();

    let file = File::create(Path::new(path))?;
    let w = BufWriter::new(file);

    let mut encoder = png::Encoder::new(w, width as u32, height as u32);
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_palette(rgb_palette);
    encoder.set_trns(trans);
    let mut writer = encoder.write_header()?;

    writer.write_image_data(indexes)?;

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 4 || args.len() > 5 {
        println!("Usage: liquant_demo <colors> <src_path> <dst_path> [dithering_level]");
        std::process::exit(1)
    }

    let colors = args[1].parse::<i32>()?;
    let src_path = &args[2];
    let dst_path = &args[3];
    let dithering_level = match args.get(4) {
        Some(level) => level.parse::<f32>()?,
        None => 1.0,
    };

    let (bytes, width, height) = load_image(src_path)?;

    let mut attr = Attr::new();
    attr.set_max_colors(colors)?;
    if env::var_os("LIQUANT_VERBOSE").is_some() {
        attr.set_log_callback(|_, msg| eprintln!("{}", msg));
    }

    let image = Image::new(&attr, &bytes, width, height, 0.0)?;

    let mut result = QuantizeResult::quantize(&image, &attr)?;
    result.set_dithering_level(dithering_level)?;

    let indexes = result.remapped(&image)?;

    if let (Some(err), Some(q)) = (result.remapping_error(), result.remapping_quality()) {
        println!("{} colors, MSE={:.3} (Q={})", result.palette().len(), err, q);
    }

    save_image(dst_path, result.palette(), &indexes, width, height)
}
