//! Reading and writing PNG image files.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::Context as _;
use png::chunk::ChunkType;

use checkertrace_render::Image;

/// Reads a PNG file into an [`Image`], whose row 0 is the bottom row of the picture.
///
/// Any PNG color type and bit depth is accepted and converted to 8-bit RGBA.
pub fn load_png(path: &Path) -> Result<Image, anyhow::Error> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    decode_png(BufReader::new(file)).with_context(|| format!("failed to read {}", path.display()))
}

/// Decodes PNG data into an [`Image`], whose row 0 is the bottom row of the picture.
pub fn decode_png(reader: impl Read) -> Result<Image, anyhow::Error> {
    let mut decoder = png::Decoder::new(reader);
    decoder.set_transformations(png::Transformations::normalize_to_color8());
    let mut reader = decoder.read_info()?;
    let mut buffer = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buffer)?;
    let width = info.width as usize;
    let height = info.height as usize;

    let rgba: Vec<u8> = {
        let data = &buffer[..info.buffer_size()];
        match info.color_type {
            png::ColorType::Rgba => data.to_vec(),
            png::ColorType::Rgb => data
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
            png::ColorType::GrayscaleAlpha => data
                .chunks_exact(2)
                .flat_map(|p| [p[0], p[0], p[0], p[1]])
                .collect(),
            png::ColorType::Grayscale => data.iter().flat_map(|&l| [l, l, l, 255]).collect(),
            png::ColorType::Indexed => {
                anyhow::bail!("indexed color was not expanded by the decoder")
            }
        }
    };

    // PNG rows are top first.
    let row_bytes = width * 4;
    let bottom_up: Vec<u8> = if row_bytes == 0 {
        Vec::new()
    } else {
        rgba.chunks_exact(row_bytes).rev().flatten().copied().collect()
    };
    Ok(Image::from_rgba8(width, height, &bottom_up)?)
}

/// Writes `image` to a new PNG file at `path`.
pub fn save_png(path: &Path, image: &Image) -> Result<(), anyhow::Error> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_png(&mut writer, image)
        .and_then(|()| writer.flush())
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Encodes `image` as PNG data.
pub fn write_png(writer: impl Write, image: &Image) -> Result<(), io::Error> {
    let mut png_writer = new_png_writer(writer, image.width(), image.height(), None)?;
    png_writer.write_image_data(&image.to_rgba8_top_down())?;
    png_writer.finish()?;
    Ok(())
}

/// Animation parameters for [`new_png_writer()`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct PngAnimation {
    pub frame_count: u32,
    pub frame_delay_ms: u16,
}

/// Creates a PNG writer for 8-bit RGBA images, or an APNG writer if `animation` is given.
pub(crate) fn new_png_writer<W: Write>(
    writer: W,
    width: usize,
    height: usize,
    animation: Option<PngAnimation>,
) -> Result<png::Writer<W>, io::Error> {
    let dimension = |size: usize| {
        u32::try_from(size).map_err(|_| io::Error::other("image too large for PNG"))
    };
    let mut png_encoder = png::Encoder::new(writer, dimension(width)?, dimension(height)?);
    png_encoder.set_color(png::ColorType::Rgba);
    png_encoder.set_depth(png::BitDepth::Eight);
    png_encoder.set_compression(png::Compression::Best);
    if let Some(PngAnimation {
        frame_count,
        frame_delay_ms,
    }) = animation
    {
        png_encoder.set_animated(frame_count, 0)?;
        png_encoder.set_frame_delay(frame_delay_ms, 1000)?;
    }
    let mut png_writer = png_encoder.write_header()?;
    // Declare that the pixel values are sRGB.
    png_writer.write_chunk(ChunkType(*b"sRGB"), &[0])?;
    Ok(png_writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkertrace_render::math::Rgba;
    use pretty_assertions::assert_eq;

    fn sample_image() -> Image {
        let mut image = Image::new(3, 2);
        image.put(0, 0, Rgba::new(1.0, 0.0, 0.0, 1.0));
        image.put(2, 1, Rgba::new(0.0, 0.0, 1.0, 0.5));
        image
    }

    #[test]
    fn encode_decode() {
        let image = sample_image();
        let mut data = Vec::new();
        write_png(&mut data, &image).unwrap();
        assert_eq!(decode_png(&data[..]).unwrap(), image);
    }

    #[test]
    fn encoded_rows_are_top_down() {
        let mut data = Vec::new();
        write_png(&mut data, &sample_image()).unwrap();

        let mut reader = png::Decoder::new(&data[..]).read_info().unwrap();
        let mut buffer = vec![0; reader.output_buffer_size()];
        reader.next_frame(&mut buffer).unwrap();
        // The bottom left pixel of the image is the first pixel of the last PNG row.
        assert_eq!(&buffer[12..16], &[255, 0, 0, 255]);
        assert_eq!(&buffer[8..12], &[0, 0, 255, 128]);
    }

    #[test]
    fn decode_rgb_and_grayscale() {
        let mut data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut data, 2, 1);
            encoder.set_color(png::ColorType::Grayscale);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[0, 200]).unwrap();
        }
        let image = decode_png(&data[..]).unwrap();
        assert_eq!(image.pixels(), &[0xFF00_0000, 0xFFC8_C8C8]);

        let mut data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut data, 1, 1);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[1, 2, 3]).unwrap();
        }
        let image = decode_png(&data[..]).unwrap();
        assert_eq!(image.pixels(), &[0xFF03_0201]);
    }

    #[test]
    fn decode_garbage() {
        assert!(decode_png(&b"not a png"[..]).is_err());
    }
}
