/// Truevision TGA codec: 18-byte header, raw or run-length pixel stream, 26-byte footer
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::debug;
use nom::{
    bytes::complete::take,
    number::complete::{le_u16, le_u32, le_u8},
    sequence::tuple,
    IResult,
};

use crate::error::{Error, Result};

pub const HEADER_SIZE: usize = 18;
pub const FOOTER_SIZE: usize = 26;
pub const SIGNATURE: &[u8; 16] = b"TRUEVISION-XFILE";

const TYPE_TRUECOLOR: u8 = 2;
const TYPE_GRAY: u8 = 3;
const TYPE_RLE_TRUECOLOR: u8 = 10;
const TYPE_RLE_GRAY: u8 = 11;

/// Descriptor bit set when row 0 is the top of the image
const ORIGIN_TOP_LEFT: u8 = 1 << 5;

/// Largest pixel count a single run-length packet can carry
const MAX_PACKET: usize = 128;

/// An 8-bit-per-channel color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// `alpha << 24 | red << 16 | green << 8 | blue`
    pub fn pack_rgba(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    pub fn from_packed_rgba(value: u32) -> Self {
        Self::new(
            (value >> 16) as u8,
            (value >> 8) as u8,
            value as u8,
            (value >> 24) as u8,
        )
    }

    /// Rec. 601 luma
    pub fn luma(self) -> u8 {
        ((self.r as u32 * 299 + self.g as u32 * 587 + self.b as u32 * 114) / 1000) as u8
    }

    /// Scale the color channels by `intensity`, keeping alpha
    pub fn scale(self, intensity: f32) -> Self {
        let channel = |c: u8| (c as f32 * intensity).round().clamp(0.0, 255.0) as u8;
        Self::new(channel(self.r), channel(self.g), channel(self.b), self.a)
    }
}

/// Pixel layouts the codec can store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Gray8,
    Rgb24,
    Rgba32,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb24 => 3,
            PixelFormat::Rgba32 => 4,
        }
    }

    /// Value of the header's `pixel_depth` field
    pub fn depth_bits(self) -> u8 {
        (self.bytes_per_pixel() * 8) as u8
    }

    fn alpha_bits(self) -> u8 {
        match self {
            PixelFormat::Rgba32 => 8,
            _ => 0,
        }
    }

    /// Write `color` into one pixel element of this format
    pub fn encode(self, color: Color, out: &mut [u8]) {
        match self {
            PixelFormat::Gray8 => out[0] = color.luma(),
            PixelFormat::Rgb24 => out.copy_from_slice(&[color.b, color.g, color.r]),
            PixelFormat::Rgba32 => out.copy_from_slice(&color.pack_rgba().to_le_bytes()),
        }
    }

    /// Read one pixel element of this format
    pub fn decode(self, bytes: &[u8]) -> Color {
        match self {
            PixelFormat::Gray8 => Color::rgb(bytes[0], bytes[0], bytes[0]),
            PixelFormat::Rgb24 => Color::rgb(bytes[2], bytes[1], bytes[0]),
            PixelFormat::Rgba32 => {
                Color::from_packed_rgba(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
        }
    }
}

/// How the pixel stream is stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    RunLength,
}

/// The fixed 18-byte TGA header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub id_length: u8,
    pub colormap_type: u8,
    pub image_type: u8,
    pub first_entry_index: u16,
    pub colormap_length: u16,
    pub colormap_entry_size: u8,
    pub x_origin: u16,
    pub y_origin: u16,
    pub width: u16,
    pub height: u16,
    pub pixel_depth: u8,
    pub image_descriptor: u8,
}

impl Header {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        parse_header(bytes)
            .map(|(_, header)| header)
            .map_err(|_| Error::Unsupported("truncated header".to_string()))
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0] = self.id_length;
        buf[1] = self.colormap_type;
        buf[2] = self.image_type;
        buf[3..5].copy_from_slice(&self.first_entry_index.to_le_bytes());
        buf[5..7].copy_from_slice(&self.colormap_length.to_le_bytes());
        buf[7] = self.colormap_entry_size;
        buf[8..10].copy_from_slice(&self.x_origin.to_le_bytes());
        buf[10..12].copy_from_slice(&self.y_origin.to_le_bytes());
        buf[12..14].copy_from_slice(&self.width.to_le_bytes());
        buf[14..16].copy_from_slice(&self.height.to_le_bytes());
        buf[16] = self.pixel_depth;
        buf[17] = self.image_descriptor;
        buf
    }
}

fn parse_header(input: &[u8]) -> IResult<&[u8], Header> {
    let (input, (id_length, colormap_type, image_type)) = tuple((le_u8, le_u8, le_u8))(input)?;
    let (input, (first_entry_index, colormap_length, colormap_entry_size)) =
        tuple((le_u16, le_u16, le_u8))(input)?;
    let (input, (x_origin, y_origin, width, height, pixel_depth, image_descriptor)) =
        tuple((le_u16, le_u16, le_u16, le_u16, le_u8, le_u8))(input)?;

    Ok((
        input,
        Header {
            id_length,
            colormap_type,
            image_type,
            first_entry_index,
            colormap_length,
            colormap_entry_size,
            x_origin,
            y_origin,
            width,
            height,
            pixel_depth,
            image_descriptor,
        },
    ))
}

/// The 26-byte TGA 2.0 footer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    pub extension_area_offset: u32,
    pub developer_dir_offset: u32,
    pub signature: [u8; 16],
    pub reserved: u8,
    pub zero_terminator: u8,
}

impl Default for Footer {
    fn default() -> Self {
        Self {
            extension_area_offset: 0,
            developer_dir_offset: 0,
            signature: *SIGNATURE,
            reserved: b'.',
            zero_terminator: 0,
        }
    }
}

impl Footer {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        parse_footer(bytes)
            .map(|(_, footer)| footer)
            .map_err(|_| Error::BadSignature)
    }

    pub fn has_signature(&self) -> bool {
        &self.signature == SIGNATURE
    }

    pub fn to_bytes(&self) -> [u8; FOOTER_SIZE] {
        let mut buf = [0u8; FOOTER_SIZE];
        buf[0..4].copy_from_slice(&self.extension_area_offset.to_le_bytes());
        buf[4..8].copy_from_slice(&self.developer_dir_offset.to_le_bytes());
        buf[8..24].copy_from_slice(&self.signature);
        buf[24] = self.reserved;
        buf[25] = self.zero_terminator;
        buf
    }
}

fn parse_footer(input: &[u8]) -> IResult<&[u8], Footer> {
    let (input, (extension_area_offset, developer_dir_offset, signature, reserved, zero_terminator)) =
        tuple((le_u32, le_u32, take(16usize), le_u8, le_u8))(input)?;

    let mut footer = Footer {
        extension_area_offset,
        developer_dir_offset,
        signature: [0; 16],
        reserved,
        zero_terminator,
    };
    footer.signature.copy_from_slice(signature);
    Ok((input, footer))
}

fn ensure_little_endian() -> Result<()> {
    if cfg!(target_endian = "big") {
        return Err(Error::BigEndianHost);
    }
    Ok(())
}

/// A TGA image held in memory.
///
/// Pixels are stored row-major in file order, `bytes_per_pixel` bytes each.
/// Pixel accessors only accept bottom-left-origin images; see
/// [`Image::flip_vertically`] for top-left inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    header: Header,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Image {
    /// Zero-filled, bottom-left-origin image
    pub fn new(width: u16, height: u16, format: PixelFormat) -> Self {
        let header = Header {
            image_type: image_type(format, Compression::None),
            width,
            height,
            pixel_depth: format.depth_bits(),
            image_descriptor: format.alpha_bits(),
            ..Header::default()
        };
        Self {
            header,
            format,
            data: vec![0; width as usize * height as usize * format.bytes_per_pixel()],
        }
    }

    pub fn gray(width: u16, height: u16) -> Self {
        Self::new(width, height, PixelFormat::Gray8)
    }

    pub fn rgb(width: u16, height: u16) -> Self {
        Self::new(width, height, PixelFormat::Rgb24)
    }

    pub fn rgba(width: u16, height: u16) -> Self {
        Self::new(width, height, PixelFormat::Rgba32)
    }

    pub fn width(&self) -> u16 {
        self.header.width
    }

    pub fn height(&self) -> u16 {
        self.header.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_bottom_left(&self) -> bool {
        self.header.image_descriptor & ORIGIN_TOP_LEFT == 0
    }

    fn offset(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width() || y >= self.height() || !self.is_bottom_left() {
            return None;
        }
        let index = y as usize * self.width() as usize + x as usize;
        Some(index * self.format.bytes_per_pixel())
    }

    /// Color at `(x, y)`, or `None` when out of bounds or the image has a top-left origin
    pub fn get(&self, x: u16, y: u16) -> Option<Color> {
        let offset = self.offset(x, y)?;
        let bpp = self.format.bytes_per_pixel();
        Some(self.format.decode(&self.data[offset..offset + bpp]))
    }

    pub fn set(&mut self, x: u16, y: u16, color: Color) {
        debug_assert!(
            x < self.width() && y < self.height(),
            "pixel ({x}, {y}) outside {}x{} image",
            self.width(),
            self.height()
        );
        debug_assert!(self.is_bottom_left(), "pixel access needs a bottom-left origin");

        if let Some(offset) = self.offset(x, y) {
            let bpp = self.format.bytes_per_pixel();
            self.format.encode(color, &mut self.data[offset..offset + bpp]);
        }
    }

    pub fn fill(&mut self, color: Color) {
        let bpp = self.format.bytes_per_pixel();
        let mut element = [0u8; 4];
        self.format.encode(color, &mut element[..bpp]);
        for pixel in self.data.chunks_exact_mut(bpp) {
            pixel.copy_from_slice(&element[..bpp]);
        }
    }

    /// Reverse the row order and toggle the origin bit to match
    pub fn flip_vertically(&mut self) {
        let row = self.width() as usize * self.format.bytes_per_pixel();
        let height = self.height() as usize;
        for y in 0..height / 2 {
            let (top, bottom) = self.data.split_at_mut((height - 1 - y) * row);
            top[y * row..(y + 1) * row].swap_with_slice(&mut bottom[..row]);
        }
        self.header.image_descriptor ^= ORIGIN_TOP_LEFT;
    }

    /// Load an uncompressed or run-length truecolor TGA file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let image = Self::read_from(BufReader::new(File::open(path)?))?;
        debug!(
            "loaded {}: {}x{} {:?}",
            path.display(),
            image.width(),
            image.height(),
            image.format
        );
        Ok(image)
    }

    /// Decode a truecolor TGA stream.
    ///
    /// The footer signature is required. The image ID field is skipped and
    /// not retained, so the returned header always has `id_length == 0`.
    pub fn read_from<R: Read + Seek>(mut reader: R) -> Result<Self> {
        ensure_little_endian()?;

        let mut bytes = [0u8; HEADER_SIZE];
        reader.read_exact(&mut bytes)?;
        let mut header = Header::parse(&bytes)?;

        let end = reader.seek(SeekFrom::End(0))?;
        if end < (HEADER_SIZE + FOOTER_SIZE) as u64 {
            return Err(Error::BadSignature);
        }
        reader.seek(SeekFrom::End(-(FOOTER_SIZE as i64)))?;
        let mut bytes = [0u8; FOOTER_SIZE];
        reader.read_exact(&mut bytes)?;
        if !Footer::parse(&bytes)?.has_signature() {
            return Err(Error::BadSignature);
        }

        if header.colormap_type != 0 {
            return Err(Error::Unsupported("color-mapped images".to_string()));
        }
        let compression = match header.image_type {
            TYPE_TRUECOLOR => Compression::None,
            TYPE_RLE_TRUECOLOR => Compression::RunLength,
            TYPE_GRAY | TYPE_RLE_GRAY => {
                return Err(Error::Unsupported("black-and-white images".to_string()))
            }
            other => return Err(Error::Unsupported(format!("image type {other}"))),
        };
        let format = match header.pixel_depth {
            24 => PixelFormat::Rgb24,
            32 => PixelFormat::Rgba32,
            depth => return Err(Error::Unsupported(format!("{depth}-bit truecolor"))),
        };

        // The pixel stream ends where the footer starts
        let stream_start = HEADER_SIZE as u64 + header.id_length as u64;
        let data_end = end - FOOTER_SIZE as u64;
        if stream_start > data_end {
            return Err(Error::Unsupported("truncated image id".to_string()));
        }
        reader.seek(SeekFrom::Start(stream_start))?;
        let mut stream = (&mut reader).take(data_end - stream_start);

        let pixel_count = header.width as usize * header.height as usize;
        let bpp = format.bytes_per_pixel();
        let data = match compression {
            Compression::None => {
                let mut data = vec![0u8; pixel_count * bpp];
                stream.read_exact(&mut data)?;
                data
            }
            Compression::RunLength => decode_rle(&mut stream, pixel_count, bpp)?,
        };

        header.id_length = 0;
        Ok(Self {
            header,
            format,
            data,
        })
    }

    /// Serialize header, pixel stream and footer
    pub fn write_to<W: Write>(&self, mut writer: W, compression: Compression) -> Result<()> {
        ensure_little_endian()?;

        let header = Header {
            id_length: 0,
            image_type: image_type(self.format, compression),
            ..self.header
        };
        writer.write_all(&header.to_bytes())?;
        match compression {
            Compression::None => writer.write_all(&self.data)?,
            Compression::RunLength => {
                writer.write_all(&encode_rle(&self.data, self.format.bytes_per_pixel()))?
            }
        }
        writer.write_all(&Footer::default().to_bytes())?;
        Ok(())
    }

    /// The complete file contents as written by [`Image::write_to`]
    pub fn encode(&self, compression: Compression) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + self.data.len() + FOOTER_SIZE);
        self.write_to(&mut bytes, compression)?;
        Ok(bytes)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P, compression: Compression) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer, compression)?;
        writer.flush()?;
        debug!("wrote {} ({:?})", path.display(), compression);
        Ok(())
    }
}

fn image_type(format: PixelFormat, compression: Compression) -> u8 {
    match (format, compression) {
        (PixelFormat::Gray8, Compression::None) => TYPE_GRAY,
        (PixelFormat::Gray8, Compression::RunLength) => TYPE_RLE_GRAY,
        (_, Compression::None) => TYPE_TRUECOLOR,
        (_, Compression::RunLength) => TYPE_RLE_TRUECOLOR,
    }
}

/// Decode exactly `pixel_count` pixels of a run-length stream.
///
/// Each packet starts with a byte whose top bit selects a run (one pixel
/// value repeated) or a raw packet (that many pixel values verbatim); the
/// low seven bits hold the pixel count minus one. A packet reaching past
/// `pixel_count` is an error.
pub fn decode_rle<R: Read>(
    reader: &mut R,
    pixel_count: usize,
    bytes_per_pixel: usize,
) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(pixel_count * bytes_per_pixel);
    let mut pixel = [0u8; 4];
    let pixel = &mut pixel[..bytes_per_pixel];
    let mut decoded = 0;

    while decoded < pixel_count {
        let mut packet = [0u8; 1];
        reader.read_exact(&mut packet)?;
        let count = (packet[0] & 0x7f) as usize + 1;
        if decoded + count > pixel_count {
            return Err(Error::RunLengthOverrun {
                decoded,
                packet: count,
                total: pixel_count,
            });
        }

        if packet[0] & 0x80 != 0 {
            reader.read_exact(pixel)?;
            for _ in 0..count {
                data.extend_from_slice(pixel);
            }
        } else {
            let start = data.len();
            data.resize(start + count * bytes_per_pixel, 0);
            reader.read_exact(&mut data[start..])?;
        }
        decoded += count;
    }

    Ok(data)
}

/// Run-length encode a pixel buffer with the packet layout [`decode_rle`] reads
pub fn encode_rle(data: &[u8], bytes_per_pixel: usize) -> Vec<u8> {
    let pixels: Vec<&[u8]> = data.chunks_exact(bytes_per_pixel).collect();
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < pixels.len() {
        let mut run = 1;
        while i + run < pixels.len() && run < MAX_PACKET && pixels[i + run] == pixels[i] {
            run += 1;
        }

        if run > 1 {
            out.push(0x80 | (run - 1) as u8);
            out.extend_from_slice(pixels[i]);
            i += run;
            continue;
        }

        // Raw packet: stop where the next two pixels would start a run.
        let start = i;
        while i < pixels.len()
            && i - start < MAX_PACKET
            && !(i + 1 < pixels.len() && pixels[i] == pixels[i + 1])
        {
            i += 1;
        }
        out.push((i - start - 1) as u8);
        for pixel in &pixels[start..i] {
            out.extend_from_slice(pixel);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn checkerboard(width: u16, height: u16, format: PixelFormat) -> Image {
        let mut image = Image::new(width, height, format);
        for y in 0..height {
            for x in 0..width {
                let color = if (x + y) % 2 == 0 {
                    Color::new(200, 10, 30, 255)
                } else {
                    Color::new(x as u8, y as u8, 7, 128)
                };
                image.set(x, y, color);
            }
        }
        image
    }

    /// A minimal TGA file around `header` and `pixels`
    fn tga_file(header: Header, id: &[u8], pixels: &[u8]) -> Vec<u8> {
        let mut bytes = header.to_bytes().to_vec();
        bytes.extend_from_slice(id);
        bytes.extend_from_slice(pixels);
        bytes.extend_from_slice(&Footer::default().to_bytes());
        bytes
    }

    #[test]
    fn test_pack_rgba() {
        let color = Color::new(0x11, 0x22, 0x33, 0x44);
        assert_eq!(color.pack_rgba(), 0x4411_2233);
        assert_eq!(Color::from_packed_rgba(0x4411_2233), color);
    }

    #[test]
    fn test_new_image_is_zeroed() {
        let image = Image::rgba(4, 3);
        assert_eq!(image.data().len(), 4 * 3 * 4);
        assert!(image.data().iter().all(|&b| b == 0));
        assert!(image.is_bottom_left());
        assert_eq!(Image::gray(5, 2).data().len(), 10);
        assert_eq!(Image::rgb(5, 2).data().len(), 30);
    }

    #[test]
    fn test_file_layout() {
        let mut image = Image::rgba(2, 1);
        image.set(1, 0, Color::new(1, 2, 3, 4));
        let bytes = image.encode(Compression::None).unwrap();

        assert_eq!(bytes.len(), HEADER_SIZE + 2 * 4 + FOOTER_SIZE);
        assert_eq!(
            &bytes[..HEADER_SIZE],
            &[0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 0, 1, 0, 32, 8]
        );
        assert_eq!(&bytes[HEADER_SIZE..HEADER_SIZE + 8], &[0, 0, 0, 0, 3, 2, 1, 4]);

        let footer = &bytes[bytes.len() - FOOTER_SIZE..];
        assert_eq!(&footer[..8], &[0; 8]);
        assert_eq!(&footer[8..24], SIGNATURE);
        assert_eq!(&footer[24..], &[b'.', 0]);
    }

    #[test]
    fn test_gray_header() {
        let bytes = Image::gray(3, 2).encode(Compression::None).unwrap();
        assert_eq!(bytes[2], TYPE_GRAY);
        assert_eq!(bytes[16], 8);
        assert_eq!(bytes[17], 0);
        assert_eq!(bytes.len(), HEADER_SIZE + 6 + FOOTER_SIZE);
    }

    #[test]
    fn test_raw_round_trip() {
        for format in [PixelFormat::Rgb24, PixelFormat::Rgba32] {
            let image = checkerboard(5, 3, format);
            let bytes = image.encode(Compression::None).unwrap();
            let loaded = Image::read_from(Cursor::new(bytes)).unwrap();
            assert_eq!(loaded.header(), image.header());
            assert_eq!(loaded.data(), image.data());
        }
    }

    #[test]
    fn test_run_length_round_trip() {
        let mut image = Image::rgb(40, 4);
        image.fill(Color::rgb(9, 9, 9));
        image.set(3, 1, Color::rgb(255, 0, 0));
        image.set(4, 1, Color::rgb(0, 255, 0));

        let bytes = image.encode(Compression::RunLength).unwrap();
        assert_eq!(bytes[2], TYPE_RLE_TRUECOLOR);
        assert!(bytes.len() < HEADER_SIZE + image.data().len() + FOOTER_SIZE);

        let loaded = Image::read_from(Cursor::new(bytes)).unwrap();
        assert_eq!(loaded.data(), image.data());
        assert_eq!(loaded.get(4, 1), Some(Color::rgb(0, 255, 0)));
    }

    #[test]
    fn test_decode_run_then_raw_packet() {
        let stream = [0x80, 255, 0, 0, 0x00, 10, 20, 30];
        let data = decode_rle(&mut Cursor::new(stream), 2, 3).unwrap();
        assert_eq!(data, vec![255, 0, 0, 10, 20, 30]);
    }

    #[test]
    fn test_decode_run_length_file() {
        let header = Header {
            image_type: TYPE_RLE_TRUECOLOR,
            width: 2,
            height: 1,
            pixel_depth: 24,
            ..Header::default()
        };
        let bytes = tga_file(header, &[], &[0x80, 255, 0, 0, 0x00, 10, 20, 30]);
        let image = Image::read_from(Cursor::new(bytes)).unwrap();
        assert_eq!(image.format(), PixelFormat::Rgb24);
        assert_eq!(image.data(), &[255, 0, 0, 10, 20, 30]);
        assert_eq!(image.get(1, 0), Some(Color::rgb(30, 20, 10)));
    }

    #[test]
    fn test_packet_straddling_the_end_is_rejected() {
        let stream = [0x81, 1, 2, 3];
        let err = decode_rle(&mut Cursor::new(stream), 1, 3).unwrap_err();
        assert!(matches!(
            err,
            Error::RunLengthOverrun {
                decoded: 0,
                packet: 2,
                total: 1
            }
        ));
    }

    #[test]
    fn test_truncated_stream() {
        let err = decode_rle(&mut Cursor::new([0x02, 1, 2, 3]), 3, 3).unwrap_err();
        assert!(matches!(err, Error::File(_)));
    }

    #[test]
    fn test_short_raw_stream_does_not_read_the_footer() {
        let header = Header {
            image_type: TYPE_TRUECOLOR,
            width: 2,
            height: 1,
            pixel_depth: 24,
            ..Header::default()
        };
        let err = Image::read_from(Cursor::new(tga_file(header, &[], &[1, 2, 3]))).unwrap_err();
        assert!(matches!(err, Error::File(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_short_run_length_stream_does_not_read_the_footer() {
        let header = Header {
            image_type: TYPE_RLE_TRUECOLOR,
            width: 3,
            height: 1,
            pixel_depth: 24,
            ..Header::default()
        };
        // One pixel decoded, then the next packet header would come from the footer
        let err = Image::read_from(Cursor::new(tga_file(header, &[], &[0x00, 1, 2, 3]))).unwrap_err();
        assert!(matches!(err, Error::File(_)));
    }

    #[test]
    fn test_image_id_past_the_footer_is_rejected() {
        let header = Header {
            id_length: 40,
            image_type: TYPE_TRUECOLOR,
            width: 1,
            height: 1,
            pixel_depth: 24,
            ..Header::default()
        };
        let err = Image::read_from(Cursor::new(tga_file(header, &[7; 4], &[]))).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[test]
    fn test_encode_packets() {
        let a = [1u8, 1, 1];
        let b = [2u8, 2, 2];
        let c = [3u8, 3, 3];
        let data = [a, a, a, b, c].concat();
        assert_eq!(
            encode_rle(&data, 3),
            vec![0x82, 1, 1, 1, 0x01, 2, 2, 2, 3, 3, 3]
        );
    }

    #[test]
    fn test_encode_splits_long_runs() {
        let data = vec![7u8; 300];
        assert_eq!(encode_rle(&data, 1), vec![0xff, 7, 0xff, 7, 0x80 | 43, 7]);

        let raw: Vec<u8> = (0..=255u8).chain(0..10).collect();
        let encoded = encode_rle(&raw, 1);
        assert_eq!(encoded[0], 0x7f);
        assert_eq!(encoded[129], 0x7f);
        assert_eq!(decode_rle(&mut Cursor::new(encoded), raw.len(), 1).unwrap(), raw);
    }

    #[test]
    fn test_image_id_is_skipped() {
        let header = Header {
            id_length: 3,
            image_type: TYPE_TRUECOLOR,
            width: 1,
            height: 1,
            pixel_depth: 24,
            ..Header::default()
        };
        let bytes = tga_file(header, b"abc", &[5, 6, 7]);
        let image = Image::read_from(Cursor::new(bytes)).unwrap();
        assert_eq!(image.header().id_length, 0);
        assert_eq!(image.get(0, 0), Some(Color::rgb(7, 6, 5)));
    }

    #[test]
    fn test_missing_signature() {
        let mut bytes = Image::rgb(2, 2).encode(Compression::None).unwrap();
        let len = bytes.len();
        bytes[len - 10] = b'?';
        let err = Image::read_from(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, Error::BadSignature));

        let err = Image::read_from(Cursor::new(vec![0u8; 20])).unwrap_err();
        assert!(matches!(err, Error::BadSignature));
    }

    #[test]
    fn test_unsupported_images() {
        let colormapped = Header {
            colormap_type: 1,
            image_type: 1,
            width: 1,
            height: 1,
            pixel_depth: 8,
            ..Header::default()
        };
        let err = Image::read_from(Cursor::new(tga_file(colormapped, &[], &[0]))).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));

        let gray = Image::gray(2, 2).encode(Compression::None).unwrap();
        let err = Image::read_from(Cursor::new(gray)).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));

        let sixteen_bit = Header {
            image_type: TYPE_TRUECOLOR,
            width: 1,
            height: 1,
            pixel_depth: 16,
            ..Header::default()
        };
        let err = Image::read_from(Cursor::new(tga_file(sixteen_bit, &[], &[0, 0]))).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[test]
    fn test_get_bounds() {
        let image = checkerboard(3, 2, PixelFormat::Rgba32);
        assert_eq!(image.get(0, 0), Some(Color::new(200, 10, 30, 255)));
        assert_eq!(image.get(1, 0), Some(Color::new(1, 0, 7, 128)));
        assert_eq!(image.get(3, 0), None);
        assert_eq!(image.get(0, 2), None);
    }

    #[test]
    fn test_gray_pixels() {
        let mut image = Image::gray(2, 1);
        image.set(0, 0, Color::WHITE);
        image.set(1, 0, Color::rgb(100, 100, 100));
        assert_eq!(image.data(), &[255, 100]);
        assert_eq!(image.get(1, 0), Some(Color::rgb(100, 100, 100)));
    }

    #[test]
    fn test_fill() {
        let mut image = Image::rgba(3, 3);
        image.fill(Color::new(1, 2, 3, 4));
        assert!(image.data().chunks_exact(4).all(|p| p == [3, 2, 1, 4]));
    }

    #[test]
    fn test_flip_vertically() {
        let mut image = Image::rgb(2, 3);
        image.set(0, 0, Color::rgb(1, 1, 1));
        image.set(1, 2, Color::rgb(2, 2, 2));

        image.flip_vertically();
        assert!(!image.is_bottom_left());
        assert_eq!(image.get(0, 0), None);

        image.flip_vertically();
        assert!(image.is_bottom_left());
        assert_eq!(image.get(0, 0), Some(Color::rgb(1, 1, 1)));

        let mut top_left = image.clone();
        top_left.flip_vertically();
        assert_eq!(&top_left.data()[..6], &[0, 0, 0, 2, 2, 2]);
    }
}
