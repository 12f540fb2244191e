/// ASCII preview of a rendered framebuffer for the terminal
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use std::io::Write;
use sw3d_core::Image;

/// Character luminosity ramp (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// A framebuffer downsampled to terminal cells
pub struct AsciiPreview {
    width: usize,
    height: usize,
    char_buffer: Vec<char>,
}

impl AsciiPreview {
    /// Sample `image` onto a `columns` x `rows` grid, top row first
    pub fn from_image(image: &Image, columns: usize, rows: usize) -> Self {
        let mut char_buffer = vec![' '; columns * rows];
        let (image_w, image_h) = (image.width() as usize, image.height() as usize);

        if image_w > 0 && image_h > 0 {
            for row in 0..rows {
                // Framebuffers have a bottom-left origin; terminals draw top-down.
                let y = image_h - 1 - (row * image_h / rows).min(image_h - 1);
                for col in 0..columns {
                    let x = (col * image_w / columns).min(image_w - 1);
                    let luma = image
                        .get(x as u16, y as u16)
                        .map_or(0, |color| color.luma());
                    char_buffer[row * columns + col] = ramp_char(luma);
                }
            }
        }

        Self {
            width: columns,
            height: rows,
            char_buffer,
        }
    }

    /// Preview text, one string per terminal row
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        self.char_buffer
            .chunks(self.width.max(1))
            .take(self.height)
            .map(|row| row.iter().collect())
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for row in self.rows() {
            for c in row.chars() {
                // Color based on character intensity
                let color = match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    _ => Color::White,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            writer.queue(ResetColor)?;
            writer.queue(Print('\n'))?;
        }
        writer.flush()
    }
}

fn ramp_char(luma: u8) -> char {
    let index = luma as usize * (LUMINOSITY_RAMP.len() - 1) / 255;
    LUMINOSITY_RAMP[index]
}
