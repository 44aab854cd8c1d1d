use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;

use crate::format::{BmpHeader, Color};
use crate::julia::Field;
use crate::palette::Palette;

/// Writes .bmp files incrementally, one pixel row at a time.
///
/// Rows arrive in file order, which for bitmaps is bottom-to-top: the
/// caller hands over the image's last row first.
pub struct BmpWriter<W: Write> {
    writer: W,
    header: BmpHeader,
    rows_written: u32,
}

impl<W: Write> BmpWriter<W> {
    /// Create a new writer. Writes the header immediately.
    pub fn new(mut writer: W, width: u32, height: u32) -> anyhow::Result<Self> {
        if width == 0 || height == 0 {
            anyhow::bail!("image dimensions must be positive: {width}x{height}");
        }
        let header = BmpHeader::new(width, height);
        writer.write_all(&header.to_bytes())?;
        Ok(Self {
            writer,
            header,
            rows_written: 0,
        })
    }

    /// Write one pixel row: blue-green-red per pixel, zero-padded so the
    /// stored row length is a multiple of 4.
    pub fn write_row(&mut self, row: &[Color]) -> anyhow::Result<()> {
        if row.len() != self.header.width as usize {
            anyhow::bail!("row has {} pixels, expected {}", row.len(), self.header.width);
        }
        if self.rows_written == self.header.height {
            anyhow::bail!("all {} rows already written", self.header.height);
        }
        let mut raw = Vec::with_capacity(self.header.row_size());
        for c in row {
            raw.extend_from_slice(&c.to_bgr_bytes());
        }
        raw.resize(self.header.row_size(), 0);
        self.writer.write_all(&raw)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Finalize: verify the row count and flush.
    pub fn finish(mut self) -> anyhow::Result<W> {
        if self.rows_written != self.header.height {
            anyhow::bail!(
                "wrote {} of {} rows",
                self.rows_written,
                self.header.height
            );
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Serialize a full field through `palette` into `writer`, last field
/// row first.
pub fn write_bitmap<W: Write>(writer: W, field: &Field, palette: &Palette) -> anyhow::Result<W> {
    let mut bmp = BmpWriter::new(writer, field.width(), field.height())?;
    let mut row_buf: Vec<Color> = Vec::with_capacity(field.width() as usize);
    for row in (0..field.height()).rev() {
        row_buf.clear();
        row_buf.extend(field.row(row).iter().map(|&n| palette.color(n)));
        bmp.write_row(&row_buf)?;
    }
    bmp.finish()
}

/// Serialize a full field to a file at `path`.
pub fn write_bitmap_file(path: &Path, field: &Field, palette: &Palette) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_bitmap(BufWriter::new(file), field, palette)?;
    Ok(())
}
