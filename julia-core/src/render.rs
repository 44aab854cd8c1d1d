use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;

use crate::encode::BmpWriter;
use crate::format::Color;
use crate::julia::{self, Field, RenderParams};
use crate::palette::Palette;

/// Default number of rows computed and flushed per band.
pub const DEFAULT_BAND_ROWS: u32 = 50;

/// Pack a field into a height×width grid of RGB colors,
/// `grid[row][col]`, same orientation as the field.
pub fn color_grid(field: &Field, palette: &Palette) -> Vec<Vec<Color>> {
    (0..field.height())
        .map(|row| field.row(row).iter().map(|&n| palette.color(n)).collect())
        .collect()
}

/// Compute a field and pack it for in-process consumption.
pub fn render_grid(params: &RenderParams, palette: &Palette) -> anyhow::Result<Vec<Vec<Color>>> {
    check_palette(params, palette)?;
    let field = julia::compute_field(params)?;
    Ok(color_grid(&field, palette))
}

/// Render in horizontal bands of `band_rows` rows, bottom of the image
/// first, keeping peak memory at O(width · band) no matter the image
/// height. The output is byte-for-byte the same as serializing a full
/// field.
pub fn render_banded<W: Write>(
    writer: W,
    params: &RenderParams,
    palette: &Palette,
    band_rows: u32,
) -> anyhow::Result<W> {
    params.validate()?;
    check_palette(params, palette)?;
    if band_rows == 0 {
        anyhow::bail!("band size must be positive");
    }

    let mut bmp = BmpWriter::new(writer, params.width, params.height)?;
    let width = params.width as usize;
    let mut row_buf: Vec<Color> = Vec::with_capacity(width);

    let mut rows_done = 0u32;
    let mut last_decile = 0u32;
    let mut band_end = params.height;
    while band_end > 0 {
        let band_start = band_end.saturating_sub(band_rows);
        let n_rows = band_end - band_start;
        let counts = julia::compute_rows(params, band_start, n_rows);

        // rows leave in file order: highest index first
        for row in (0..n_rows as usize).rev() {
            row_buf.clear();
            row_buf.extend(
                counts[row * width..(row + 1) * width]
                    .iter()
                    .map(|&n| palette.color(n)),
            );
            bmp.write_row(&row_buf)?;
        }

        rows_done += n_rows;
        let decile = rows_done * 10 / params.height;
        if decile > last_decile {
            log::info!("{}% done ({rows_done}/{} rows)", decile * 10, params.height);
            last_decile = decile;
        }
        band_end = band_start;
    }

    bmp.finish()
}

/// Render straight to a file at `path`.
pub fn render_to_path(
    path: &Path,
    params: &RenderParams,
    palette: &Palette,
    band_rows: u32,
) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    render_banded(BufWriter::new(file), params, palette, band_rows)?;
    Ok(())
}

fn check_palette(params: &RenderParams, palette: &Palette) -> anyhow::Result<()> {
    let needed = params.max_iters as usize + 1;
    if palette.len() < needed {
        anyhow::bail!(
            "palette has {} colors, need {needed} for {} iterations",
            palette.len(),
            params.max_iters
        );
    }
    Ok(())
}
