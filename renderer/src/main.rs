use std::path::PathBuf;

use clap::Parser;

use julia_core::julia::{Complex, RenderParams, Viewport, DEFAULT_BAILOUT_SQR};
use julia_core::palette::Palette;
use julia_core::render;

// -h is the height flag, so the short help flag is disabled and --help
// re-added by hand below.
#[derive(Parser)]
#[command(
    name = "julia-render",
    about = "Render a Julia set fractal to an uncompressed 24-bit bitmap",
    disable_help_flag = true
)]
struct Cli {
    /// Output .bmp file path
    output: PathBuf,

    /// Real part of the seed constant
    #[arg(short = 'a', allow_negative_numbers = true)]
    seed_real: f64,

    /// Imaginary part of the seed constant
    #[arg(short = 'b', allow_negative_numbers = true)]
    seed_imag: f64,

    /// Image width in pixels
    #[arg(short = 'w', long, default_value_t = 1000)]
    width: u32,

    /// Image height in pixels
    #[arg(short = 'h', long, default_value_t = 1000)]
    height: u32,

    /// Left edge of the viewport on the real axis
    #[arg(long = "minX", default_value_t = -2.0, allow_negative_numbers = true)]
    min_x: f64,

    /// Right edge of the viewport on the real axis
    #[arg(long = "maxX", default_value_t = 2.0, allow_negative_numbers = true)]
    max_x: f64,

    /// Bottom edge of the viewport on the imaginary axis
    #[arg(long = "minY", default_value_t = -2.0, allow_negative_numbers = true)]
    min_y: f64,

    /// Top edge of the viewport on the imaginary axis
    #[arg(long = "maxY", default_value_t = 2.0, allow_negative_numbers = true)]
    max_y: f64,

    /// Raw palette table: one little-endian u32 (0x00RRGGBB) per color,
    /// at least iters + 1 entries; falls back to the default bands
    #[arg(long)]
    map: Option<PathBuf>,

    /// Built-in palette id (0 bands, 1 grayscale, 2 fire, 3 ocean)
    #[arg(long, default_value_t = 0)]
    palette: usize,

    /// Maximum iterations per point
    #[arg(long, default_value_t = 50)]
    iters: u32,

    /// Rows computed and flushed per band
    #[arg(long, default_value_t = render::DEFAULT_BAND_ROWS)]
    band: u32,

    /// Print help
    #[arg(long, action = clap::ArgAction::Help)]
    help: Option<bool>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let slots = cli.iters as usize + 1;
    let palette = match &cli.map {
        Some(path) => Palette::from_file_or_default(path, slots),
        None => Palette::builtin(cli.palette, slots)?,
    };

    let params = RenderParams {
        seed: Complex::new(cli.seed_real, cli.seed_imag),
        viewport: Viewport::new(cli.min_x, cli.max_x, cli.min_y, cli.max_y),
        width: cli.width,
        height: cli.height,
        max_iters: cli.iters,
        bailout_sqr: DEFAULT_BAILOUT_SQR,
    };

    render::render_to_path(&cli.output, &params, &palette, cli.band)?;
    eprintln!("Wrote {}", cli.output.display());

    Ok(())
}
