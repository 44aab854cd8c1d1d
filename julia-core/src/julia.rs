use rayon::prelude::*;

pub const DEFAULT_MAX_ITERS: u32 = 50;
/// Bailout radius 2, squared. Orbits are compared against the square so
/// the inner loop never takes a root.
pub const DEFAULT_BAILOUT_SQR: f64 = 4.0;
pub const DEFAULT_SIZE: u32 = 1000;

/// A point on the complex plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// One step of the quadratic recurrence: z² + c.
    pub fn step(self, c: Complex) -> Complex {
        Complex {
            re: self.re * self.re - self.im * self.im + c.re,
            im: 2.0 * self.re * self.im + c.im,
        }
    }

    /// Squared magnitude.
    pub fn norm_sqr(self) -> f64 {
        self.re * self.re + self.im * self.im
    }
}

/// Seed constants that produce visually interesting sets.
pub const SEEDS: [Complex; 14] = [
    Complex { re: -0.76, im: -0.24 },
    Complex { re: -0.125, im: 0.75 },
    Complex { re: 0.285, im: 0.535 },
    Complex { re: -0.687, im: 0.312 },
    Complex { re: -0.5, im: 0.563 },
    Complex { re: -0.79, im: 0.15 },
    Complex { re: 0.27, im: 0.54 },
    Complex { re: -0.36, im: 0.64 },
    Complex { re: 0.42, im: 0.42 },
    Complex { re: 0.41, im: -0.32 },
    Complex { re: 0.275, im: 0.0 },
    Complex { re: -1.0, im: 0.0 },
    Complex { re: -1.0, im: 0.25 },
    Complex { re: 0.0, im: -1.0 },
];

/// The complex-plane rectangle mapped onto the pixel grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Viewport {
    /// The default window: [-2, 2] on both axes.
    pub const STANDARD: Viewport = Viewport {
        min_x: -2.0,
        max_x: 2.0,
        min_y: -2.0,
        max_y: 2.0,
    };

    /// A tighter [-1.1, 1.1] window; most seeds of interest keep their
    /// whole set inside it.
    pub const TIGHT: Viewport = Viewport {
        min_x: -1.1,
        max_x: 1.1,
        min_y: -1.1,
        max_y: 1.1,
    };

    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Everything the generator needs for one image.
#[derive(Clone, Copy, Debug)]
pub struct RenderParams {
    pub seed: Complex,
    pub viewport: Viewport,
    pub width: u32,
    pub height: u32,
    pub max_iters: u32,
    pub bailout_sqr: f64,
}

impl RenderParams {
    pub fn new(seed: Complex) -> Self {
        Self {
            seed,
            viewport: Viewport::STANDARD,
            width: DEFAULT_SIZE,
            height: DEFAULT_SIZE,
            max_iters: DEFAULT_MAX_ITERS,
            bailout_sqr: DEFAULT_BAILOUT_SQR,
        }
    }

    /// Reject bad dimensions and inverted bounds before any computation.
    /// Nothing is clamped.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.width == 0 || self.height == 0 {
            anyhow::bail!(
                "image dimensions must be positive: {}x{}",
                self.width,
                self.height
            );
        }
        let v = &self.viewport;
        if v.min_x >= v.max_x || v.min_y >= v.max_y {
            anyhow::bail!(
                "viewport bounds must satisfy min < max: x [{}, {}], y [{}, {}]",
                v.min_x,
                v.max_x,
                v.min_y,
                v.max_y
            );
        }
        if self.max_iters == 0 {
            anyhow::bail!("max iteration count must be positive");
        }
        if !(self.bailout_sqr > 0.0) {
            anyhow::bail!("bailout radius must be positive");
        }
        Ok(())
    }

    /// Complex point under pixel (col, row). The row index increases with
    /// the imaginary axis, matching bitmap row order.
    pub fn point_at(&self, col: u32, row: u32) -> Complex {
        let v = &self.viewport;
        Complex {
            re: v.min_x + (v.max_x - v.min_x) / self.width as f64 * col as f64,
            im: v.min_y + (v.max_y - v.min_y) / self.height as f64 * row as f64,
        }
    }
}

/// Escape-iteration counts for a height×width grid, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    width: u32,
    height: u32,
    counts: Vec<u32>,
}

impl Field {
    pub fn from_counts(width: u32, height: u32, counts: Vec<u32>) -> anyhow::Result<Field> {
        let expected = width as usize * height as usize;
        if counts.len() != expected {
            anyhow::bail!("count grid has {} cells, expected {expected}", counts.len());
        }
        Ok(Field {
            width,
            height,
            counts,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn count(&self, col: u32, row: u32) -> u32 {
        self.counts[row as usize * self.width as usize + col as usize]
    }

    pub fn row(&self, row: u32) -> &[u32] {
        let w = self.width as usize;
        &self.counts[row as usize * w..(row as usize + 1) * w]
    }
}

/// Iterations of z ← z² + c before the squared magnitude exceeds
/// `bailout_sqr`, capped at `max_iters`. The starting point is stepped
/// once before the first escape test; the point itself is never tested.
pub fn escape_count(start: Complex, seed: Complex, max_iters: u32, bailout_sqr: f64) -> u32 {
    let mut z = start;
    for n in 0..max_iters {
        z = z.step(seed);
        if z.norm_sqr() > bailout_sqr {
            return n;
        }
    }
    max_iters
}

/// Escape counts for rows `[row_start, row_start + n_rows)`, row-major.
/// Rows are independent, so they fan out across threads; each writes its
/// own chunk and the layout does not depend on scheduling.
pub fn compute_rows(params: &RenderParams, row_start: u32, n_rows: u32) -> Vec<u32> {
    let width = params.width as usize;
    let mut counts = vec![0u32; width * n_rows as usize];
    counts
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(j, out)| {
            let row = row_start + j as u32;
            for i in 0..params.width {
                let z = params.point_at(i, row);
                out[i as usize] =
                    escape_count(z, params.seed, params.max_iters, params.bailout_sqr);
            }
        });
    counts
}

/// Compute the full field. Validates parameters first.
pub fn compute_field(params: &RenderParams) -> anyhow::Result<Field> {
    params.validate()?;
    Ok(Field {
        width: params.width,
        height: params.height,
        counts: compute_rows(params, 0, params.height),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_expands_the_square() {
        let z = Complex::new(1.0, 1.0);
        let c = Complex::new(0.5, -0.25);
        let next = z.step(c);
        assert_eq!(next, Complex::new(0.5, 1.75));
        // pure: same inputs, same bits
        assert_eq!(z.step(c), next);
        assert_eq!(Complex::new(3.0, 4.0).norm_sqr(), 25.0);
    }

    #[test]
    fn origin_is_a_fixed_point_of_the_zero_seed() {
        let zero = Complex::new(0.0, 0.0);
        assert_eq!(escape_count(zero, zero, 50, 4.0), 50);

        // Pixel (1, 1) of a 2x2 grid over [-1, 1]² maps exactly to the
        // origin, so it must sit in the set.
        let params = RenderParams {
            seed: zero,
            viewport: Viewport::new(-1.0, 1.0, -1.0, 1.0),
            width: 2,
            height: 2,
            max_iters: 50,
            bailout_sqr: 4.0,
        };
        assert_eq!(params.point_at(1, 1), Complex::new(0.0, 0.0));
        let field = compute_field(&params).unwrap();
        assert_eq!(field.count(1, 1), 50);
    }

    #[test]
    fn bailout_is_tested_after_the_step_not_before() {
        // |2.1| already exceeds the bailout radius, but the first step
        // lands back inside (2.1² - 4.4 = 0.01), so the count must be 1,
        // not 0: the starting point itself is never tested.
        let start = Complex::new(2.1, 0.0);
        let seed = Complex::new(-4.4, 0.0);
        assert_eq!(escape_count(start, seed, 50, 4.0), 1);

        // A point that stays outside after one step escapes at 0.
        let start = Complex::new(2.0, 0.0);
        let seed = Complex::new(0.0, 0.0);
        assert_eq!(escape_count(start, seed, 50, 4.0), 0);
    }

    #[test]
    fn counts_stay_in_range_and_repeat_exactly() {
        let params = RenderParams {
            seed: SEEDS[0],
            viewport: Viewport::TIGHT,
            width: 16,
            height: 11,
            max_iters: 50,
            bailout_sqr: 4.0,
        };
        let field = compute_field(&params).unwrap();
        for row in 0..field.height() {
            for col in 0..field.width() {
                assert!(field.count(col, row) <= params.max_iters);
            }
        }
        assert_eq!(compute_field(&params).unwrap(), field);
    }

    #[test]
    fn pixel_mapping_follows_the_viewport() {
        let params = RenderParams {
            seed: Complex::new(0.0, 0.0),
            viewport: Viewport::new(-2.0, 2.0, -1.0, 1.0),
            width: 4,
            height: 2,
            max_iters: 50,
            bailout_sqr: 4.0,
        };
        assert_eq!(params.point_at(0, 0), Complex::new(-2.0, -1.0));
        assert_eq!(params.point_at(2, 1), Complex::new(0.0, 0.0));
        // max edges are exclusive: the last pixel sits one step short
        assert_eq!(params.point_at(3, 1), Complex::new(1.0, 0.0));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let mut params = RenderParams::new(Complex::new(0.0, 0.0));
        params.width = 0;
        assert!(params.validate().is_err());

        let mut params = RenderParams::new(Complex::new(0.0, 0.0));
        params.viewport.min_x = params.viewport.max_x;
        assert!(params.validate().is_err());

        let mut params = RenderParams::new(Complex::new(0.0, 0.0));
        params.viewport.min_y = 3.0;
        assert!(params.validate().is_err());

        let mut params = RenderParams::new(Complex::new(0.0, 0.0));
        params.max_iters = 0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn band_computation_matches_the_full_field() {
        let params = RenderParams {
            seed: SEEDS[2],
            viewport: Viewport::STANDARD,
            width: 9,
            height: 7,
            max_iters: 50,
            bailout_sqr: 4.0,
        };
        let field = compute_field(&params).unwrap();
        let band = compute_rows(&params, 3, 2);
        let w = params.width as usize;
        assert_eq!(&band[..w], field.row(3));
        assert_eq!(&band[w..], field.row(4));
    }
}
