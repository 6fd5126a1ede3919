use rand::Rng;

/// Timing-offset distribution for a clapping crowd.
///
/// Each variant maps the user-facing `spread` (milliseconds) onto its own
/// native scale parameter. The mappings are calibration choices tying the
/// single spread control to comparable audible widths across distributions,
/// so the exact constants matter:
/// - `Normal`: spread is the standard deviation
/// - `Uniform`: spread is the half-width of the support
/// - `Exponential`: magnitude rate is `2 / spread` (random sign)
/// - `Laplace`: scale is `spread / sqrt(2)`
/// - `Beta`: `Beta(alpha, beta)` on `[0, 1]`, affinely mapped to
///   `[-spread, +spread]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OffsetDistribution {
    Normal,
    Uniform,
    Exponential,
    Laplace,
    Beta { alpha: f64, beta: f64 },
}

impl Default for OffsetDistribution {
    fn default() -> Self {
        OffsetDistribution::Normal
    }
}

impl OffsetDistribution {
    /// Parse a distribution name. Unrecognized names fall back to `Normal`,
    /// matching the dispatch behavior of the configuration surface.
    pub fn from_name(name: &str) -> Self {
        match name {
            "normal" => OffsetDistribution::Normal,
            "uniform" => OffsetDistribution::Uniform,
            "exponential" => OffsetDistribution::Exponential,
            "laplace" => OffsetDistribution::Laplace,
            "beta" => OffsetDistribution::Beta {
                alpha: 2.0,
                beta: 2.0,
            },
            _ => OffsetDistribution::Normal,
        }
    }

    /// Draw one timing offset in milliseconds.
    ///
    /// A spread of zero deterministically yields exactly `0.0` for every
    /// distribution: the exponential and Laplace formulas degenerate to
    /// `0/0` there, so the short-circuit is load-bearing, not cosmetic.
    pub fn sample_ms<R: Rng>(&self, spread_ms: f64, rng: &mut R) -> f64 {
        if spread_ms <= 0.0 {
            return 0.0;
        }
        match *self {
            OffsetDistribution::Normal => spread_ms * standard_normal(rng),
            OffsetDistribution::Uniform => rng.gen_range(-spread_ms..spread_ms),
            OffsetDistribution::Exponential => {
                // Random sign times an Exp(2/spread) magnitude.
                let u = 1.0 - rng.gen::<f64>(); // (0, 1]
                let magnitude = -u.ln() * spread_ms / 2.0;
                if rng.gen::<bool>() {
                    magnitude
                } else {
                    -magnitude
                }
            }
            OffsetDistribution::Laplace => {
                let b = spread_ms / std::f64::consts::SQRT_2;
                // u in [-0.5, 0.5]; reject the measure-zero point where
                // 1 - 2|u| hits zero and the log blows up.
                loop {
                    let u = rng.gen::<f64>() - 0.5;
                    let t = 1.0 - 2.0 * u.abs();
                    if t > 0.0 {
                        return -b * u.signum() * t.ln();
                    }
                }
            }
            OffsetDistribution::Beta { alpha, beta } => {
                let x = beta_variate(alpha, beta, rng);
                (2.0 * x - 1.0) * spread_ms
            }
        }
    }
}

/// Standard normal variate via the trigonometric form of Box-Muller.
///
/// The first uniform draw is rejected at exactly zero to keep `ln` finite.
pub fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    let mut u = 0.0;
    while u == 0.0 {
        u = rng.gen::<f64>();
    }
    let v = rng.gen::<f64>();
    (-2.0 * u.ln()).sqrt() * (2.0 * std::f64::consts::PI * v).cos()
}

/// Gamma(shape, rate = 1) variate via the Marsaglia-Tsang squeeze method.
///
/// Valid for shape >= 1; shapes below 1 are boosted through the identity
/// `Gamma(a) = Gamma(a + 1) * U^(1/a)`.
pub fn gamma_variate<R: Rng>(shape: f64, rng: &mut R) -> f64 {
    if shape < 1.0 {
        let u = 1.0 - rng.gen::<f64>(); // (0, 1]
        return gamma_variate(shape + 1.0, rng) * u.powf(1.0 / shape);
    }
    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();
    loop {
        let x = standard_normal(rng);
        let v = 1.0 + c * x;
        if v <= 0.0 {
            continue;
        }
        let v = v * v * v;
        let u = rng.gen::<f64>();
        // Squeeze check first; the log check only runs on the rare miss.
        if u < 1.0 - 0.0331 * x.powi(4) {
            return d * v;
        }
        if u.ln() < 0.5 * x * x + d * (1.0 - v + v.ln()) {
            return d * v;
        }
    }
}

/// Beta(alpha, beta) variate on [0, 1] via the ratio of two Gammas.
pub fn beta_variate<R: Rng>(alpha: f64, beta: f64, rng: &mut R) -> f64 {
    let ga = gamma_variate(alpha, rng);
    let gb = gamma_variate(beta, rng);
    ga / (ga + gb)
}
