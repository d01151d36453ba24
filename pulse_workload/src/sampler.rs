use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

pub const METHODS: [&str; 4] = ["GET", "POST", "PUT", "DELETE"];
pub const STATUSES: [&str; 3] = ["200", "404", "500"];
pub const ENDPOINTS: [&str; 3] = ["/api/users", "/api/orders", "/api/products"];

/// One synthetic event worth of label values and readings.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub method: &'static str,
    pub status: &'static str,
    pub endpoint: &'static str,
    /// Percent, in `[0, 100)`.
    pub cpu_usage: f64,
    /// Milliseconds, in `[0, 1000)`.
    pub duration_ms: f64,
}

/// Draws label values and readings; seeded runs are reproducible.
pub struct Sampler {
    rng: StdRng,
}

impl Sampler {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(Some(seed))
    }

    pub fn next_sample(&mut self) -> Sample {
        Sample {
            method: pick(&mut self.rng, &METHODS),
            status: pick(&mut self.rng, &STATUSES),
            endpoint: pick(&mut self.rng, &ENDPOINTS),
            cpu_usage: self.rng.gen::<f64>() * 100.0,
            duration_ms: self.rng.gen::<f64>() * 1000.0,
        }
    }
}

fn pick(rng: &mut StdRng, values: &[&'static str]) -> &'static str {
    values.choose(rng).copied().unwrap_or_default()
}
