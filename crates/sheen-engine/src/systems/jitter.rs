//! Bounded angle jitter from a seedable xorshift64 generator.

/// Seedable pseudo-random number generator (xorshift64).
#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Rng {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform float in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        // top 24 bits fit an f32 mantissa exactly
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }
}

/// Draws angle offsets in `[-span / 2, span / 2)` degrees.
#[derive(Debug, Clone)]
pub struct Jitter {
    rng: Rng,
    span: f32,
}

impl Jitter {
    pub fn new(seed: u64, span: f32) -> Self {
        Self {
            rng: Rng::new(seed),
            span: span.max(0.0),
        }
    }

    /// Largest possible offset magnitude.
    pub fn bound(&self) -> f32 {
        self.span / 2.0
    }

    pub fn sample(&mut self) -> f32 {
        if self.span == 0.0 {
            return 0.0;
        }
        (self.rng.next_f32() - 0.5) * self.span
    }
}
