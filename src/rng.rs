//! Small deterministic generator for shuffling the question bank.
//!
//! xorshift64: the same seed gives the same order everywhere, which keeps
//! shuffle tests reproducible. The browser seeds it from `getrandom`.

#[derive(Debug, Clone)]
pub struct QuizRng {
    state: u64,
}

impl QuizRng {
    pub fn new(seed: u64) -> Self {
        // xorshift gets stuck at zero
        Self { state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed } }
    }

    /// Seed from the platform entropy source, falling back to the clock.
    pub fn from_entropy() -> Self {
        let mut buf = [0u8; 8];
        match getrandom::getrandom(&mut buf) {
            Ok(()) => Self::new(u64::from_le_bytes(buf)),
            Err(e) => {
                log::warn!("getrandom failed ({e}), seeding shuffle from the clock");
                Self::new(clock_seed())
            }
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform integer in `0..=max` (rejection sampling, no modulo bias).
    pub fn index_inclusive(&mut self, max: usize) -> usize {
        let span = max as u64 + 1;
        if span == 0 {
            return self.next_u64() as usize;
        }
        let zone = u64::MAX - (u64::MAX % span);
        loop {
            let v = self.next_u64();
            if v < zone {
                return (v % span) as usize;
            }
        }
    }

    /// Fisher–Yates: walk from the last index down to 1, swapping with a
    /// uniform pick from `0..=i`.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.index_inclusive(i);
            items.swap(i, j);
        }
    }
}

fn clock_seed() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        let now = web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or(0.0);
        (now * 1000.0) as u64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1)
    }
}
