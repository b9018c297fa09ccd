pub const DEFAULT_INSTRUCTIONS_PER_SECOND: u32 = 700;

// Behaviour that differs between the COSMAC VIP interpreter and later ones.
// Defaults follow the later (CHIP-48 / SUPER-CHIP) convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quirks {
    // 8XY6/8XYE shift VY into VX instead of shifting VX in place
    pub shift_uses_vy: bool,
    // FX55/FX65 leave I pointing past the last byte touched
    pub load_store_increments_index: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub instructions_per_second: u32,
    pub quirks: Quirks,
    /// Seed for CXNN. `None` draws from OS entropy.
    pub rng_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            instructions_per_second: DEFAULT_INSTRUCTIONS_PER_SECOND,
            quirks: Quirks::default(),
            rng_seed: None,
        }
    }
}

impl Config {
    pub fn with_ips(mut self, ips: u32) -> Self {
        self.instructions_per_second = ips.max(1);
        self
    }

    pub fn with_quirks(mut self, quirks: Quirks) -> Self {
        self.quirks = quirks;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}
