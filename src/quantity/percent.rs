quantity!(Percent, "%");

impl Percent {
    pub const ZERO_PCT: Self = Self(0.0);
    pub const FULL: Self = Self(100.0);

    #[must_use]
    pub fn as_fraction(self) -> f64 {
        self.0 / 100.0
    }

    #[must_use]
    pub fn from_fraction(fraction: f64) -> Self {
        Self(fraction * 100.0)
    }
}
