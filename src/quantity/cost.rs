quantity!(Cost, " cu");

impl Cost {
    /// The monetary value of the `max` of two costs, used when finding the
    /// worst-case grid price over a future window.
    #[must_use]
    pub fn worse(self, other: Self) -> Self {
        self.max(other)
    }
}
