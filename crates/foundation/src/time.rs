/// Time primitives
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default)]
pub struct Time(pub f64); // seconds

impl Time {
    pub const ZERO: Time = Time(0.0);

    pub fn seconds(self) -> f64 {
        self.0
    }

    /// Seconds elapsed since `earlier`, never negative.
    pub fn since(self, earlier: Time) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }

    pub fn after(self, seconds: f64) -> Time {
        Time(self.0 + seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::Time;

    #[test]
    fn since_clamps_to_zero() {
        assert_eq!(Time(2.0).since(Time(0.5)), 1.5);
        assert_eq!(Time(0.5).since(Time(2.0)), 0.0);
    }

    #[test]
    fn after_offsets_forward() {
        assert_eq!(Time(1.0).after(0.4), Time(1.4));
    }
}
