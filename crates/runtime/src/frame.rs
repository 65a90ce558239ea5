use foundation::time::Time;

/// Deterministic frame metadata.
///
/// Animations are stepped with frame time instead of the wall clock so a
/// recenter can be recorded, replayed and tested frame by frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// Frames since the clock origin.
    pub index: u64,
    /// Seconds between frames.
    pub dt_s: f64,
    /// Time at the start of the frame, offset from the clock origin.
    pub time: Time,
    origin: Time,
}

impl Frame {
    pub fn new(index: u64, dt_s: f64) -> Self {
        Self::starting_at(Time::ZERO, index, dt_s)
    }

    /// Frame clock whose frame 0 begins at `origin`.
    pub fn starting_at(origin: Time, index: u64, dt_s: f64) -> Self {
        Self {
            index,
            dt_s,
            time: origin.after(index as f64 * dt_s),
            origin,
        }
    }

    pub fn next(self) -> Self {
        Self::starting_at(self.origin, self.index + 1, self.dt_s)
    }
}
