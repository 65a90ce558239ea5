/// Cubic ease-in-out on [0, 1].
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Eased interpolation between two fixed-size vectors over a duration.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tween<const N: usize> {
    pub from: [f64; N],
    pub to: [f64; N],
    pub duration_s: f64,
}

impl<const N: usize> Tween<N> {
    pub fn new(from: [f64; N], to: [f64; N], duration_s: f64) -> Self {
        Self {
            from,
            to,
            duration_s,
        }
    }

    /// Linear progress in [0, 1] after `elapsed_s` seconds.
    pub fn progress(&self, elapsed_s: f64) -> f64 {
        if self.duration_s <= 0.0 {
            return 1.0;
        }
        (elapsed_s / self.duration_s).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self, elapsed_s: f64) -> bool {
        self.progress(elapsed_s) >= 1.0
    }

    pub fn sample(&self, elapsed_s: f64) -> [f64; N] {
        let t = ease_in_out_cubic(self.progress(elapsed_s));
        let mut out = self.from;
        for (i, v) in out.iter_mut().enumerate() {
            *v = lerp(self.from[i], self.to[i], t);
        }
        out
    }
}
