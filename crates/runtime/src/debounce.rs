use foundation::time::Time;

/// Holds back the latest value until input has been quiet for `quiet_s`.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet_s: f64,
    pending: Option<(T, Time)>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet_s: f64) -> Self {
        Self {
            quiet_s,
            pending: None,
        }
    }

    pub fn quiet_s(&self) -> f64 {
        self.quiet_s
    }

    /// Replace any pending value and restart the quiet period.
    pub fn push(&mut self, value: T, now: Time) {
        self.pending = Some((value, now));
    }

    /// When the pending value becomes ready, if any.
    pub fn deadline(&self) -> Option<Time> {
        self.pending.as_ref().map(|(_, at)| at.after(self.quiet_s))
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Take the pending value once the quiet period has elapsed.
    pub fn poll(&mut self, now: Time) -> Option<T> {
        let ready = matches!(&self.pending, Some((_, at)) if now.since(*at) >= self.quiet_s);
        if ready {
            self.pending.take().map(|(value, _)| value)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Debouncer;
    use foundation::time::Time;

    #[test]
    fn releases_after_quiet_period() {
        let mut d = Debouncer::new(0.4);
        d.push("par", Time(0.0));
        assert_eq!(d.poll(Time(0.39)), None);
        assert_eq!(d.poll(Time(0.4)), Some("par"));
        assert_eq!(d.poll(Time(1.0)), None);
    }

    #[test]
    fn new_input_restarts_period() {
        let mut d = Debouncer::new(0.4);
        d.push("p", Time(0.0));
        d.push("pa", Time(0.3));
        d.push("par", Time(0.6));
        assert_eq!(d.poll(Time(0.7)), None);
        assert_eq!(d.deadline(), Some(Time(0.6).after(0.4)));
        assert_eq!(d.poll(Time(1.0)), Some("par"));
    }

    #[test]
    fn cancel_drops_pending() {
        let mut d = Debouncer::new(0.4);
        d.push(1, Time(0.0));
        d.cancel();
        assert_eq!(d.deadline(), None);
        assert_eq!(d.poll(Time(5.0)), None);
    }
}
