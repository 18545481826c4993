//! Controller-owned deadlines.

use std::time::Duration;

/// One pending deadline with a payload. Arming replaces whatever was pending,
/// so a superseded deadline can never fire.
#[derive(Debug)]
pub(crate) struct Timer<T> {
    pending: Option<(Duration, T)>,
}

impl<T> Default for Timer<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> Timer<T> {
    pub fn arm(&mut self, deadline: Duration, payload: T) {
        self.pending = Some((deadline, payload));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    /// Disarm and return the payload once `now` has reached the deadline.
    pub fn fire(&mut self, now: Duration) -> Option<T> {
        match self.pending {
            Some((deadline, _)) if now >= deadline => self.pending.take().map(|(_, payload)| payload),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_fires_once_at_deadline() {
        let mut timer = Timer::default();
        timer.arm(ms(250), 7u64);

        assert_eq!(timer.fire(ms(249)), None);
        assert_eq!(timer.fire(ms(250)), Some(7));
        assert_eq!(timer.fire(ms(300)), None);
        assert_eq!(timer.deadline(), None);
    }

    #[test]
    fn test_rearm_replaces_pending() {
        let mut timer = Timer::default();
        timer.arm(ms(100), "first");
        timer.arm(ms(400), "second");

        assert_eq!(timer.deadline(), Some(ms(400)));
        assert_eq!(timer.fire(ms(200)), None);
        assert_eq!(timer.fire(ms(400)), Some("second"));
    }

    #[test]
    fn test_cancel() {
        let mut timer = Timer::default();
        timer.arm(ms(10), ());
        timer.cancel();
        assert_eq!(timer.fire(ms(1_000)), None);
        assert_eq!(timer.deadline(), None);
    }
}
