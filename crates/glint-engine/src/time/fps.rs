use std::time::{Duration, Instant};

/// Counts frames over one-second windows.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window_start: Instant,
    frames: u32,
    window: Duration,
}

impl FpsCounter {
    pub fn new(start: Instant) -> Self {
        Self {
            window_start: start,
            frames: 0,
            window: Duration::from_secs(1),
        }
    }

    /// Records one frame at `now`.
    ///
    /// Returns the frame count of the window that just closed, at most once
    /// per elapsed window.
    pub fn tick(&mut self, now: Instant) -> Option<u32> {
        self.frames += 1;
        if now.saturating_duration_since(self.window_start) < self.window {
            return None;
        }
        let count = self.frames;
        self.frames = 0;
        self.window_start = now;
        Some(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_once_per_second() {
        let start = Instant::now();
        let mut fps = FpsCounter::new(start);

        for i in 1..60 {
            assert_eq!(fps.tick(start + Duration::from_millis(i * 16)), None);
        }
        assert_eq!(fps.tick(start + Duration::from_millis(1000)), Some(60));
        assert_eq!(fps.tick(start + Duration::from_millis(1016)), None);
    }
}
