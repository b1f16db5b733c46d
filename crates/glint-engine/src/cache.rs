//! Lazily recomputed values.

/// A value paired with a validity flag.
///
/// Starts stale; `get_or_update` recomputes only after `invalidate`.
#[derive(Debug, Clone, Default)]
pub struct Cached<T> {
    value: T,
    valid: bool,
}

impl<T> Cached<T> {
    pub fn new(value: T) -> Self {
        Self { value, valid: false }
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn get_or_update(&mut self, update: impl FnOnce(&mut T)) -> &T {
        if !self.valid {
            update(&mut self.value);
            self.valid = true;
        }
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recomputes_only_when_stale() {
        let mut c = Cached::new(0u32);
        let mut calls = 0;

        assert!(!c.is_valid());
        c.get_or_update(|v| {
            calls += 1;
            *v = 7;
        });
        c.get_or_update(|_| calls += 1);
        assert_eq!(calls, 1);

        c.invalidate();
        assert_eq!(*c.get_or_update(|v| *v += 1), 8);
    }
}
