//! Cursor over the filtered candidates
//!
//! Movement wraps around. The position is not reset when the filtered set
//! shrinks; it is clamped only when read.

/// Pointed position in the currently filtered sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pointed: usize,
}

impl Cursor {
    /// Cursor at the first candidate
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw position, possibly past the end of the filtered set
    pub fn position(&self) -> usize {
        self.pointed
    }

    /// Move one up, wrapping to the last of `len` candidates
    pub fn move_up(&mut self, len: usize) {
        let base = len.max(1);
        self.pointed = (self.pointed + base - 1) % base;
    }

    /// Move one down, wrapping to the first of `len` candidates
    pub fn move_down(&mut self, len: usize) {
        let base = len.max(1);
        self.pointed = (self.pointed + 1) % base;
    }

    /// Clamp to `len` candidates and return the pointed index, `None` when empty
    pub fn pointed(&mut self, len: usize) -> Option<usize> {
        self.pointed = self.pointed.min(len.saturating_sub(1));
        (len > 0).then_some(self.pointed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_down_wraps() {
        let mut cursor = Cursor::new();
        cursor.move_down(3);
        assert_eq!(cursor.pointed(3), Some(1));
        cursor.move_down(3);
        cursor.move_down(3);
        assert_eq!(cursor.pointed(3), Some(0));
    }

    #[test]
    fn test_up_wraps() {
        let mut cursor = Cursor::new();
        cursor.move_up(3);
        assert_eq!(cursor.pointed(3), Some(2));
        cursor.move_up(3);
        assert_eq!(cursor.pointed(3), Some(1));
    }

    #[test]
    fn test_full_cycle_returns_to_start() {
        for len in 1..8 {
            for start in 0..len {
                let mut cursor = Cursor { pointed: start };
                (0..len).for_each(|_| cursor.move_down(len));
                assert_eq!(cursor.position(), start);
                (0..len).for_each(|_| cursor.move_up(len));
                assert_eq!(cursor.position(), start);
            }
        }
    }

    #[test]
    fn test_empty_set_is_noop() {
        let mut cursor = Cursor::new();
        cursor.move_down(0);
        cursor.move_up(0);
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.pointed(0), None);
    }

    #[test]
    fn test_position_survives_until_read() {
        let mut cursor = Cursor::new();
        (0..3).for_each(|_| cursor.move_down(4));
        // the filtered set shrank to two candidates; nothing clamps yet
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.pointed(2), Some(1));
        assert_eq!(cursor.position(), 1);
    }
}
