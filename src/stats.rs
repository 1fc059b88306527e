//! Playout statistics of a move: how often it was tried and how it fared.

/// Number of playouts and their mean outcome.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct MoveStats {
    pub playouts: u32,
    pub value: f64,
}

impl MoveStats {
    pub fn new(value: f64, playouts: u32) -> Self {
        Self { playouts, value }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.playouts == 0
    }

    /// Fold `playouts` results averaging `result` into the running mean.
    pub fn add_result(&mut self, result: f64, playouts: u32) {
        if playouts == 0 {
            return;
        }
        self.playouts += playouts;
        self.value += (result - self.value) * playouts as f64 / self.playouts as f64;
    }

    /// Combine two independent samples: playouts add, values are averaged
    /// weighted by playouts.
    pub fn merge(&mut self, other: &MoveStats) {
        if other.playouts == 0 {
            return;
        }
        self.add_result(other.value, other.playouts);
    }

    /// `self` merged with `other`, leaving both untouched.
    pub fn merged(mut self, other: &MoveStats) -> MoveStats {
        self.merge(other);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_result_running_mean() {
        let mut s = MoveStats::default();
        s.add_result(1.0, 1);
        s.add_result(0.0, 1);
        assert_eq!(s.playouts, 2);
        assert!((s.value - 0.5).abs() < 1e-12);
        s.add_result(1.0, 2);
        assert_eq!(s.playouts, 4);
        assert!((s.value - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_zero_playouts_ignored() {
        let mut s = MoveStats::default();
        s.add_result(1.0, 0);
        assert_eq!(s, MoveStats::default());
        s.add_result(0.25, 1);
        s.add_result(1.0, 0);
        assert_eq!(s, MoveStats::new(0.25, 1));
    }

    #[test]
    fn test_merge_weighted() {
        let a = MoveStats::new(1.0, 3);
        let b = MoveStats::new(0.0, 1);
        let m = a.merged(&b);
        assert_eq!(m.playouts, 4);
        assert!((m.value - 0.75).abs() < 1e-12);
        assert_eq!(MoveStats::default().merged(&MoveStats::default()), MoveStats::default());
    }
}
