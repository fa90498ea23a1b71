//! Index folding shared by the counting generators
//!
//! `logical(i) = step * floor(((i mod startover) mod (frequency * repetition)) / frequency)`
//!
//! Frequency repeats each logical value, repetition restarts the cycle after
//! `repetition` distinct values, startover restarts unconditionally every
//! `startover` emissions. Unbounded moduli are skipped.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Folding {
    pub step: f64,
    pub frequency: u64,
    pub repetition: Option<u64>,
    pub startover: Option<u64>,
}

impl Default for Folding {
    fn default() -> Self {
        Self {
            step: 1.0,
            frequency: 1,
            repetition: None,
            startover: None,
        }
    }
}

impl Folding {
    /// Fold an emission index into a count of steps.
    pub fn fold(&self, index: u64) -> u64 {
        let frequency = self.frequency.max(1);
        let mut folded = index;
        if let Some(startover) = self.startover.filter(|s| *s > 0) {
            folded %= startover;
        }
        if let Some(cycle) = self
            .repetition
            .filter(|r| *r > 0)
            .and_then(|r| r.checked_mul(frequency))
        {
            folded %= cycle;
        }
        folded / frequency
    }

    /// Folded index multiplied by the step.
    pub fn logical_index(&self, index: u64) -> f64 {
        self.step * self.fold(index) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn frequency_repetition_and_startover_compose() {
        let folding = Folding {
            step: 1.0,
            frequency: 2,
            repetition: Some(3),
            startover: Some(6),
        };
        let folded: Vec<u64> = (0..12).map(|i| folding.fold(i)).collect();
        assert_eq!(folded, vec![0, 0, 1, 1, 2, 2, 0, 0, 1, 1, 2, 2]);
    }

    #[test]
    fn startover_cuts_a_repetition_cycle() {
        let folding = Folding {
            step: 1.0,
            frequency: 1,
            repetition: Some(4),
            startover: Some(3),
        };
        let folded: Vec<u64> = (0..6).map(|i| folding.fold(i)).collect();
        assert_eq!(folded, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn step_scales_the_fold() {
        let folding = Folding {
            step: -2.5,
            ..Folding::default()
        };
        assert_eq!(folding.logical_index(3), -7.5);
    }

    proptest! {
        #[test]
        fn unbounded_fold_is_plain_division(index in 0u64..1_000_000, frequency in 1u64..50) {
            let folding = Folding { frequency, ..Folding::default() };
            prop_assert_eq!(folding.fold(index), index / frequency);
        }

        #[test]
        fn repetition_bounds_the_fold(index in 0u64..1_000_000, repetition in 1u64..20) {
            let folding = Folding { repetition: Some(repetition), ..Folding::default() };
            prop_assert!(folding.fold(index) < repetition);
        }
    }
}
