use anyhow::{bail, Result};
use serde::Serialize;

/// Exact, unnormalized string match.
pub fn score(prediction: &str, truth: &str) -> bool {
    prediction == truth
}

/// Fraction of attempts that matched. Zero attempts is an error, not 0.0.
pub fn average(total: usize, correct: usize) -> Result<f64> {
    if total == 0 {
        bail!("no sample produced a prompt/truth pair; cannot average over zero attempts");
    }
    Ok(correct as f64 / total as f64)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreTally {
    pub total: usize,
    pub correct: usize,
}

impl ScoreTally {
    pub fn record(&mut self, hit: bool) {
        self.total += 1;
        if hit { self.correct += 1; }
    }

    pub fn average(&self) -> Result<f64> {
        average(self.total, self.correct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_scores() {
        assert!(score("hello", "hello"));
        assert!(!score("hello", "hello "));
        assert!(!score("Hello", "hello"));
        assert!(score("", ""));
    }

    #[test]
    fn average_is_correct_over_total() {
        assert!((average(10, 3).unwrap() - 0.3).abs() < f64::EPSILON);
        assert_eq!(average(4, 4).unwrap(), 1.0);
        assert_eq!(average(4, 0).unwrap(), 0.0);
    }

    #[test]
    fn average_over_zero_attempts_fails() {
        let err = average(0, 0).unwrap_err();
        assert!(err.to_string().contains("zero attempts"));
    }

    #[test]
    fn tally_counts_every_attempt() {
        let mut tally = ScoreTally::default();
        for hit in [true, false, false, true, false] {
            tally.record(hit);
        }
        assert_eq!(tally, ScoreTally { total: 5, correct: 2 });
        assert!((tally.average().unwrap() - 0.4).abs() < f64::EPSILON);
    }
}
