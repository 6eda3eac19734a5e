//! Random search — i.i.d. uniform draws per dimension.

use rand::rngs::StdRng;

use quantlab_core::rng::SeedHierarchy;

use super::{ParamSet, ParameterRange, SearchMethod};

/// `max_evaluations` independent uniform draws, each dimension sampled
/// according to its dtype (ints and floats snap to step, bools are fair
/// coins, choices pick uniformly). Seeded, so the draw sequence is
/// reproducible.
pub struct RandomSearch {
    ranges: Vec<ParameterRange>,
    rng: StdRng,
    budget: usize,
    drawn: usize,
}

impl RandomSearch {
    pub fn new(ranges: &[ParameterRange], max_evaluations: usize, seed: u64) -> Self {
        Self {
            ranges: ranges.to_vec(),
            rng: SeedHierarchy::new(seed).rng_for("random_search", 0),
            budget: max_evaluations,
            drawn: 0,
        }
    }

    fn draw(&mut self) -> ParamSet {
        let mut params = ParamSet::new();
        for range in &self.ranges {
            params.insert(range.name.clone(), range.sample(&mut self.rng));
        }
        params
    }
}

impl SearchMethod for RandomSearch {
    fn propose(&mut self, n: usize) -> Vec<ParamSet> {
        let take = n.min(self.budget - self.drawn);
        let batch: Vec<ParamSet> = (0..take).map(|_| self.draw()).collect();
        self.drawn += take;
        batch
    }

    fn ingest(&mut self, _params: &ParamSet, _score: Option<f64>) {}

    fn finished(&self) -> bool {
        self.drawn >= self.budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::{ParamValue, RangeSpec};

    fn ranges() -> Vec<ParameterRange> {
        vec![
            ParameterRange::int("lookback", 10, 50, 5),
            ParameterRange::float("threshold", 0.01, 0.10, 0.01),
            ParameterRange::bool("flag"),
        ]
    }

    #[test]
    fn draws_respect_bounds_and_step() {
        let mut search = RandomSearch::new(&ranges(), 100, 42);
        let all = search.propose(100);
        assert_eq!(all.len(), 100);
        for params in &all {
            match params["lookback"] {
                ParamValue::Int(i) => {
                    assert!((10..=50).contains(&i));
                    assert_eq!((i - 10) % 5, 0);
                }
                _ => panic!("wrong dtype"),
            }
            match params["threshold"] {
                ParamValue::Float(f) => assert!((0.01..=0.10).contains(&f)),
                _ => panic!("wrong dtype"),
            }
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let a = RandomSearch::new(&ranges(), 50, 7).propose(50);
        let b = RandomSearch::new(&ranges(), 50, 7).propose(50);
        assert_eq!(a, b);
    }

    #[test]
    fn budget_is_exhausted_exactly() {
        let mut search = RandomSearch::new(&ranges(), 10, 1);
        assert_eq!(search.propose(7).len(), 7);
        assert_eq!(search.propose(7).len(), 3);
        assert!(search.finished());
        assert!(search.propose(7).is_empty());
    }

    #[test]
    fn choice_dimension_samples_listed_values() {
        let ranges = vec![ParameterRange::choice(
            "mode",
            vec!["a".to_string(), "b".to_string()],
        )];
        let mut search = RandomSearch::new(&ranges, 20, 3);
        for params in search.propose(20) {
            match &params["mode"] {
                ParamValue::Choice(c) => assert!(c == "a" || c == "b"),
                _ => panic!("wrong dtype"),
            }
        }
        assert!(matches!(ranges[0].spec, RangeSpec::Choice { .. }));
    }
}
