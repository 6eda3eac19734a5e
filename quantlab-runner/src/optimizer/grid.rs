//! Grid search — deterministic Cartesian enumeration.

use super::{ParamSet, ParameterRange, ParamValue, SearchMethod};

/// Exhaustive grid over the discretized parameter space. When the full grid
/// exceeds the evaluation budget, an evenly spaced subset is enumerated
/// instead — index `floor(i * total / budget)` for each i — so coverage
/// spans the whole space rather than truncating at one corner.
pub struct GridSearch {
    dimensions: Vec<(String, Vec<ParamValue>)>,
    /// Flat grid indices still to propose.
    schedule: Vec<usize>,
    cursor: usize,
}

impl GridSearch {
    pub fn new(ranges: &[ParameterRange], max_evaluations: usize) -> Self {
        let dimensions: Vec<(String, Vec<ParamValue>)> = ranges
            .iter()
            .map(|r| (r.name.clone(), r.grid_values()))
            .collect();
        let total: usize = dimensions
            .iter()
            .map(|(_, vs)| vs.len())
            .fold(1usize, |acc, n| acc.saturating_mul(n));

        let schedule = if total <= max_evaluations || max_evaluations == 0 {
            (0..total).collect()
        } else {
            (0..max_evaluations)
                .map(|i| i * total / max_evaluations)
                .collect()
        };

        Self {
            dimensions,
            schedule,
            cursor: 0,
        }
    }

    /// Mixed-radix decode of a flat grid index. The last dimension varies
    /// fastest.
    fn decode(&self, mut index: usize) -> ParamSet {
        let mut params = ParamSet::new();
        for (name, values) in self.dimensions.iter().rev() {
            let v = &values[index % values.len()];
            index /= values.len();
            params.insert(name.clone(), v.clone());
        }
        params
    }
}

impl SearchMethod for GridSearch {
    fn propose(&mut self, n: usize) -> Vec<ParamSet> {
        let end = (self.cursor + n).min(self.schedule.len());
        let batch = self.schedule[self.cursor..end]
            .iter()
            .map(|&idx| self.decode(idx))
            .collect();
        self.cursor = end;
        batch
    }

    fn ingest(&mut self, _params: &ParamSet, _score: Option<f64>) {}

    fn finished(&self) -> bool {
        self.cursor >= self.schedule.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(search: &mut GridSearch) -> Vec<ParamSet> {
        let mut all = Vec::new();
        while !search.finished() {
            all.extend(search.propose(16));
        }
        all
    }

    #[test]
    fn full_grid_enumerates_every_combination() {
        let ranges = vec![
            ParameterRange::int("fast_period", 5, 15, 1),
            ParameterRange::int("slow_period", 20, 30, 1),
        ];
        let mut search = GridSearch::new(&ranges, 1_000);
        let all = drain(&mut search);
        assert_eq!(all.len(), 121);
        // All distinct.
        let mut seen = all.clone();
        seen.sort_by_key(|p| format!("{p:?}"));
        seen.dedup();
        assert_eq!(seen.len(), 121);
    }

    #[test]
    fn enumeration_order_is_deterministic() {
        let ranges = vec![
            ParameterRange::int("a", 0, 4, 1),
            ParameterRange::bool("b"),
        ];
        let a = drain(&mut GridSearch::new(&ranges, 100));
        let b = drain(&mut GridSearch::new(&ranges, 100));
        assert_eq!(a, b);
    }

    #[test]
    fn oversized_grid_subsamples_evenly() {
        let ranges = vec![ParameterRange::int("a", 0, 999, 1)];
        let mut search = GridSearch::new(&ranges, 10);
        let all = drain(&mut search);
        assert_eq!(all.len(), 10);
        // Evenly spaced: indices 0, 100, 200, ...
        let ints: Vec<i64> = all
            .iter()
            .map(|p| match p["a"] {
                ParamValue::Int(i) => i,
                _ => panic!(),
            })
            .collect();
        assert_eq!(ints[0], 0);
        assert_eq!(ints[1], 100);
        assert_eq!(ints[9], 900);
    }

    #[test]
    fn mixed_dtypes_enumerate() {
        let ranges = vec![
            ParameterRange::bool("flag"),
            ParameterRange::choice("mode", vec!["x".to_string(), "y".to_string()]),
            ParameterRange::float("threshold", 0.1, 0.3, 0.1),
        ];
        let all = drain(&mut GridSearch::new(&ranges, 100));
        assert_eq!(all.len(), 2 * 2 * 3);
    }
}
