//! Genetic search — tournament selection, uniform crossover, bounded
//! mutation, elitism, early stopping on stale generations.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use quantlab_core::rng::SeedHierarchy;

use super::{ParamSet, ParameterRange, SearchMethod};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneticConfig {
    pub population_size: usize,
    /// Fraction of each generation carried over unchanged.
    pub elite_fraction: f64,
    /// Per-gene probability of resampling within bounds.
    pub mutation_rate: f64,
    pub tournament_size: usize,
    pub max_generations: usize,
    /// Stop after this many generations without improving the best score.
    pub early_stopping_patience: usize,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 30,
            elite_fraction: 0.1,
            mutation_rate: 0.1,
            tournament_size: 3,
            max_generations: 20,
            early_stopping_patience: 5,
        }
    }
}

/// Evolves a population of parameter sets. Candidates are handed out a
/// batch at a time; once the whole generation is scored, the next one is
/// bred. Failed evaluations score negative infinity and breed out naturally.
pub struct GeneticSearch {
    ranges: Vec<ParameterRange>,
    config: GeneticConfig,
    rng: StdRng,
    budget: usize,
    proposed_total: usize,

    /// Individuals of the current generation not yet proposed.
    queue: Vec<ParamSet>,
    /// Proposed but not yet ingested.
    awaiting: usize,
    scored: Vec<(ParamSet, f64)>,
    generation: usize,
    best_score: Option<f64>,
    stale_generations: usize,
    done: bool,
}

impl GeneticSearch {
    pub fn new(
        ranges: &[ParameterRange],
        config: GeneticConfig,
        max_evaluations: usize,
        seed: u64,
    ) -> Self {
        let mut search = Self {
            ranges: ranges.to_vec(),
            config,
            rng: SeedHierarchy::new(seed).rng_for("genetic_search", 0),
            budget: max_evaluations,
            proposed_total: 0,
            queue: Vec::new(),
            awaiting: 0,
            scored: Vec::new(),
            generation: 0,
            best_score: None,
            stale_generations: 0,
            done: max_evaluations == 0 || ranges.is_empty(),
        };
        if !search.done {
            search.queue = search.random_population();
        }
        search
    }

    fn random_population(&mut self) -> Vec<ParamSet> {
        (0..self.config.population_size)
            .map(|_| {
                let mut params = ParamSet::new();
                for range in &self.ranges {
                    params.insert(range.name.clone(), range.sample(&mut self.rng));
                }
                params
            })
            .collect()
    }

    fn tournament_pick(&mut self) -> ParamSet {
        let k = self.config.tournament_size.max(1);
        let mut best: Option<&(ParamSet, f64)> = None;
        for _ in 0..k {
            let contender = &self.scored[self.rng.gen_range(0..self.scored.len())];
            if best.map(|b| contender.1 > b.1).unwrap_or(true) {
                best = Some(contender);
            }
        }
        best.expect("tournament over nonempty population").0.clone()
    }

    fn crossover(&mut self, a: &ParamSet, b: &ParamSet) -> ParamSet {
        let mut child = ParamSet::new();
        for range in &self.ranges {
            let gene = if self.rng.gen_bool(0.5) { a } else { b };
            child.insert(range.name.clone(), gene[&range.name].clone());
        }
        child
    }

    fn mutate(&mut self, child: &mut ParamSet) {
        for i in 0..self.ranges.len() {
            if self.rng.gen_bool(self.config.mutation_rate.clamp(0.0, 1.0)) {
                let range = self.ranges[i].clone();
                let value = range.sample(&mut self.rng);
                child.insert(range.name, value);
            }
        }
    }

    /// Called once the whole generation has been ingested.
    fn finalize_generation(&mut self) {
        self.generation += 1;

        let gen_best = self
            .scored
            .iter()
            .map(|(_, s)| *s)
            .fold(f64::NEG_INFINITY, f64::max);
        let improved = self.best_score.map(|b| gen_best > b).unwrap_or(true);
        if improved && gen_best > f64::NEG_INFINITY {
            self.best_score = Some(gen_best);
            self.stale_generations = 0;
        } else {
            self.stale_generations += 1;
        }

        if self.generation >= self.config.max_generations
            || self.stale_generations >= self.config.early_stopping_patience
            || self.proposed_total >= self.budget
        {
            self.done = true;
            return;
        }

        // Breed the next generation: elites unchanged, offspring from
        // tournament parents with crossover + mutation.
        self.scored
            .sort_by(|a, b| b.1.total_cmp(&a.1));
        let elite_count = ((self.config.population_size as f64 * self.config.elite_fraction)
            .ceil() as usize)
            .min(self.scored.len());
        let mut next: Vec<ParamSet> = self.scored[..elite_count]
            .iter()
            .map(|(p, _)| p.clone())
            .collect();
        while next.len() < self.config.population_size {
            let a = self.tournament_pick();
            let b = self.tournament_pick();
            let mut child = self.crossover(&a, &b);
            self.mutate(&mut child);
            next.push(child);
        }

        self.scored.clear();
        self.queue = next;
    }
}

impl SearchMethod for GeneticSearch {
    fn propose(&mut self, n: usize) -> Vec<ParamSet> {
        if self.done {
            return Vec::new();
        }
        let take = n
            .min(self.queue.len())
            .min(self.budget.saturating_sub(self.proposed_total));
        let batch: Vec<ParamSet> = self.queue.drain(..take).collect();
        self.proposed_total += batch.len();
        self.awaiting += batch.len();
        if batch.is_empty() && self.awaiting == 0 {
            // Budget exhausted mid-generation.
            self.done = true;
        }
        batch
    }

    fn ingest(&mut self, params: &ParamSet, score: Option<f64>) {
        self.scored
            .push((params.clone(), score.unwrap_or(f64::NEG_INFINITY)));
        self.awaiting = self.awaiting.saturating_sub(1);
        if self.awaiting == 0 && self.queue.is_empty() && !self.done {
            self.finalize_generation();
        }
    }

    fn finished(&self) -> bool {
        self.done && self.awaiting == 0
    }
}
