use super::{Classifier, Dfa};
use crate::util::EquivalenceClassifier;
use std::collections::BTreeMap;

impl Dfa {
    /// Moore's algorithm: it's easier to get right.
    ///
    /// The initial partition groups states by accepting rule id (all non-final states share one
    /// class). Each pass translates every row through the current partition and splits off any
    /// state whose translated row disagrees with its class exemplar; the loop ends when a full
    /// pass splits nothing. One representative per class survives.
    pub fn minimize_states(&self) -> Dfa {
        let mut buckets: Vec<Vec<usize>> = Vec::new();
        let mut partition_id_of_state: Vec<usize> = Vec::new();

        let mut finality: BTreeMap<Option<usize>, usize> = BTreeMap::new();
        for n in 0..self.states.len() {
            let rule_id = self.finals.get(&n).copied();
            let b = *finality.entry(rule_id).or_insert_with(|| {
                buckets.push(Vec::new());
                buckets.len() - 1
            });
            partition_id_of_state.push(b);
            buckets[b].push(n);
        }

        let translate = |q: usize, partition: &[usize]| -> Vec<i32> {
            self.states[q]
                .iter()
                .map(|&x| if x < 0 { -1 } else { partition[x as usize] as i32 })
                .collect()
        };

        loop {
            let mut splitting_happened = false;
            for b in 0..buckets.len() {
                if buckets[b].len() < 2 {
                    continue;
                }
                let exemplar = translate(buckets[b][0], &partition_id_of_state);
                let (same, different): (Vec<usize>, Vec<usize>) = buckets[b]
                    .iter()
                    .copied()
                    .partition(|&q| translate(q, &partition_id_of_state) == exemplar);
                if !different.is_empty() {
                    let n = buckets.len();
                    for &q in &different {
                        partition_id_of_state[q] = n;
                    }
                    buckets[b] = same;
                    buckets.push(different);
                    splitting_happened = true;
                }
            }
            if !splitting_happened {
                break;
            }
        }

        Dfa {
            alphabet: self.alphabet.clone(),
            initial: self
                .initial
                .iter()
                .map(|(condition, &(q0, q1))| {
                    (condition.clone(), (partition_id_of_state[q0], partition_id_of_state[q1]))
                })
                .collect(),
            finals: self
                .finals
                .iter()
                .map(|(&q, &rule_id)| (partition_id_of_state[q], rule_id))
                .collect(),
            states: buckets.iter().map(|bucket| translate(bucket[0], &partition_id_of_state)).collect(),
        }
    }

    /// Classify the transition matrix's columns for equality and rebuild with a composed
    /// classifier: the original bounds paired with the per-original-class identification.
    pub fn minimize_alphabet(&self) -> Dfa {
        let bounds = match &self.alphabet {
            Classifier::Simple { bounds } => bounds.clone(),
            Classifier::Meta { .. } => panic!("alphabet minimization expects the simple classifier"),
        };
        let width = self.width();
        let mut ec: EquivalenceClassifier<Vec<i32>> = EquivalenceClassifier::new();
        let classes: Vec<usize> = (0..width)
            .map(|j| ec.classify(self.states.iter().map(|row| row[j]).collect()))
            .collect();
        let exemplars = ec.into_exemplars();
        let states = (0..self.states.len())
            .map(|i| exemplars.iter().map(|column| column[i]).collect())
            .collect();
        Dfa {
            alphabet: Classifier::Meta { bounds, classes },
            initial: self.initial.clone(),
            finals: self.finals.clone(),
            states,
        }
    }

    /// How full the transition matrix is; handy when sizing up compaction gains.
    pub fn stats(&self) -> (usize, usize, usize) {
        let occupied =
            self.states.iter().map(|row| row.iter().filter(|&&x| x != -1).count()).sum();
        (self.states.len(), self.width(), occupied)
    }
}
