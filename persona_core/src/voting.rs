//! Popularity vote across message variants with a bootstrap interval.

use crate::config::VotingConfig;
use crate::model::Persona;
use crate::prompts;
use crate::schema;
use crate::stats;
use persona_env::{CallKind, GenerativeOracle, OracleRequest, RandomSource};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Votes received by one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantTally {
    /// `variant_<index>`
    pub label: String,
    pub index: usize,
    pub text: String,
    pub votes: usize,
}

/// The variant a sub-population preferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencePattern {
    pub bucket: String,
    pub preferred_variant: usize,
    /// Votes for the preferred variant within the bucket
    pub supporters: usize,
    pub voters: usize,
}

/// Outcome of a popularity vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VotingMetrics {
    pub win_rate: f64,
    /// (lower, upper) bootstrap percentile band around the win rate
    pub confidence_interval: (f64, f64),
    pub vote_distribution: Vec<VariantTally>,
    pub preference_patterns: Vec<PreferencePattern>,
    /// Votes that defaulted to variant 0 after a failed or invalid reply
    pub defaulted_votes: usize,
}

impl VotingMetrics {
    pub fn total_votes(&self) -> usize {
        self.vote_distribution.iter().map(|t| t.votes).sum()
    }

    /// Highest-voted variant, lowest index on ties.
    pub fn winner(&self) -> Option<&VariantTally> {
        self.vote_distribution
            .iter()
            .fold(None, |best: Option<&VariantTally>, t| match best {
                Some(b) if b.votes >= t.votes => Some(b),
                _ => Some(t),
            })
    }
}

/// Collects one vote per persona and summarizes them.
pub struct PopularityVotingSimulator {
    oracle: Arc<dyn GenerativeOracle>,
    config: VotingConfig,
}

impl PopularityVotingSimulator {
    pub fn new(oracle: Arc<dyn GenerativeOracle>, config: VotingConfig) -> Self {
        Self { oracle, config }
    }

    /// Expands fewer than two variants into original, softened and urgent forms.
    pub fn expand_variants(&self, variants: &[String]) -> Vec<String> {
        match variants {
            [] => Vec::new(),
            [only] => derive_variants(only, &self.config.urgency_suffix),
            many => many.to_vec(),
        }
    }

    /// Runs the vote.
    ///
    /// Every persona casts exactly one vote. Transport failures and invalid
    /// replies count as a vote for variant 0.
    pub async fn run(
        &self,
        variants: &[String],
        personas: &[Persona],
        rng: &mut dyn RandomSource,
    ) -> VotingMetrics {
        let variants = self.expand_variants(variants);
        let mut outcomes: Vec<usize> = Vec::with_capacity(personas.len());
        let mut defaulted_votes = 0;

        if !variants.is_empty() {
            for persona in personas {
                let request = OracleRequest::new(CallKind::Vote, prompts::vote_prompt(&variants))
                    .with_system(persona.system_prompt.clone());
                let vote = match self.oracle.complete(request).await {
                    Ok(text) => schema::parse_vote(&text, variants.len()).map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };
                let index = vote.unwrap_or_else(|reason| {
                    warn!("Vote from {} defaulted to 0: {}", persona.id, reason);
                    defaulted_votes += 1;
                    0
                });
                outcomes.push(index);
            }
        }

        let mut metrics = tally(&variants, &outcomes, personas, rng, &self.config);
        metrics.defaulted_votes = defaulted_votes;
        debug!("Vote: {} ballots, win rate {:.3}", outcomes.len(), metrics.win_rate);
        metrics
    }
}

/// Original, softened (`!` becomes `.`) and urgent (`suffix` appended) forms.
pub fn derive_variants(message: &str, suffix: &str) -> Vec<String> {
    vec![message.to_string(), message.replace('!', "."), format!("{}{}", message, suffix)]
}

/// Summarizes per-voter outcomes; `outcomes[i]` is the vote of `personas[i]`.
pub fn tally(
    variants: &[String],
    outcomes: &[usize],
    personas: &[Persona],
    rng: &mut dyn RandomSource,
    config: &VotingConfig,
) -> VotingMetrics {
    let counts = bincount(outcomes, variants.len());
    let vote_distribution = variants
        .iter()
        .enumerate()
        .map(|(index, text)| VariantTally {
            label: format!("variant_{}", index),
            index,
            text: text.clone(),
            votes: counts.get(index).copied().unwrap_or(0),
        })
        .collect();

    let total = outcomes.len();
    if total == 0 {
        return VotingMetrics {
            win_rate: 0.0,
            confidence_interval: (0.0, 0.0),
            vote_distribution,
            preference_patterns: Vec::new(),
            defaulted_votes: 0,
        };
    }

    let max_votes = counts.iter().copied().max().unwrap_or(0);
    VotingMetrics {
        win_rate: max_votes as f64 / total as f64,
        confidence_interval: bootstrap_interval(outcomes, variants.len(), rng, config),
        vote_distribution,
        preference_patterns: preference_patterns(outcomes, personas, variants.len()),
        defaulted_votes: 0,
    }
}

fn bincount(outcomes: &[usize], bins: usize) -> Vec<usize> {
    let mut counts = vec![0usize; bins];
    for &vote in outcomes {
        if let Some(slot) = counts.get_mut(vote) {
            *slot += 1;
        }
    }
    counts
}

/// Percentile band of the winning-count fraction over bootstrap resamples.
///
/// Each resample draws `outcomes.len()` votes with replacement from the
/// per-voter outcomes.
pub fn bootstrap_interval(
    outcomes: &[usize],
    bins: usize,
    rng: &mut dyn RandomSource,
    config: &VotingConfig,
) -> (f64, f64) {
    let total = outcomes.len();
    if total == 0 || config.bootstrap_samples == 0 {
        return (0.0, 0.0);
    }

    let mut rates = Vec::with_capacity(config.bootstrap_samples);
    let mut counts = vec![0usize; bins.max(1)];
    for _ in 0..config.bootstrap_samples {
        counts.iter_mut().for_each(|c| *c = 0);
        for _ in 0..total {
            let vote = outcomes[rng.index(total)];
            if let Some(slot) = counts.get_mut(vote) {
                *slot += 1;
            }
        }
        let winner = counts.iter().copied().max().unwrap_or(0);
        rates.push(winner as f64 / total as f64);
    }

    let lower = stats::percentile(&rates, config.lower_percentile).unwrap_or(0.0);
    let upper = stats::percentile(&rates, config.upper_percentile).unwrap_or(0.0);
    (lower, upper)
}

/// Majority variant per age group, in first-seen bucket order.
///
/// Ties resolve to the lowest variant index.
pub fn preference_patterns(outcomes: &[usize], personas: &[Persona], bins: usize) -> Vec<PreferencePattern> {
    let mut buckets: Vec<(&str, Vec<usize>)> = Vec::new();
    for (persona, &vote) in personas.iter().zip(outcomes) {
        let bucket = persona.age_group.as_str();
        match buckets.iter_mut().find(|(b, _)| *b == bucket) {
            Some((_, votes)) => votes.push(vote),
            None => buckets.push((bucket, vec![vote])),
        }
    }

    buckets
        .into_iter()
        .map(|(bucket, votes)| {
            let counts = bincount(&votes, bins);
            let (preferred_variant, supporters) = counts
                .iter()
                .copied()
                .enumerate()
                .fold((0, 0), |best, (i, n)| if n > best.1 { (i, n) } else { best });
            PreferencePattern {
                bucket: bucket.to_string(),
                preferred_variant,
                supporters,
                voters: votes.len(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FnOracle, SeededSource};
    use approx::assert_relative_eq;

    fn voters(n: usize) -> Vec<Persona> {
        (0..n)
            .map(|i| {
                let group = if i % 2 == 0 { "Gen Z (18-27)" } else { "Boomers (58+)" };
                Persona::new(format!("v{}", i), format!("Voter {}", i)).with_age_group(group)
            })
            .collect()
    }

    fn variants(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Message {}", i)).collect()
    }

    #[test]
    fn test_seven_three_split() {
        let outcomes = [0, 0, 0, 0, 0, 0, 0, 1, 1, 1];
        let metrics = tally(
            &variants(2),
            &outcomes,
            &voters(10),
            &mut SeededSource::new(1),
            &VotingConfig::default(),
        );

        assert_eq!(metrics.vote_distribution[0].label, "variant_0");
        assert_eq!(metrics.vote_distribution[0].votes, 7);
        assert_eq!(metrics.vote_distribution[1].votes, 3);
        assert_eq!(metrics.total_votes(), 10);
        assert_relative_eq!(metrics.win_rate, 0.7);
        let (lo, hi) = metrics.confidence_interval;
        assert!(lo <= 0.7 && 0.7 <= hi, "interval ({}, {})", lo, hi);
        assert!(hi <= 1.0);
    }

    #[test]
    fn test_no_voters() {
        let metrics = tally(&variants(3), &[], &[], &mut SeededSource::new(1), &VotingConfig::default());
        assert_eq!(metrics.win_rate, 0.0);
        assert_eq!(metrics.confidence_interval, (0.0, 0.0));
        assert_eq!(metrics.total_votes(), 0);
        assert!(metrics.preference_patterns.is_empty());
    }

    #[test]
    fn test_interval_brackets_win_rate_on_large_samples() {
        let config = VotingConfig::default();
        for seed in 0..5u64 {
            let outcomes: Vec<usize> = (0..400).map(|i| if i % 5 < 3 { 0 } else { (i % 2) + 1 }).collect();
            let metrics = tally(&variants(3), &outcomes, &voters(400), &mut SeededSource::new(seed), &config);
            let (lo, hi) = metrics.confidence_interval;
            assert!(lo <= metrics.win_rate && metrics.win_rate <= hi);
            assert!(hi - lo < 0.2);
        }
    }

    #[test]
    fn test_preference_tie_resolves_to_lowest_index() {
        let people = voters(4);
        // Gen Z: votes 2, 1 (tie) -> 1; Boomers: 2, 2 -> 2
        let patterns = preference_patterns(&[2, 2, 1, 2], &people, 3);
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0].bucket, "Gen Z (18-27)");
        assert_eq!(patterns[0].preferred_variant, 1);
        assert_eq!(patterns[0].supporters, 1);
        assert_eq!(patterns[1].preferred_variant, 2);
        assert_eq!(patterns[1].voters, 2);
    }

    #[test]
    fn test_single_message_expands_to_three_variants() {
        let sim = PopularityVotingSimulator::new(Arc::new(FnOracle::failing()), VotingConfig::default());
        let expanded = sim.expand_variants(&["Save big!".to_string()]);
        assert_eq!(expanded, vec!["Save big!", "Save big.", "Save big! Limited time offer!"]);
        assert_eq!(sim.expand_variants(&[]), Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_invalid_replies_default_to_first_variant() {
        let oracle = Arc::new(FnOracle::new(|_, n| match n {
            0 => Ok("1".to_string()),
            1 => Ok("```json\n{\"vote\": 2}\n```".to_string()),
            2 => Ok("7".to_string()),
            3 => Ok("the second one".to_string()),
            _ => Err(persona_env::OracleError::Quota("rate limited".into())),
        }));
        let sim = PopularityVotingSimulator::new(oracle, VotingConfig::default());

        let metrics = sim.run(&variants(3), &voters(5), &mut SeededSource::new(3)).await;

        let votes: Vec<usize> = metrics.vote_distribution.iter().map(|t| t.votes).collect();
        assert_eq!(votes, vec![3, 1, 1]);
        assert_eq!(metrics.defaulted_votes, 3);
        assert_relative_eq!(metrics.win_rate, 0.6);
        assert_eq!(metrics.winner().map(|t| t.index), Some(0));
    }
}
