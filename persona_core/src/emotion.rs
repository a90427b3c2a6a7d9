//! Emotion profile aggregation.

use crate::model::{EmotionVector, Reaction, EMOTIONS};
use std::collections::BTreeMap;

/// Mean intensity per Plutchik emotion, keyed by emotion name.
///
/// Empty when no reaction carried an emotion vector.
pub type EmotionProfile = BTreeMap<String, f64>;

/// Averages emotion vectors across reactions.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmotionAggregator;

impl EmotionAggregator {
    /// Averages every component over the reactions that carry a vector.
    ///
    /// Reactions without a vector are skipped, not counted as zeros.
    pub fn aggregate<'a, I>(&self, reactions: I) -> EmotionProfile
    where
        I: IntoIterator<Item = &'a Reaction>,
    {
        let vectors: Vec<EmotionVector> = reactions
            .into_iter()
            .filter_map(|r| r.emotion_vector)
            .collect();
        if vectors.is_empty() {
            return EmotionProfile::new();
        }

        let mut totals = [0.0f64; 8];
        for vector in &vectors {
            for (total, value) in totals.iter_mut().zip(vector.components()) {
                *total += value;
            }
        }
        let n = vectors.len() as f64;
        EMOTIONS
            .iter()
            .zip(totals)
            .map(|(name, total)| (name.to_string(), total / n))
            .collect()
    }
}

/// Emotions sorted by intensity, strongest first.
pub fn strongest(profile: &EmotionProfile, k: usize) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = profile.iter().map(|(k, v)| (k.clone(), *v)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn with_vector(id: &str, v: EmotionVector) -> Reaction {
        Reaction::new(id, 0.0, 0.0).with_emotions(v)
    }

    #[test]
    fn test_empty_input_yields_empty_profile() {
        let reactions: Vec<Reaction> = Vec::new();
        assert!(EmotionAggregator.aggregate(&reactions).is_empty());

        let no_vectors = vec![Reaction::new("a", 1.0, 1.0)];
        assert!(EmotionAggregator.aggregate(&no_vectors).is_empty());
    }

    #[test]
    fn test_single_reaction_returns_its_own_vector() {
        let v = EmotionVector::from_components([0.2, 0.7, 0.1, 0.3, 0.0, 0.1, 0.0, 0.6]);
        let profile = EmotionAggregator.aggregate(&[with_vector("a", v)]);

        assert_eq!(profile.len(), 8);
        for (name, value) in EMOTIONS.iter().zip(v.components()) {
            assert_eq!(profile[*name], value);
        }
    }

    #[test]
    fn test_absent_vectors_do_not_bias_mean() {
        let reactions = vec![
            with_vector("a", EmotionVector { joy: 1.0, ..Default::default() }),
            Reaction::new("b", 0.0, 0.0),
            with_vector("c", EmotionVector { joy: 0.5, ..Default::default() }),
        ];
        let profile = EmotionAggregator.aggregate(&reactions);
        assert_relative_eq!(profile["joy"], 0.75);
        assert_relative_eq!(profile["anger"], 0.0);
    }

    #[test]
    fn test_strongest_orders_by_intensity() {
        let v = EmotionVector { trust: 0.9, fear: 0.4, ..Default::default() };
        let profile = EmotionAggregator.aggregate(&[with_vector("a", v)]);
        let top = strongest(&profile, 2);
        assert_eq!(top[0].0, "trust");
        assert_eq!(top[1].0, "fear");
    }
}
