//! Controversy rate, drivers and risk groups.

use crate::model::{Persona, Reaction};
use crate::stats;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum number of drivers and risk groups reported.
pub const CONTROVERSY_TOP_K: usize = 3;

/// An (age band, ethnicity) pair that produced controversial reactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskGroup {
    pub age_band: String,
    pub ethnicity: String,
}

impl std::fmt::Display for RiskGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.age_band, self.ethnicity)
    }
}

/// Result of the controversy analysis.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ControversyAnalysis {
    /// controversial / total, 0 when nothing is controversial
    pub controversy_rate: f64,
    /// Most frequent drivers, first-seen tie-break
    pub main_drivers: Vec<String>,
    /// Unique groups among controversial reactions, first-seen order
    pub risk_groups: Vec<RiskGroup>,
}

/// Computes controversy statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControversyAnalyzer;

impl ControversyAnalyzer {
    /// Analyzes `reactions`, resolving risk groups through `personas`.
    ///
    /// Reactions whose persona is missing from the index still count toward
    /// the rate and drivers but contribute no risk group.
    pub fn analyze(
        &self,
        reactions: &[Reaction],
        personas: &HashMap<&str, &Persona>,
    ) -> ControversyAnalysis {
        let controversial: Vec<&Reaction> = reactions.iter().filter(|r| r.controversy_flag).collect();
        if controversial.is_empty() {
            return ControversyAnalysis::default();
        }

        let controversy_rate = controversial.len() as f64 / reactions.len() as f64;
        let main_drivers = stats::top_k(
            controversial.iter().filter_map(|r| r.controversy_driver.as_deref()),
            CONTROVERSY_TOP_K,
        );

        let mut risk_groups: Vec<RiskGroup> = Vec::new();
        for reaction in &controversial {
            if risk_groups.len() == CONTROVERSY_TOP_K {
                break;
            }
            let Some(persona) = personas.get(reaction.persona_id.as_str()) else {
                continue;
            };
            let group = RiskGroup {
                age_band: persona.demographic.age_band.clone(),
                ethnicity: persona.demographic.ethnicity_omb.clone(),
            };
            if !risk_groups.contains(&group) {
                risk_groups.push(group);
            }
        }

        ControversyAnalysis {
            controversy_rate,
            main_drivers,
            risk_groups,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::index_personas;

    fn personas() -> Vec<Persona> {
        vec![
            Persona::new("p1", "Ana").with_demographics("23-27", "Hispanic or Latino"),
            Persona::new("p2", "Ben").with_demographics("23-27", "Hispanic or Latino"),
            Persona::new("p3", "Cai").with_demographics("58-62", "Asian"),
            Persona::new("p4", "Dee").with_demographics("33-37", "White"),
            Persona::new("p5", "Eli").with_demographics("43-47", "Black or African American"),
        ]
    }

    #[test]
    fn test_no_controversy_is_zero_with_empty_lists() {
        let people = personas();
        let index = index_personas(&people);
        let reactions = vec![Reaction::new("p1", 2.0, 40.0)];
        let analysis = ControversyAnalyzer.analyze(&reactions, &index);
        assert_eq!(analysis, ControversyAnalysis::default());

        let empty = ControversyAnalyzer.analyze(&[], &index);
        assert_eq!(empty.controversy_rate, 0.0);
    }

    #[test]
    fn test_rate_drivers_and_deduplicated_groups() {
        let people = personas();
        let index = index_personas(&people);
        let reactions = vec![
            Reaction::new("p1", -3.0, 70.0).controversial(Some("pricing")),
            Reaction::new("p2", -2.0, 60.0).controversial(Some("tone")),
            Reaction::new("p3", -1.0, 20.0).controversial(Some("tone")),
            Reaction::new("p4", 1.0, 10.0),
            Reaction::new("p5", -4.0, 90.0).controversial(None),
        ];
        let analysis = ControversyAnalyzer.analyze(&reactions, &index);

        assert_eq!(analysis.controversy_rate, 0.8);
        assert_eq!(analysis.main_drivers, vec!["tone", "pricing"]);
        // p1 and p2 share a group; order is first-seen
        assert_eq!(analysis.risk_groups.len(), 3);
        assert_eq!(analysis.risk_groups[0].to_string(), "23-27 Hispanic or Latino");
        assert_eq!(analysis.risk_groups[1].age_band, "58-62");
        assert_eq!(analysis.risk_groups[2].age_band, "43-47");
    }
}
