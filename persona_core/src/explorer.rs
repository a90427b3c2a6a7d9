//! Read-only queries over personas and their reactions.

use crate::model::{Persona, Reaction};
use crate::stats;

/// Case-insensitive substring criteria; `None` matches everything.
#[derive(Debug, Clone, Default)]
pub struct DemographicFilter {
    pub age: Option<String>,
    pub location: Option<String>,
    pub political_leaning: Option<String>,
}

impl DemographicFilter {
    pub fn with_age(mut self, age: &str) -> Self {
        self.age = Some(age.to_string());
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub fn with_political_leaning(mut self, leaning: &str) -> Self {
        self.political_leaning = Some(leaning.to_string());
        self
    }

    pub fn matches(&self, persona: &Persona) -> bool {
        fn contains(needle: &Option<String>, haystack: &str) -> bool {
            needle
                .as_deref()
                .map_or(true, |n| haystack.to_lowercase().contains(&n.to_lowercase()))
        }
        contains(&self.age, &persona.age.to_string())
            && contains(&self.location, &persona.location)
            && contains(&self.political_leaning, &persona.political_leaning)
    }
}

/// Personas and reactions selected by a query.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub personas: Vec<&'a Persona>,
    pub reactions: Vec<&'a Reaction>,
}

impl Selection<'_> {
    pub fn mean_sentiment(&self) -> Option<f64> {
        stats::mean(self.reactions.iter().map(|r| r.sentiment))
    }

    pub fn mean_share_likelihood(&self) -> Option<f64> {
        stats::mean(self.reactions.iter().map(|r| r.share_likelihood))
    }
}

/// Borrowing view over one run's personas and reactions.
#[derive(Debug, Clone, Copy)]
pub struct Explorer<'a> {
    personas: &'a [Persona],
    reactions: &'a [Reaction],
}

impl<'a> Explorer<'a> {
    pub fn new(personas: &'a [Persona], reactions: &'a [Reaction]) -> Self {
        Self { personas, reactions }
    }

    pub fn persona(&self, id: &str) -> Option<&'a Persona> {
        self.personas.iter().find(|p| p.id == id)
    }

    /// Reactions owned by the persona with `id`.
    pub fn reactions_of(&self, id: &str) -> Vec<&'a Reaction> {
        self.reactions.iter().filter(|r| r.persona_id == id).collect()
    }

    /// Personas matching `predicate` together with their reactions.
    pub fn select<F>(&self, predicate: F) -> Selection<'a>
    where
        F: Fn(&Persona) -> bool,
    {
        let personas: Vec<&'a Persona> = self.personas.iter().filter(|p| predicate(p)).collect();
        let reactions = self
            .reactions
            .iter()
            .filter(|r| personas.iter().any(|p| p.id == r.persona_id))
            .collect();
        Selection { personas, reactions }
    }

    pub fn filter(&self, filter: &DemographicFilter) -> Selection<'a> {
        self.select(|p| filter.matches(p))
    }

    /// Reactions matching `predicate`, in input order.
    pub fn reactions_where<F>(&self, predicate: F) -> Vec<&'a Reaction>
    where
        F: Fn(&Reaction) -> bool,
    {
        self.reactions.iter().filter(|r| predicate(r)).collect()
    }
}
