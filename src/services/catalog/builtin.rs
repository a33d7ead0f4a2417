use std::collections::HashMap;

use crate::{
    error::AppResult,
    models::{CatalogEntry, CatalogKind, CharacterRole},
    services::catalog::CatalogStore,
};

/// In-memory catalog; entries keep their insertion order per kind
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    entries: HashMap<CatalogKind, Vec<CatalogEntry>>,
}

impl StaticCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in themes, moral lessons and starter characters. No universes.
    pub fn builtin() -> Self {
        Self::empty()
            .with_entries(CatalogKind::Theme, builtin_themes())
            .with_entries(CatalogKind::MoralLesson, builtin_moral_lessons())
            .with_entries(CatalogKind::Character, builtin_characters())
    }

    /// Replaces every entry of `kind`
    pub fn with_entries(mut self, kind: CatalogKind, entries: Vec<CatalogEntry>) -> Self {
        self.entries.insert(kind, entries);
        self
    }

    pub fn entries(&self, kind: CatalogKind) -> &[CatalogEntry] {
        self.entries.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[async_trait::async_trait]
impl CatalogStore for StaticCatalog {
    async fn fetch_all(&self, kind: CatalogKind) -> AppResult<Vec<CatalogEntry>> {
        Ok(self.entries(kind).to_vec())
    }

    fn name(&self) -> &'static str {
        "builtin"
    }
}

pub fn builtin_themes() -> Vec<CatalogEntry> {
    [
        (
            "adventure_quest",
            "Adventure Quest",
            "Characters seek an important object or person",
        ),
        (
            "friendship_tale",
            "Friendship Tale",
            "Story about building relationships and teamwork",
        ),
        (
            "overcoming_fears",
            "Overcoming Fears",
            "Characters help each other face their anxieties",
        ),
        (
            "learning_skills",
            "Learning New Skills",
            "Characters teach each other abilities from their universes",
        ),
        (
            "helping_others",
            "Helping Others",
            "Focus on community service and assistance",
        ),
        (
            "mystery_solving",
            "Mystery Solving",
            "Characters work together to solve a puzzle or mystery",
        ),
    ]
    .into_iter()
    .map(|(id, name, description)| {
        CatalogEntry::new(CatalogKind::Theme, id, name).with_description(description)
    })
    .collect()
}

pub fn builtin_moral_lessons() -> Vec<CatalogEntry> {
    [
        (
            "friendship_teamwork",
            "Friendship & Teamwork",
            "Working together achieves more than working alone",
        ),
        (
            "courage_bravery",
            "Courage & Bravery",
            "Standing up for what's right even when it's difficult",
        ),
        (
            "honesty_truth",
            "Honesty & Truth",
            "The importance of being truthful",
        ),
        (
            "kindness_compassion",
            "Kindness & Compassion",
            "Helping others without expecting rewards",
        ),
        (
            "perseverance",
            "Perseverance",
            "Continuing to try despite difficulties",
        ),
        (
            "respect_differences",
            "Respect for Differences",
            "Appreciating unique qualities in others",
        ),
        (
            "responsibility",
            "Responsibility",
            "Taking care of duties and obligations",
        ),
    ]
    .into_iter()
    .map(|(id, name, description)| {
        CatalogEntry::new(CatalogKind::MoralLesson, id, name).with_description(description)
    })
    .collect()
}

pub fn builtin_characters() -> Vec<CatalogEntry> {
    use crate::models::CharacterRole::*;

    let roster: [(&str, [(&str, &str, CharacterRole, f64); 5]); 6] = [
        (
            "dragon-ball",
            [
                ("goku", "Goku", Hero, 100.0),
                ("vegeta", "Vegeta", Rival, 90.0),
                ("piccolo", "Piccolo", Mentor, 80.0),
                ("gohan", "Gohan", Hero, 85.0),
                ("krillin", "Krillin", Sidekick, 70.0),
            ],
        ),
        (
            "ninja-turtles",
            [
                ("leonardo", "Leonardo", Hero, 95.0),
                ("raphael", "Raphael", Hero, 90.0),
                ("michelangelo", "Michelangelo", Hero, 85.0),
                ("donatello", "Donatello", Hero, 80.0),
                ("splinter", "Splinter", Mentor, 75.0),
            ],
        ),
        (
            "toy-story",
            [
                ("woody", "Woody", Hero, 95.0),
                ("buzz", "Buzz Lightyear", Hero, 90.0),
                ("jessie", "Jessie", Hero, 80.0),
                ("rex", "Rex", Sidekick, 75.0),
                ("hamm", "Hamm", Sidekick, 70.0),
            ],
        ),
        (
            "futurama",
            [
                ("fry", "Philip J. Fry", Hero, 90.0),
                ("leela", "Turanga Leela", Hero, 85.0),
                ("bender", "Bender", Sidekick, 95.0),
                ("professor", "Professor Farnsworth", Mentor, 80.0),
                ("zoidberg", "Dr. Zoidberg", Sidekick, 75.0),
            ],
        ),
        (
            "lion-king",
            [
                ("simba", "Simba", Hero, 95.0),
                ("mufasa", "Mufasa", Mentor, 90.0),
                ("timon", "Timon", Sidekick, 85.0),
                ("pumbaa", "Pumbaa", Sidekick, 80.0),
                ("nala", "Nala", Hero, 75.0),
            ],
        ),
        (
            "monsters-inc",
            [
                ("sulley", "James P. Sullivan", Hero, 90.0),
                ("mike", "Mike Wazowski", Sidekick, 85.0),
                ("boo", "Boo", Sidekick, 80.0),
                ("randall", "Randall Boggs", Rival, 75.0),
                ("waternoose", "Henry J. Waternoose", Rival, 70.0),
            ],
        ),
    ];

    roster
        .into_iter()
        .flat_map(|(universe_id, characters)| {
            characters.into_iter().map(move |(id, name, role, popularity)| {
                CatalogEntry::new(CatalogKind::Character, id, name)
                    .with_popularity(popularity)
                    .in_universe(universe_id, role)
            })
        })
        .collect()
}
