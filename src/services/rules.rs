//! Rule tables for themes and moral lessons.
//!
//! Moral lessons are chosen by lookup rather than by score:
//! the theme's lessons, narrowed to what suits the age group; the age
//! group's lessons alone when no known theme is given; the full catalog
//! when neither applies or the narrowing leaves nothing.

use crate::{
    models::{AgeGroup, CatalogEntry, FrequencyTable},
    services::scoring,
};

const THEME_MORALS: &[(&str, &[&str])] = &[
    (
        "adventure_quest",
        &["courage_bravery", "perseverance", "friendship_teamwork"],
    ),
    (
        "friendship_tale",
        &["friendship_teamwork", "respect_differences", "kindness_compassion"],
    ),
    (
        "overcoming_fears",
        &["courage_bravery", "perseverance", "friendship_teamwork"],
    ),
    (
        "learning_skills",
        &["perseverance", "responsibility", "respect_differences"],
    ),
    (
        "helping_others",
        &["kindness_compassion", "responsibility", "friendship_teamwork"],
    ),
    (
        "mystery_solving",
        &["honesty_truth", "friendship_teamwork", "responsibility"],
    ),
];

const AGE_MORALS: &[(AgeGroup, &[&str])] = &[
    (
        AgeGroup::Preschool,
        &["friendship_teamwork", "kindness_compassion", "honesty_truth"],
    ),
    (
        AgeGroup::EarlyReader,
        &[
            "friendship_teamwork",
            "kindness_compassion",
            "honesty_truth",
            "responsibility",
        ],
    ),
    (
        AgeGroup::MiddleGrade,
        &[
            "friendship_teamwork",
            "kindness_compassion",
            "honesty_truth",
            "responsibility",
            "courage_bravery",
            "perseverance",
            "respect_differences",
        ],
    ),
];

/// Moral lessons associated with a theme, `None` for unknown themes
pub fn morals_for_theme(theme: &str) -> Option<&'static [&'static str]> {
    THEME_MORALS
        .iter()
        .find(|(id, _)| *id == theme)
        .map(|(_, morals)| *morals)
}

/// Moral lessons suited to an age band; "all" has no restriction
pub fn morals_for_age(age_group: AgeGroup) -> Option<&'static [&'static str]> {
    AGE_MORALS
        .iter()
        .find(|(group, _)| *group == age_group)
        .map(|(_, morals)| *morals)
}

/// Moral IDs allowed by the theme and age tables, `None` when unrestricted
pub fn allowed_morals(theme: Option<&str>, age_group: AgeGroup) -> Option<Vec<&'static str>> {
    let from_theme = theme.and_then(morals_for_theme);
    let from_age = morals_for_age(age_group);

    let allowed: Vec<&'static str> = match (from_theme, from_age) {
        (Some(theme_ids), Some(age_ids)) => theme_ids
            .iter()
            .copied()
            .filter(|id| age_ids.contains(id))
            .collect(),
        (Some(ids), None) | (None, Some(ids)) => ids.to_vec(),
        (None, None) => return None,
    };

    Some(allowed)
}

/// Picks moral lessons from `catalog`, keeping catalog order.
///
/// Never returns an empty list for a non-empty catalog and `limit >= 1`.
pub fn select_moral_lessons(
    catalog: Vec<CatalogEntry>,
    theme: Option<&str>,
    age_group: AgeGroup,
    limit: usize,
) -> Vec<CatalogEntry> {
    let mut selected: Vec<CatalogEntry> = match allowed_morals(theme, age_group) {
        Some(allowed) => catalog
            .iter()
            .filter(|moral| allowed.contains(&moral.id.as_str()))
            .cloned()
            .collect(),
        None => catalog.clone(),
    };

    if selected.is_empty() {
        tracing::debug!(
            theme = ?theme,
            age_group = %age_group,
            "Moral filters left nothing, using the full catalog"
        );
        selected = catalog;
    }

    selected.truncate(limit);
    selected
}

/// History tier for themes: `10 × times the user picked the theme`
pub fn rank_themes(
    candidates: Vec<CatalogEntry>,
    theme_counts: &FrequencyTable,
    limit: usize,
) -> Vec<CatalogEntry> {
    scoring::rank(
        candidates,
        |theme| scoring::history_score(theme, theme_counts),
        limit,
    )
}
