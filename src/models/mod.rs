use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use crate::error::AppError;

pub mod activity;
pub mod catalog;

pub use activity::{ActivityRecord, FrequencyTable};
pub use catalog::{
    CandidateFilter, CatalogEntry, CharacterDocument, CharacterListResponse, UniverseDocument,
    UniverseRef,
};

/// Audience band a catalog entry is rated for, or the "all" wildcard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "3-5")]
    Preschool,
    #[serde(rename = "6-8")]
    EarlyReader,
    #[serde(rename = "9-12")]
    MiddleGrade,
    #[default]
    #[serde(rename = "all")]
    All,
}

impl AgeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Preschool => "3-5",
            AgeGroup::EarlyReader => "6-8",
            AgeGroup::MiddleGrade => "9-12",
            AgeGroup::All => "all",
        }
    }

    /// Whether an entry rated `rating` may be shown to this audience
    pub fn admits(&self, rating: AgeGroup) -> bool {
        *self == AgeGroup::All || rating == AgeGroup::All || rating == *self
    }
}

impl Display for AgeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgeGroup {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "3-5" => Ok(AgeGroup::Preschool),
            "6-8" => Ok(AgeGroup::EarlyReader),
            "9-12" => Ok(AgeGroup::MiddleGrade),
            "all" => Ok(AgeGroup::All),
            other => Err(AppError::InvalidRequest(format!(
                "Unknown age group '{}', expected one of 3-5, 6-8, 9-12, all",
                other
            ))),
        }
    }
}

/// The four entity kinds the catalog can serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Universe,
    Character,
    Theme,
    MoralLesson,
}

impl Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogKind::Universe => write!(f, "universe"),
            CatalogKind::Character => write!(f, "character"),
            CatalogKind::Theme => write!(f, "theme"),
            CatalogKind::MoralLesson => write!(f, "moral_lesson"),
        }
    }
}

/// Narrative role a character plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterRole {
    Hero,
    Sidekick,
    Mentor,
    Rival,
    Custom,
}

impl CharacterRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CharacterRole::Hero => "hero",
            CharacterRole::Sidekick => "sidekick",
            CharacterRole::Mentor => "mentor",
            CharacterRole::Rival => "rival",
            CharacterRole::Custom => "custom",
        }
    }
}

impl Display for CharacterRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CharacterRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hero" => Ok(CharacterRole::Hero),
            "sidekick" => Ok(CharacterRole::Sidekick),
            "mentor" => Ok(CharacterRole::Mentor),
            "rival" => Ok(CharacterRole::Rival),
            "custom" => Ok(CharacterRole::Custom),
            other => Err(AppError::InvalidRequest(format!("Unknown character role '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_group_parse_and_display() {
        for raw in ["3-5", "6-8", "9-12", "all"] {
            let group: AgeGroup = raw.parse().unwrap();
            assert_eq!(group.to_string(), raw);
        }
    }

    #[test]
    fn test_age_group_rejects_unknown_band() {
        let err = "13-17".parse::<AgeGroup>().unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[test]
    fn test_age_group_admits() {
        assert!(AgeGroup::Preschool.admits(AgeGroup::Preschool));
        assert!(AgeGroup::Preschool.admits(AgeGroup::All));
        assert!(!AgeGroup::Preschool.admits(AgeGroup::MiddleGrade));
        assert!(AgeGroup::All.admits(AgeGroup::MiddleGrade));
    }

    #[test]
    fn test_age_group_serde_uses_band_labels() {
        let json = serde_json::to_string(&AgeGroup::EarlyReader).unwrap();
        assert_eq!(json, "\"6-8\"");
        let parsed: AgeGroup = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(parsed, AgeGroup::All);
    }

    #[test]
    fn test_character_role_parse() {
        assert_eq!("mentor".parse::<CharacterRole>().unwrap(), CharacterRole::Mentor);
        assert!("villain".parse::<CharacterRole>().is_err());
    }
}
