use serde::{Deserialize, Serialize};

use super::{AgeGroup, CatalogKind, CharacterRole};

/// A recommendable entity as served by the catalog store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub kind: CatalogKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub age_rating: AgeGroup,
    /// Never negative
    #[serde(default)]
    pub popularity: f64,
    /// Owning universe, characters only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universe_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<CharacterRole>,
}

impl CatalogEntry {
    pub fn new(kind: CatalogKind, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            description: None,
            age_rating: AgeGroup::All,
            popularity: 0.0,
            universe_id: None,
            role: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_age_rating(mut self, age_rating: AgeGroup) -> Self {
        self.age_rating = age_rating;
        self
    }

    pub fn with_popularity(mut self, popularity: f64) -> Self {
        self.popularity = popularity.max(0.0);
        self
    }

    pub fn in_universe(mut self, universe_id: impl Into<String>, role: CharacterRole) -> Self {
        self.universe_id = Some(universe_id.into());
        self.role = Some(role);
        self
    }
}

/// Restrictions applied to a candidate pool before scoring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateFilter {
    pub age_group: AgeGroup,
    pub universe_id: Option<String>,
    pub role: Option<CharacterRole>,
}

impl CandidateFilter {
    pub fn for_age(age_group: AgeGroup) -> Self {
        Self {
            age_group,
            ..Default::default()
        }
    }

    pub fn for_universe(universe_id: impl Into<String>, role: Option<CharacterRole>) -> Self {
        Self {
            age_group: AgeGroup::All,
            universe_id: Some(universe_id.into()),
            role,
        }
    }

    /// True when nothing narrows the pool
    pub fn is_unrestricted(&self) -> bool {
        self.age_group == AgeGroup::All && self.universe_id.is_none() && self.role.is_none()
    }

    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        if !self.age_group.admits(entry.age_rating) {
            return false;
        }
        if let Some(universe_id) = &self.universe_id {
            if entry.universe_id.as_deref() != Some(universe_id.as_str()) {
                return false;
            }
        }
        match self.role {
            Some(role) => entry.role == Some(role),
            None => true,
        }
    }
}

// ============================================================================
// Upstream Service Documents
// ============================================================================

/// Universe document returned by the universe management service
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniverseDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub age_rating: Option<String>,
    #[serde(default)]
    pub popularity: f64,
}

impl TryFrom<UniverseDocument> for CatalogEntry {
    type Error = crate::error::AppError;

    fn try_from(doc: UniverseDocument) -> Result<Self, Self::Error> {
        // Universes default to "all" upstream
        let age_rating = match doc.age_rating.as_deref() {
            Some(raw) => raw.parse()?,
            None => AgeGroup::All,
        };

        let mut entry = CatalogEntry::new(CatalogKind::Universe, doc.id, doc.name)
            .with_age_rating(age_rating)
            .with_popularity(doc.popularity);
        entry.description = doc.description;
        Ok(entry)
    }
}

/// Universe reference on a character: a bare ID, or the document when the
/// service populates it
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum UniverseRef {
    Id(String),
    Populated {
        #[serde(rename = "_id")]
        id: String,
    },
}

impl UniverseRef {
    pub fn into_id(self) -> String {
        match self {
            UniverseRef::Id(id) | UniverseRef::Populated { id } => id,
        }
    }
}

/// Character document returned by the character database service
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Null when the referenced universe no longer exists
    #[serde(default)]
    pub universe: Option<UniverseRef>,
    #[serde(rename = "type")]
    pub role: String,
    #[serde(default)]
    pub popularity: f64,
}

/// `GET /api/characters` envelope: `{status, results, data: {characters}}`
#[derive(Debug, Deserialize)]
pub struct CharacterListResponse {
    pub data: CharacterListData,
}

#[derive(Debug, Deserialize)]
pub struct CharacterListData {
    /// Kept as raw values so one malformed character does not sink the list
    pub characters: Vec<serde_json::Value>,
}

impl TryFrom<CharacterDocument> for CatalogEntry {
    type Error = crate::error::AppError;

    fn try_from(doc: CharacterDocument) -> Result<Self, Self::Error> {
        let role: CharacterRole = doc.role.parse()?;
        let universe_id = doc.universe.map(UniverseRef::into_id).ok_or_else(|| {
            crate::error::AppError::InvalidRequest(format!(
                "Character '{}' has no universe",
                doc.id
            ))
        })?;
        let mut entry = CatalogEntry::new(CatalogKind::Character, doc.id, doc.name)
            .with_popularity(doc.popularity)
            .in_universe(universe_id, role);
        entry.description = doc.description;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character(id: &str, universe: &str, role: CharacterRole) -> CatalogEntry {
        CatalogEntry::new(CatalogKind::Character, id, id).in_universe(universe, role)
    }

    #[test]
    fn test_filter_age_admits_exact_band_and_all() {
        let filter = CandidateFilter::for_age(AgeGroup::Preschool);
        let exact = CatalogEntry::new(CatalogKind::Universe, "a", "A")
            .with_age_rating(AgeGroup::Preschool);
        let wildcard = CatalogEntry::new(CatalogKind::Universe, "b", "B");
        let older = CatalogEntry::new(CatalogKind::Universe, "c", "C")
            .with_age_rating(AgeGroup::MiddleGrade);

        assert!(filter.matches(&exact));
        assert!(filter.matches(&wildcard));
        assert!(!filter.matches(&older));
    }

    #[test]
    fn test_filter_universe_and_role() {
        let filter = CandidateFilter::for_universe("toy-story", Some(CharacterRole::Sidekick));
        assert!(filter.matches(&character("rex", "toy-story", CharacterRole::Sidekick)));
        assert!(!filter.matches(&character("woody", "toy-story", CharacterRole::Hero)));
        assert!(!filter.matches(&character("krillin", "dragon-ball", CharacterRole::Sidekick)));
    }

    #[test]
    fn test_unrestricted_filter() {
        assert!(CandidateFilter::default().is_unrestricted());
        assert!(!CandidateFilter::for_age(AgeGroup::EarlyReader).is_unrestricted());
    }

    #[test]
    fn test_negative_popularity_is_clamped() {
        let entry = CatalogEntry::new(CatalogKind::Universe, "x", "X").with_popularity(-4.0);
        assert_eq!(entry.popularity, 0.0);
    }

    #[test]
    fn test_universe_document_conversion() {
        let doc: UniverseDocument = serde_json::from_value(serde_json::json!({
            "_id": "64b1",
            "name": "Dragon Ball",
            "ageRating": "9-12",
            "popularity": 50,
            "primaryColor": "#ff9900"
        }))
        .unwrap();

        let entry = CatalogEntry::try_from(doc).unwrap();
        assert_eq!(entry.id, "64b1");
        assert_eq!(entry.kind, CatalogKind::Universe);
        assert_eq!(entry.age_rating, AgeGroup::MiddleGrade);
        assert_eq!(entry.popularity, 50.0);
    }

    #[test]
    fn test_universe_document_without_rating_is_all() {
        let doc: UniverseDocument =
            serde_json::from_value(serde_json::json!({"_id": "u1", "name": "Toy Story"})).unwrap();
        let entry = CatalogEntry::try_from(doc).unwrap();
        assert_eq!(entry.age_rating, AgeGroup::All);
        assert_eq!(entry.popularity, 0.0);
    }

    #[test]
    fn test_character_document_conversion() {
        let doc: CharacterDocument = serde_json::from_value(serde_json::json!({
            "_id": "c1",
            "name": "Piccolo",
            "universe": "dragon-ball",
            "type": "mentor",
            "popularity": 80
        }))
        .unwrap();

        let entry = CatalogEntry::try_from(doc).unwrap();
        assert_eq!(entry.universe_id.as_deref(), Some("dragon-ball"));
        assert_eq!(entry.role, Some(CharacterRole::Mentor));
    }

    #[test]
    fn test_character_list_envelope_with_populated_universe() {
        let response: CharacterListResponse = serde_json::from_value(serde_json::json!({
            "status": "success",
            "results": 2,
            "data": {
                "characters": [
                    {
                        "_id": "c1",
                        "name": "Goku",
                        "universe": {"_id": "u-db", "name": "Dragon Ball", "description": "Saiyans"},
                        "type": "hero",
                        "description": "Martial artist",
                        "traits": ["brave"],
                        "popularity": 100
                    },
                    {
                        "_id": "c2",
                        "name": "Krillin",
                        "universe": "u-db",
                        "type": "sidekick",
                        "description": "Best friend"
                    }
                ]
            }
        }))
        .unwrap();

        let entries: Vec<CatalogEntry> = response
            .data
            .characters
            .into_iter()
            .map(|raw| {
                let doc: CharacterDocument = serde_json::from_value(raw).unwrap();
                CatalogEntry::try_from(doc).unwrap()
            })
            .collect();
        assert_eq!(entries[0].universe_id.as_deref(), Some("u-db"));
        assert_eq!(entries[0].role, Some(CharacterRole::Hero));
        assert_eq!(entries[0].popularity, 100.0);
        assert_eq!(entries[1].universe_id.as_deref(), Some("u-db"));
    }

    #[test]
    fn test_character_with_null_universe_is_rejected() {
        let doc: CharacterDocument = serde_json::from_value(serde_json::json!({
            "_id": "c3",
            "name": "Orphan",
            "universe": null,
            "type": "hero"
        }))
        .unwrap();
        assert!(CatalogEntry::try_from(doc).is_err());
    }

    #[test]
    fn test_character_document_with_unknown_role_is_rejected() {
        let doc: CharacterDocument = serde_json::from_value(serde_json::json!({
            "_id": "c2",
            "name": "Nobody",
            "universe": "u",
            "type": "narrator"
        }))
        .unwrap();
        assert!(CatalogEntry::try_from(doc).is_err());
    }

    #[test]
    fn test_entry_serializes_camel_case_without_empty_fields() {
        let entry = CatalogEntry::new(CatalogKind::Theme, "adventure_quest", "Adventure Quest");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["ageRating"], "all");
        assert_eq!(json["kind"], "theme");
        assert!(json.get("universeId").is_none());
    }
}
