use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two-valued partition that scopes nearly every query and uniqueness rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PetCategory {
    #[default]
    Dog,
    Cat,
}

impl PetCategory {
    /// Stable key used in the store and in URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            PetCategory::Dog => "dog",
            PetCategory::Cat => "cat",
        }
    }

    /// Label prepended to marketplace queries.
    pub fn search_label(&self) -> &'static str {
        match self {
            PetCategory::Dog => "강아지",
            PetCategory::Cat => "고양이",
        }
    }
}

impl fmt::Display for PetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown pet category '{0}'")]
pub struct UnknownPetCategory(pub String);

impl FromStr for PetCategory {
    type Err = UnknownPetCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "dog" | "강아지" => Ok(PetCategory::Dog),
            "cat" | "고양이" => Ok(PetCategory::Cat),
            other => Err(UnknownPetCategory(other.to_string())),
        }
    }
}

/// Active-category context handed to every pipeline and lifecycle operation.
/// Replace it (don't mutate shared state) when the user switches category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PetContext {
    pub pet: PetCategory,
}

impl PetContext {
    pub fn new(pet: PetCategory) -> Self {
        Self { pet }
    }
}

/// One profile per category: ordered keywords describing the pet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetKeywordProfile {
    pub pet: PetCategory,
    pub keywords: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl PetKeywordProfile {
    pub fn new(pet: PetCategory, keywords: Vec<String>) -> Self {
        Self {
            pet,
            keywords,
            updated_at: Utc::now(),
        }
    }

    pub fn empty(pet: PetCategory) -> Self {
        Self::new(pet, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_key_and_label() {
        assert_eq!("dog".parse::<PetCategory>(), Ok(PetCategory::Dog));
        assert_eq!("고양이".parse::<PetCategory>(), Ok(PetCategory::Cat));
        assert!("hamster".parse::<PetCategory>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case_key() {
        let json = serde_json::to_string(&PetCategory::Cat).unwrap();
        assert_eq!(json, "\"cat\"");
    }
}
