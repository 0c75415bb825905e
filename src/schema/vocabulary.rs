//! Usable entity identifiers for the current level.

use serde::{Deserialize, Serialize};

use super::ParamValue;
use crate::game::VocabularyProvider;

/// Ordered, duplicate-free, non-empty list of entity identifiers that
/// mutation may place into rules. Fixed for one run on one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    sprites: Vec<String>,
}

/// Vocabulary construction errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VocabularyError {
    #[error("Vocabulary must contain at least one usable sprite")]
    Empty,
    #[error("Sprite identifier '{0}' cannot appear in rule text")]
    InvalidIdentifier(String),
}

impl Vocabulary {
    /// Build from identifiers, dropping empty strings and repeats but keeping
    /// first-seen order.
    ///
    /// Every identifier must read back as a sprite when placed in a rule:
    /// no whitespace, `=` or `>`, and not a number or `True`/`False`.
    pub fn new<I, S>(sprites: I) -> Result<Self, VocabularyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for sprite in sprites {
            let sprite = sprite.into();
            if sprite.is_empty() || unique.contains(&sprite) {
                continue;
            }
            if !is_valid_identifier(&sprite) {
                return Err(VocabularyError::InvalidIdentifier(sprite));
            }
            unique.push(sprite);
        }
        if unique.is_empty() {
            return Err(VocabularyError::Empty);
        }
        Ok(Self { sprites: unique })
    }

    /// Query the level analyzer collaborator.
    pub fn from_provider(provider: &dyn VocabularyProvider) -> Result<Self, VocabularyError> {
        Self::new(provider.usable_sprites())
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    /// Always false; kept for the `len`/`is_empty` pair.
    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn get(&self, index: usize) -> &str {
        &self.sprites[index]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.sprites
    }
}

fn is_valid_identifier(sprite: &str) -> bool {
    !sprite.contains(|c: char| c.is_whitespace() || c == '=' || c == '>')
        && matches!(ParamValue::parse(sprite), ParamValue::Sprite(_))
}

impl TryFrom<Vec<String>> for Vocabulary {
    type Error = VocabularyError;

    fn try_from(sprites: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(sprites)
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocabulary: Vocabulary) -> Self {
        vocabulary.sprites
    }
}
