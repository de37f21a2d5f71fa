//! Token <-> integer id mapping.
//!
//! Built once from the full corpus and persisted next to the predictor trained
//! on it. Ids are dense in `[0, len)` and the mapping is a bijection, checked
//! on construction, so id -> token is a plain index lookup.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use thiserror::Error;

use crate::token::Token;

#[derive(Error, Debug)]
pub enum VocabError {
    #[error("Token {0} is not in the vocabulary")]
    UnseenToken(Token),
    #[error("Id {id} assigned to both {first} and {second}")]
    DuplicateId { id: usize, first: Token, second: Token },
    #[error("Id {id} out of range for vocabulary of size {size}")]
    IdOutOfRange { id: usize, size: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VocabError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    ids: BTreeMap<Token, usize>,
    tokens: Vec<Token>,
}

impl Vocabulary {
    /// Assign an id to each distinct token, in token order.
    pub fn build(tokens: &[Token]) -> Self {
        let distinct: BTreeSet<Token> = tokens.iter().copied().collect();
        let tokens: Vec<Token> = distinct.into_iter().collect();
        let ids = tokens.iter().enumerate().map(|(i, t)| (*t, i)).collect();
        Self { ids, tokens }
    }

    /// Adopt an existing token -> id mapping, rejecting anything that is not
    /// a bijection onto `[0, len)`.
    pub fn from_mapping(ids: BTreeMap<Token, usize>) -> Result<Self> {
        let size = ids.len();
        let mut slots: Vec<Option<Token>> = vec![None; size];
        for (&token, &id) in &ids {
            let slot = slots
                .get_mut(id)
                .ok_or(VocabError::IdOutOfRange { id, size })?;
            if let Some(first) = *slot {
                return Err(VocabError::DuplicateId { id, first, second: token });
            }
            *slot = Some(token);
        }
        // n distinct in-range ids over n slots fill every slot.
        let tokens = slots.into_iter().flatten().collect();
        Ok(Self { ids, tokens })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let ids: BTreeMap<Token, usize> = serde_json::from_str(&data)?;
        let vocab = Self::from_mapping(ids)?;
        log::info!("Loaded vocabulary of {} tokens from {}", vocab.len(), path.display());
        Ok(vocab)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.ids)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn id(&self, token: Token) -> Result<usize> {
        self.ids
            .get(&token)
            .copied()
            .ok_or(VocabError::UnseenToken(token))
    }

    pub fn token(&self, id: usize) -> Option<Token> {
        self.tokens.get(id).copied()
    }

    /// Map a token sequence to ids, failing on the first unknown token.
    pub fn ids_of(&self, tokens: &[Token]) -> Result<Vec<usize>> {
        tokens.iter().map(|&t| self.id(t)).collect()
    }

    pub fn mapping(&self) -> &BTreeMap<Token, usize> {
        &self.ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::parse_tokens;

    #[test]
    fn test_build_is_bijection() {
        let corpus = parse_tokens("60 _ 62 _ r _ 60 _ / / 64 _ _ / /").unwrap();
        let vocab = Vocabulary::build(&corpus);

        let distinct: BTreeSet<Token> = corpus.iter().copied().collect();
        assert_eq!(vocab.len(), distinct.len());

        let ids: BTreeSet<usize> = vocab.mapping().values().copied().collect();
        assert_eq!(ids, (0..vocab.len()).collect());

        for &t in &distinct {
            let id = vocab.id(t).unwrap();
            assert_eq!(vocab.token(id), Some(t));
        }
    }

    #[test]
    fn test_unseen_token() {
        let vocab = Vocabulary::build(&parse_tokens("60 _ /").unwrap());
        assert!(matches!(
            vocab.id(Token::Pitch(61)),
            Err(VocabError::UnseenToken(Token::Pitch(61)))
        ));
        assert!(vocab.ids_of(&[Token::Pitch(60), Token::Rest]).is_err());
        assert_eq!(vocab.token(vocab.len()), None);
    }

    #[test]
    fn test_from_mapping_rejects_duplicate_id() {
        let mut ids = BTreeMap::new();
        ids.insert(Token::Pitch(60), 0);
        ids.insert(Token::Continuation, 0);
        assert!(matches!(
            Vocabulary::from_mapping(ids),
            Err(VocabError::DuplicateId { id: 0, .. })
        ));
    }

    #[test]
    fn test_from_mapping_rejects_gap() {
        let mut ids = BTreeMap::new();
        ids.insert(Token::Pitch(60), 0);
        ids.insert(Token::Continuation, 2);
        assert!(matches!(
            Vocabulary::from_mapping(ids),
            Err(VocabError::IdOutOfRange { id: 2, size: 2 })
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.json");

        let mut ids = BTreeMap::new();
        ids.insert(Token::Pitch(60), 0);
        ids.insert(Token::Continuation, 1);
        ids.insert(Token::Delimiter, 2);
        ids.insert(Token::Pitch(62), 3);
        let vocab = Vocabulary::from_mapping(ids).unwrap();
        vocab.save(&path).unwrap();

        let raw: BTreeMap<String, usize> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.get("62"), Some(&3));
        assert_eq!(raw.get("/"), Some(&2));

        let loaded = Vocabulary::load(&path).unwrap();
        assert_eq!(loaded, vocab);
        assert_eq!(loaded.token(3), Some(Token::Pitch(62)));
    }
}
