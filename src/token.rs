//! Time-series token alphabet.
//!
//! A melody is written as one token per time step: a MIDI pitch or `r` on the
//! step where a note/rest starts, `_` on every following step it is held, and
//! `/` between songs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::{CONTINUATION_SYMBOL, DELIMITER_SYMBOL, REST_SYMBOL};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Unrecognized token: {0:?}")]
    Unrecognized(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Token {
    /// Onset of a note at this MIDI pitch
    Pitch(u8),
    /// Onset of a rest
    Rest,
    /// Hold the previous symbol for one more step
    Continuation,
    /// Song boundary / end of melody
    Delimiter,
}

impl Token {
    pub fn is_continuation(&self) -> bool {
        matches!(self, Token::Continuation)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Pitch(p) => write!(f, "{}", p),
            Token::Rest => f.write_str(REST_SYMBOL),
            Token::Continuation => f.write_str(CONTINUATION_SYMBOL),
            Token::Delimiter => f.write_str(DELIMITER_SYMBOL),
        }
    }
}

impl FromStr for Token {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            REST_SYMBOL => Ok(Token::Rest),
            CONTINUATION_SYMBOL => Ok(Token::Continuation),
            DELIMITER_SYMBOL => Ok(Token::Delimiter),
            _ => s
                .parse::<u8>()
                .ok()
                .filter(|p| *p <= 127)
                .map(Token::Pitch)
                .ok_or_else(|| TokenError::Unrecognized(s.to_string())),
        }
    }
}

// Persisted as the plain string form so a vocabulary file reads
// `{"60": 0, "_": 1, ...}`.
impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Token {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Split a whitespace-delimited token stream.
pub fn parse_tokens(stream: &str) -> Result<Vec<Token>, TokenError> {
    stream.split_whitespace().map(str::parse).collect()
}

/// Join tokens with single spaces (the on-disk song format).
pub fn join_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_markers() {
        assert_eq!("r".parse::<Token>().unwrap(), Token::Rest);
        assert_eq!("_".parse::<Token>().unwrap(), Token::Continuation);
        assert_eq!("/".parse::<Token>().unwrap(), Token::Delimiter);
        assert_eq!("60".parse::<Token>().unwrap(), Token::Pitch(60));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("x".parse::<Token>().is_err());
        assert!("128".parse::<Token>().is_err());
        assert!("-1".parse::<Token>().is_err());
        assert!("".parse::<Token>().is_err());
    }

    #[test]
    fn test_stream_split_and_join() {
        let tokens = parse_tokens("55 _ 57 _\n r  /").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Pitch(55),
                Token::Continuation,
                Token::Pitch(57),
                Token::Continuation,
                Token::Rest,
                Token::Delimiter,
            ]
        );
        assert_eq!(join_tokens(&tokens), "55 _ 57 _ r /");
    }

    #[test]
    fn test_serde_string_form() {
        let json = serde_json::to_string(&vec![Token::Pitch(62), Token::Rest]).unwrap();
        assert_eq!(json, r#"["62","r"]"#);
        let back: Vec<Token> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![Token::Pitch(62), Token::Rest]);
    }
}
