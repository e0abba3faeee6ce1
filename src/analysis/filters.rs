use std::collections::HashSet;
use rust_stemmers::{Algorithm, Stemmer};
use crate::analysis::token::Token;

pub trait TokenFilter: Send + Sync {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token>;
}

pub struct LowercaseFilter;

impl TokenFilter for LowercaseFilter {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens.into_iter()
            .map(|mut token| {
                token.text = token.text.to_lowercase();
                token
            })
            .collect()
    }
}

/// Strips a trailing `'s` so "river's" indexes as "river".
pub struct PossessiveFilter;

impl TokenFilter for PossessiveFilter {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens.into_iter()
            .map(|mut token| {
                for suffix in ["'s", "\u{2019}s", "'S", "\u{2019}S"] {
                    if let Some(stripped) = token.text.strip_suffix(suffix) {
                        token.text = stripped.to_string();
                        break;
                    }
                }
                token
            })
            .filter(|token| !token.text.is_empty())
            .collect()
    }
}

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for",
    "from", "has", "he", "if", "in", "into", "is", "it", "its", "no",
    "not", "of", "on", "or", "such", "that", "the", "their", "then",
    "there", "these", "they", "this", "to", "was", "will", "with",
];

/// Drops stopwords. Positions of the remaining tokens are untouched.
pub struct StopWordFilter {
    stop_words: HashSet<String>,
}

impl StopWordFilter {
    pub fn new<I, S>(stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StopWordFilter {
            stop_words: stop_words.into_iter().map(Into::into).collect(),
        }
    }

    pub fn english() -> Self {
        StopWordFilter::new(ENGLISH_STOP_WORDS.iter().copied())
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }
}

impl TokenFilter for StopWordFilter {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens.into_iter()
            .filter(|token| !self.is_stop_word(&token.text))
            .collect()
    }
}

/// Snowball stemming; expects lowercased input.
pub struct StemmerFilter {
    stemmer: Stemmer,
}

impl StemmerFilter {
    pub fn new(algorithm: Algorithm) -> Self {
        StemmerFilter {
            stemmer: Stemmer::create(algorithm),
        }
    }
}

impl TokenFilter for StemmerFilter {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens.into_iter()
            .map(|mut token| {
                token.text = self.stemmer.stem(&token.text).into_owned();
                token
            })
            .collect()
    }
}
