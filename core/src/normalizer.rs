use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

lazy_static! {
    // POSIX class, ASCII only: the same 32 characters as C's ispunct.
    static ref PUNCT: Regex = Regex::new(r"[[:punct:]]").expect("valid regex");
}

/// A fixed set of words dropped before stemming. Membership is exact: the
/// words are compared against tokens that are already lowercased and
/// stripped of punctuation, and are never normalized themselves.
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// One word per line, taken verbatim; blank lines are skipped.
    pub fn from_list(text: &str) -> Self {
        let words = text
            .lines()
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        Self { words }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading stop words from {}", path.display()))?;
        let stop_words = Self::from_list(&text);
        tracing::debug!(path = %path.display(), count = stop_words.len(), "loaded stop words");
        Ok(stop_words)
    }

    /// The English list shipped in `data/stopwords.txt`.
    pub fn english() -> Self {
        Self::from_list(include_str!("../../data/stopwords.txt"))
    }

    pub fn contains(&self, word: &str) -> bool { self.words.contains(word) }

    pub fn len(&self) -> usize { self.words.len() }

    pub fn is_empty(&self) -> bool { self.words.is_empty() }
}

/// Stemming strategy applied to each surviving token.
pub trait Stem: Send + Sync {
    fn stem<'a>(&self, word: &'a str) -> Cow<'a, str>;
}

impl Stem for Stemmer {
    fn stem<'a>(&self, word: &'a str) -> Cow<'a, str> {
        Stemmer::stem(self, word)
    }
}

/// Leaves tokens as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStem;

impl Stem for NoStem {
    fn stem<'a>(&self, word: &'a str) -> Cow<'a, str> { Cow::Borrowed(word) }
}

pub fn remove_punctuation(text: &str) -> String {
    PUNCT.replace_all(text, "").into_owned()
}

pub fn lowercase(text: &str) -> String { text.to_lowercase() }

pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

pub fn remove_stop_words(tokens: Vec<String>, stop_words: &StopWords) -> Vec<String> {
    tokens.into_iter().filter(|t| !stop_words.contains(t)).collect()
}

pub fn stem_tokens(tokens: Vec<String>, stemmer: &dyn Stem) -> Vec<String> {
    tokens.iter().map(|t| stemmer.stem(t).into_owned()).collect()
}

/// Turns raw text into index tokens: punctuation removal, lowercasing,
/// whitespace tokenization, stop-word removal and stemming, in that order.
pub struct Normalizer {
    stop_words: StopWords,
    stemmer: Box<dyn Stem>,
}

impl Normalizer {
    pub fn new(stop_words: StopWords, stemmer: Box<dyn Stem>) -> Self {
        Self { stop_words, stemmer }
    }

    /// Snowball English (Porter2) stemming.
    pub fn english(stop_words: StopWords) -> Self {
        Self::new(stop_words, Box::new(Stemmer::create(Algorithm::English)))
    }

    pub fn stop_words(&self) -> &StopWords { &self.stop_words }

    pub fn normalize(&self, text: &str) -> Vec<String> {
        let text = remove_punctuation(text);
        let text = lowercase(&text);
        let tokens = tokenize(&text);
        let tokens = remove_stop_words(tokens, &self.stop_words);
        stem_tokens(tokens, self.stemmer.as_ref())
    }
}
