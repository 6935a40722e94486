use anyhow::{anyhow, Error};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use whatlang::{detect as detect_language, Lang};

/// Languages the pipeline can target and tokenize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Fr,
    De,
    Es,
    It,
}

impl Language {
    /// Guesses the language of a text; `None` when undetected or unsupported.
    pub fn detect(text: &str) -> Option<Language> {
        let info = detect_language(text)?;
        match info.lang() {
            Lang::Eng => Some(Language::En),
            Lang::Fra => Some(Language::Fr),
            Lang::Deu => Some(Language::De),
            Lang::Spa => Some(Language::Es),
            Lang::Ita => Some(Language::It),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::En => write!(f, "en"),
            Language::Fr => write!(f, "fr"),
            Language::De => write!(f, "de"),
            Language::Es => write!(f, "es"),
            Language::It => write!(f, "it"),
        }
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "eng" | "english" => Ok(Language::En),
            "fr" | "fra" | "french" => Ok(Language::Fr),
            "de" | "deu" | "german" => Ok(Language::De),
            "es" | "spa" | "spanish" => Ok(Language::Es),
            "it" | "ita" | "italian" => Ok(Language::It),
            other => Err(anyhow!("Unsupported language: {}", other)),
        }
    }
}

/// Cleaned document produced by the retrieval collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub raw_text: String,
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub publication_date: Option<NaiveDate>,
    #[serde(default)]
    pub authors: Vec<String>,
}

impl Article {
    pub fn new(title: &str, url: &str, raw_text: &str) -> Self {
        Article {
            title: title.to_string(),
            url: url.to_string(),
            raw_text: raw_text.to_string(),
            ..Default::default()
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn with_publication_date(mut self, date: NaiveDate) -> Self {
        self.publication_date = Some(date);
        self
    }

    pub fn with_authors(mut self, authors: Vec<String>) -> Self {
        self.authors = authors;
        self
    }

    /// Fills in the language from the text when the retriever left it unset.
    pub fn detect_language_if_missing(&mut self) {
        if self.language.is_none() {
            self.language = Language::detect(&self.raw_text);
        }
    }

    /// Length in characters, as reported in the exports.
    pub fn text_length(&self) -> usize {
        self.raw_text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parsing() {
        assert_eq!("FR".parse::<Language>().unwrap(), Language::Fr);
        assert_eq!("eng".parse::<Language>().unwrap(), Language::En);
        assert!("klingon".parse::<Language>().is_err());
        assert_eq!(Language::Fr.to_string(), "fr");
    }

    #[test]
    fn test_detects_english() {
        let text = "The president announced on Monday that the government would \
                    present a new budget to the parliament before the end of the month.";
        assert_eq!(Language::detect(text), Some(Language::En));
    }

    #[test]
    fn test_detect_only_when_missing() {
        let mut article = Article::new("t", "u", "Ceci est un texte écrit en français, \
            avec suffisamment de mots pour que la détection fonctionne correctement.")
            .with_language(Language::De);
        article.detect_language_if_missing();
        assert_eq!(article.language, Some(Language::De));
        article.language = None;
        article.detect_language_if_missing();
        assert_eq!(article.language, Some(Language::Fr));
    }
}
