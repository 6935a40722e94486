use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use super::types::{ResultStatus, SearchResult};
use super::TARGET_FILTER;
use crate::article::Language;
use crate::entity::{DateWindow, EntityType};

/// Parameters shared by the content and entity filters.
#[derive(Debug, Clone)]
pub struct FilterSettings {
    pub language: Option<Language>,
    pub compulsory: Option<Regex>,
    pub window: DateWindow,
    pub by_publication_date: bool,
    pub by_entity_date: bool,
}

impl FilterSettings {
    /// Builds the settings, compiling the compulsory expression into a
    /// case-insensitive whole-word pattern.
    pub fn new(
        language: Option<Language>,
        compulsory: Option<&str>,
        window: DateWindow,
        by_publication_date: bool,
        by_entity_date: bool,
    ) -> Result<Self> {
        let compulsory = match compulsory.map(str::trim).filter(|e| !e.is_empty()) {
            Some(expression) => Some(compulsory_pattern(expression)?),
            None => None,
        };
        Ok(FilterSettings {
            language,
            compulsory,
            window,
            by_publication_date,
            by_entity_date,
        })
    }
}

impl Default for FilterSettings {
    fn default() -> Self {
        FilterSettings {
            language: None,
            compulsory: None,
            window: DateWindow::default(),
            by_publication_date: false,
            by_entity_date: false,
        }
    }
}

/// Case-insensitive whole-word pattern matching `expression` literally.
pub fn compulsory_pattern(expression: &str) -> Result<Regex> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(expression)))
        .with_context(|| format!("Invalid compulsory expression '{}'", expression))
}

// Each filter leaves rejected results untouched, and returns true when it
// rejected the result it was given.

/// Rejects documents in a format that cannot be processed (PDF files).
pub fn filter_by_url(result: &mut SearchResult) -> bool {
    if !result.is_alive() {
        return false;
    }
    let unsupported = result.url().map_or(false, is_unsupported_format);
    if unsupported {
        debug!(target: TARGET_FILTER, "{}: unsupported format", result.key);
        result.reject(ResultStatus::UnsupportedFormat);
    }
    unsupported
}

fn is_unsupported_format(url: &str) -> bool {
    let path = url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    path.to_lowercase().ends_with(".pdf")
}

/// Rejects articles whose language differs from the targeted one.
pub fn filter_by_language(result: &mut SearchResult, language: Language) -> bool {
    if !result.is_alive() {
        return false;
    }
    let Some(article) = &result.article else {
        return false;
    };
    let mismatch = article.language != Some(language);
    debug!(
        target: TARGET_FILTER,
        "{}: language {:?} vs. {} >> {}",
        result.key,
        article.language,
        language,
        if mismatch { "discard" } else { "keep" }
    );
    if mismatch {
        result.reject(ResultStatus::IncorrectLanguage);
    }
    mismatch
}

/// Rejects articles not containing the compulsory expression. Posts written
/// by the tracked person are exempt.
pub fn filter_by_keyword(result: &mut SearchResult, pattern: &Regex) -> bool {
    if !result.is_alive() || result.is_original_post() {
        return false;
    }
    let Some(article) = &result.article else {
        return false;
    };
    let missing = !pattern.is_match(&article.raw_text);
    if missing {
        debug!(target: TARGET_FILTER, "{}: compulsory expression not found", result.key);
        result.reject(ResultStatus::MissingKeyword);
    }
    missing
}

/// Rejects articles published outside the window. Articles without a
/// publication date are kept.
pub fn filter_by_publication_date(result: &mut SearchResult, window: &DateWindow) -> bool {
    if !result.is_alive() {
        return false;
    }
    let Some(date) = result.article.as_ref().and_then(|a| a.publication_date) else {
        debug!(target: TARGET_FILTER, "{}: no publication date", result.key);
        return false;
    };
    let outside = !window.contains(date);
    debug!(
        target: TARGET_FILTER,
        "{}: published {} {} {}",
        result.key,
        date,
        if outside { "outside" } else { "inside" },
        window
    );
    if outside {
        result.reject(ResultStatus::InvalidDate);
    }
    outside
}

/// Rejects articles with no date mention covering a bound of the window.
/// With an open window, any date mention is enough.
pub fn filter_by_entity_date(result: &mut SearchResult, window: &DateWindow) -> bool {
    if !result.is_alive() {
        return false;
    }
    let dates = result.mentions.of_type(EntityType::Date);
    let bounds = window.bounds();
    let found = dates.iter().filter_map(|m| m.period()).any(|period| {
        bounds.is_empty() || bounds.iter().any(|bound| period.contains(*bound))
    });
    if !found {
        debug!(target: TARGET_FILTER, "{}: no date mention matching {}", result.key, window);
        result.reject(ResultStatus::MissingDate);
    }
    !found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::Article;
    use crate::collaborators::SocialPost;
    use crate::entity::{Mention, MentionSet, Period};
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn web(text: &str) -> SearchResult {
        SearchResult::web("http://example.com/a").with_article(
            Article::new("A", "http://example.com/a", text)
                .with_language(Language::Fr)
                .with_publication_date(d(2012, 5, 6)),
        )
    }

    #[test]
    fn test_pdf_urls_are_unsupported() {
        let mut result = SearchResult::web("http://example.com/report.PDF?x=1");
        assert!(filter_by_url(&mut result));
        assert_eq!(result.status, Some(ResultStatus::UnsupportedFormat));
        let mut page = SearchResult::web("http://example.com/pdf-news.html");
        assert!(!filter_by_url(&mut page));
        // Only the path counts, not the host name
        let mut host = SearchResult::web("http://report.pdf/");
        assert!(!filter_by_url(&mut host));
        let mut nested = SearchResult::web("http://report.pdf/files/x.pdf");
        assert!(filter_by_url(&mut nested));
    }

    #[test]
    fn test_language() {
        let mut result = web("texte");
        assert!(!filter_by_language(&mut result, Language::Fr));
        assert!(filter_by_language(&mut result, Language::En));
        assert_eq!(result.status, Some(ResultStatus::IncorrectLanguage));
    }

    #[test]
    fn test_keyword_whole_word_case_insensitive() {
        let pattern = compulsory_pattern("Hollande").unwrap();
        assert!(!filter_by_keyword(&mut web("Le président HOLLANDE a parlé."), &pattern));
        assert!(filter_by_keyword(&mut web("Les Hollandes sont ailleurs."), &pattern));

        let dotted = compulsory_pattern("F. Hollande").unwrap();
        assert!(filter_by_keyword(&mut web("Fx Hollande"), &dotted));
    }

    #[test]
    fn test_keyword_skips_original_posts() {
        let pattern = compulsory_pattern("Hollande").unwrap();
        let post = SocialPost {
            id: "1".into(),
            source: "fb".into(),
            content: "Merci !".into(),
            original: true,
            ..Default::default()
        };
        let article = post.build_article(false);
        let mut result = SearchResult::social(post).with_article(article);
        assert!(!filter_by_keyword(&mut result, &pattern));
        assert!(result.is_alive());
    }

    #[test]
    fn test_publication_date_inclusive() {
        let window = DateWindow::new(Some(d(2012, 5, 6)), Some(d(2012, 5, 31)));
        assert!(!filter_by_publication_date(&mut web("x"), &window));
        let late = DateWindow::new(Some(d(2012, 5, 7)), None);
        let mut result = web("x");
        assert!(filter_by_publication_date(&mut result, &late));
        assert_eq!(result.status, Some(ResultStatus::InvalidDate));

        let mut undated = SearchResult::web("u").with_article(Article::new("t", "u", "x"));
        assert!(!filter_by_publication_date(&mut undated, &late));
    }

    #[test]
    fn test_entity_date() {
        let window = DateWindow::new(Some(d(2012, 5, 1)), Some(d(2012, 5, 31)));
        let mut no_dates = web("x");
        assert!(filter_by_entity_date(&mut no_dates, &window));
        assert_eq!(no_dates.status, Some(ResultStatus::MissingDate));

        let covering = MentionSet::new().with_mention(Mention::date(
            0,
            1,
            "x",
            Period::new(d(2012, 4, 28), d(2012, 5, 2)),
        ));
        let mut kept = web("x").with_mentions(covering);
        assert!(!filter_by_entity_date(&mut kept, &window));

        // Strictly inside the window but containing neither bound
        let inside = MentionSet::new().with_mention(Mention::date(0, 1, "x", Period::single(d(2012, 5, 10))));
        let mut rejected = web("x").with_mentions(inside);
        assert!(filter_by_entity_date(&mut rejected, &window));
    }

    #[test]
    fn test_rejected_results_are_left_alone() {
        let mut result = web("x");
        result.reject(ResultStatus::Unavailable);
        assert!(!filter_by_language(&mut result, Language::En));
        assert!(!filter_by_entity_date(&mut result, &DateWindow::default()));
        assert_eq!(result.status, Some(ResultStatus::Unavailable));
    }
}
