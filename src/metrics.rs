//! Text metrics shared by live KPIs, chart series and history records.
//!
//! Everything here is pure: the same text always yields the same numbers, so a
//! KPI shown while editing and the counts stored with a finished run agree.

use serde::Serialize;
use std::collections::HashMap;

/// Average reading speed used for reading-time estimates.
pub const WORDS_PER_MINUTE: usize = 200;

/// Count maximal runs of non-whitespace.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Count non-empty segments between runs of `.`, `!` and `?`.
pub fn sentence_count(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
}

/// Count blocks of text separated by blank (or whitespace-only) lines.
pub fn paragraph_count(text: &str) -> usize {
    let mut count = 0;
    let mut in_paragraph = false;
    for line in text.lines() {
        if line.trim().is_empty() {
            in_paragraph = false;
        } else if !in_paragraph {
            in_paragraph = true;
            count += 1;
        }
    }
    count
}

/// Minutes needed to read `words` words, rounded up.
pub fn reading_time_minutes(words: usize) -> u64 {
    words.div_ceil(WORDS_PER_MINUTE) as u64
}

/// Percentage of the original removed by the summary, in `0..=100`.
///
/// Zero when either side is empty; a summary longer than the original also
/// reports zero rather than a negative compression.
pub fn compression_percent(original_words: usize, summary_words: usize) -> u8 {
    if original_words == 0 || summary_words == 0 {
        return 0;
    }
    let ratio = summary_words as f64 / original_words as f64;
    ((1.0 - ratio) * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Percentage of the original retained by the summary, in `0..=100`.
pub fn summary_percent(original_words: usize, summary_words: usize) -> u8 {
    if original_words == 0 {
        return 0;
    }
    let ratio = summary_words as f64 / original_words as f64;
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

pub fn character_count(text: &str) -> usize {
    text.chars().count()
}

/// Words per sentence, rounded to one decimal. Sentences are floored at 1.
pub fn average_sentence_length(text: &str) -> f64 {
    let words = word_count(text) as f64;
    let sentences = sentence_count(text).max(1) as f64;
    (words / sentences * 10.0).round() / 10.0
}

/// Most frequent terms: lowercased, letters only, longer than three characters.
///
/// Ties keep the order in which terms first appear.
pub fn top_words(text: &str, limit: usize) -> Vec<(String, usize)> {
    let mut order: Vec<String> = Vec::new();
    let mut freq: HashMap<String, usize> = HashMap::new();

    for raw in text.split_whitespace() {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_alphabetic())
            .flat_map(char::to_lowercase)
            .collect();
        if cleaned.chars().count() <= 3 {
            continue;
        }
        let entry = freq.entry(cleaned.clone()).or_insert(0);
        if *entry == 0 {
            order.push(cleaned);
        }
        *entry += 1;
    }

    let mut ranked: Vec<(String, usize)> = order
        .into_iter()
        .map(|w| {
            let n = freq[&w];
            (w, n)
        })
        .collect();
    // Stable sort keeps first-occurrence order among equal counts.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(limit);
    ranked
}

/// All counts for one piece of text, computed in one place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextStats {
    pub words: usize,
    pub sentences: usize,
    pub paragraphs: usize,
    pub characters: usize,
    pub reading_minutes: u64,
    pub avg_sentence_length: f64,
}

impl TextStats {
    pub fn of(text: &str) -> Self {
        let words = word_count(text);
        Self {
            words,
            sentences: sentence_count(text),
            paragraphs: paragraph_count(text),
            characters: character_count(text),
            reading_minutes: reading_time_minutes(words),
            avg_sentence_length: average_sentence_length(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_counts_nothing() {
        for text in ["", "   ", "\n\n\t  \n"] {
            assert_eq!(word_count(text), 0);
            assert_eq!(sentence_count(text), 0);
            assert_eq!(paragraph_count(text), 0);
        }
    }

    #[test]
    fn counts_words_and_sentences() {
        let text = "Hello world. This is a test!";
        assert_eq!(word_count(text), 6);
        assert_eq!(sentence_count(text), 2);
    }

    #[test]
    fn repeated_terminators_form_one_boundary() {
        assert_eq!(sentence_count("Wait... what?! Really."), 3);
        assert_eq!(sentence_count("...leading dots"), 1);
        assert_eq!(sentence_count("no terminator at all"), 1);
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let text = "First para\nstill first.\n\nSecond.\n   \n\n\nThird.";
        assert_eq!(paragraph_count(text), 3);
        assert_eq!(paragraph_count("one line"), 1);
        assert_eq!(paragraph_count("a\r\n\r\nb"), 2);
    }

    #[test]
    fn reading_time_rounds_up() {
        assert_eq!(reading_time_minutes(0), 0);
        assert_eq!(reading_time_minutes(1), 1);
        assert_eq!(reading_time_minutes(200), 1);
        assert_eq!(reading_time_minutes(201), 2);
        assert_eq!(reading_time_minutes(1000), 5);
    }

    #[test]
    fn compression_of_quarter_length_summary() {
        assert_eq!(compression_percent(1000, 250), 75);
        assert_eq!(summary_percent(1000, 250), 25);
    }

    #[test]
    fn compression_is_zero_for_empty_sides() {
        assert_eq!(compression_percent(0, 0), 0);
        assert_eq!(compression_percent(0, 10), 0);
        assert_eq!(compression_percent(10, 0), 0);
        assert_eq!(summary_percent(0, 10), 0);
    }

    #[test]
    fn compression_stays_in_range() {
        for o in 0..60 {
            for s in 0..120 {
                let c = compression_percent(o, s);
                assert!(c <= 100, "compression_percent({o}, {s}) = {c}");
                assert!(summary_percent(o, s) <= 100);
            }
        }
        assert_eq!(compression_percent(10, 30), 0);
    }

    #[test]
    fn average_sentence_length_floors_sentences() {
        assert_eq!(average_sentence_length(""), 0.0);
        assert_eq!(average_sentence_length("one two three"), 3.0);
        assert_eq!(average_sentence_length("A b c. D e."), 2.5);
    }

    #[test]
    fn top_words_filters_and_ranks() {
        let text = "The court held that the contract, the CONTRACT! was void. Court costs: none.";
        let top = top_words(text, 3);
        assert_eq!(
            top,
            vec![
                ("court".to_string(), 2),
                ("contract".to_string(), 2),
                ("held".to_string(), 1)
            ]
        );
    }

    #[test]
    fn stats_bundle_matches_individual_functions() {
        let text = "Alpha beta. Gamma!\n\nDelta epsilon zeta?";
        let stats = TextStats::of(text);
        assert_eq!(stats.words, word_count(text));
        assert_eq!(stats.sentences, 3);
        assert_eq!(stats.paragraphs, 2);
        assert_eq!(stats.reading_minutes, 1);
        assert_eq!(stats.characters, text.chars().count());
    }
}
