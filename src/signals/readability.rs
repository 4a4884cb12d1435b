//! Flesch reading ease, mapped to [0,1] by dividing by 100 and clamping.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{Measurement, SignalError, SignalInput, SignalName, SignalProvider};

static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z]+(?:'[A-Za-z]+)?").expect("word regex"));
static SENTENCE_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").expect("sentence regex"));

/// Raw Flesch reading ease; `None` when the text has no words.
pub fn flesch_reading_ease(text: &str) -> Option<f32> {
    let words: Vec<&str> = WORD_RE.find_iter(text).map(|m| m.as_str()).collect();
    if words.is_empty() {
        return None;
    }
    let sentences = SENTENCE_END_RE.find_iter(text).count().max(1) as f32;
    let syllables: usize = words.iter().map(|w| count_syllables(w)).sum();
    let n = words.len() as f32;
    Some(206.835 - 1.015 * (n / sentences) - 84.6 * (syllables as f32 / n))
}

/// Vowel-group heuristic with a silent trailing "e". At least one per word.
pub fn count_syllables(word: &str) -> usize {
    let w: Vec<char> = word
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if w.is_empty() {
        return 0;
    }
    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');

    let mut count = 0;
    let mut prev_vowel = false;
    for &c in &w {
        let v = is_vowel(c);
        if v && !prev_vowel {
            count += 1;
        }
        prev_vowel = v;
    }

    let n = w.len();
    if n > 2 && w[n - 1] == 'e' && w[n - 2] != 'l' && !is_vowel(w[n - 2]) && count > 1 {
        count -= 1;
    }
    count.max(1)
}

/// Readability signal. No words ⇒ 0.
pub struct ReadabilityProvider;

#[async_trait]
impl SignalProvider for ReadabilityProvider {
    fn name(&self) -> SignalName {
        SignalName::Readability
    }

    async fn measure(&self, input: &SignalInput<'_>) -> Result<Measurement, SignalError> {
        let text = input.text()?;
        Ok(match flesch_reading_ease(text) {
            Some(raw) => Measurement::new((raw / 100.0).clamp(0.0, 1.0))
                .with_note(format!("Flesch reading ease {raw:.1}")),
            None => Measurement::new(0.0).with_note("no words to score"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syllable_heuristic() {
        assert_eq!(count_syllables("cat"), 1);
        assert_eq!(count_syllables("make"), 1);
        assert_eq!(count_syllables("table"), 2);
        assert_eq!(count_syllables("reading"), 2);
        assert_eq!(count_syllables("the"), 1);
        assert_eq!(count_syllables("123"), 0);
    }

    #[test]
    fn simple_text_reads_easier_than_dense_text() {
        let simple = flesch_reading_ease("The cat sat on the mat. The dog ran.").unwrap();
        let dense = flesch_reading_ease(
            "Epidemiological surveillance methodologies necessitate comprehensive \
             interdisciplinary collaboration regarding immunization pharmacovigilance.",
        )
        .unwrap();
        assert!(simple > 90.0, "got {simple}");
        assert!(dense < 0.0, "got {dense}");
    }

    #[test]
    fn no_words_is_none() {
        assert_eq!(flesch_reading_ease("  12 34 !!! "), None);
        assert_eq!(flesch_reading_ease(""), None);
    }

    #[tokio::test]
    async fn wordless_page_scores_zero_but_missing_page_is_unavailable() {
        use crate::fetch::ContentResult;
        use crate::url_check::{check, UrlPolicy};

        let url = "https://www.reuters.com/a";
        let facts = check(url, &UrlPolicy::default()).unwrap();
        let measure = |content: ContentResult| {
            let facts = facts.clone();
            async move {
                let input = SignalInput {
                    content: &content,
                    query: "q",
                    url,
                    url_facts: &facts,
                };
                ReadabilityProvider.measure(&input).await
            }
        };

        let m = measure(ContentResult::ok("12 34 !!!")).await.unwrap();
        assert_eq!(m.value, 0.0);
        assert_eq!(m.note.as_deref(), Some("no words to score"));

        let err = measure(ContentResult::failed("http 404")).await.unwrap_err();
        assert_eq!(err, SignalError::ContentUnavailable("http 404".into()));
    }
}
