//! Greedy budget selection over scored chunks.

use std::cmp::Ordering;

use super::chunker::char_len;
use super::ScoredChunk;

/// Separator placed between accepted chunks in the final document.
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// Accept chunks in descending score order until the next one would push
/// the joined text past `max_len` characters.
///
/// The sort is stable, so equal scores keep document order. Selection stops
/// at the first chunk that does not fit; later, shorter chunks are not
/// considered, so the result is always a prefix of the sorted list. The
/// running total includes the separators between accepted chunks.
pub fn select_within_budget(mut scored: Vec<ScoredChunk>, max_len: usize) -> Vec<ScoredChunk> {
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let separator_len = char_len(CHUNK_SEPARATOR);
    let mut total = 0;
    let mut accepted = Vec::new();
    for chunk in scored {
        let joiner = if accepted.is_empty() { 0 } else { separator_len };
        let next = total + joiner + char_len(&chunk.chunk.text);
        if next > max_len {
            break;
        }
        total = next;
        accepted.push(chunk);
    }
    accepted
}

/// Join accepted chunks, in the order given, with a blank line between them.
pub fn join_chunks(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|scored| scored.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CHUNK_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Chunk;

    fn scored(text: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                text: text.to_owned(),
                source_url: "https://example.com".to_owned(),
            },
            score,
        }
    }

    fn texts(chunks: &[ScoredChunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.chunk.text.as_str()).collect()
    }

    #[test]
    fn accepts_in_descending_score_order() {
        let chunks = vec![scored("low", 0.1), scored("high", 5.0), scored("mid", 1.0)];
        let accepted = select_within_budget(chunks, 100);
        assert_eq!(texts(&accepted), vec!["high", "mid", "low"]);
        assert_eq!(join_chunks(&accepted), "high\n\nmid\n\nlow");
    }

    #[test]
    fn stops_at_first_overflow() {
        // "aaaa" (4) + "\n\n" + "bbbbbbbbbb" (10) = 16 > 12, so selection stops
        // even though "c" would still fit.
        let chunks = vec![
            scored("aaaa", 3.0),
            scored("bbbbbbbbbb", 2.0),
            scored("c", 1.0),
        ];
        let accepted = select_within_budget(chunks, 12);
        assert_eq!(texts(&accepted), vec!["aaaa"]);
    }

    #[test]
    fn separators_count_against_budget() {
        let chunks = vec![scored("aaaa", 2.0), scored("bbbb", 1.0)];
        assert_eq!(select_within_budget(chunks.clone(), 10).len(), 2);
        assert_eq!(select_within_budget(chunks, 9).len(), 1);
    }

    #[test]
    fn first_chunk_too_large_yields_nothing() {
        let accepted = select_within_budget(vec![scored("too long", 1.0)], 3);
        assert!(accepted.is_empty());
    }

    #[test]
    fn equal_scores_keep_document_order() {
        let chunks = vec![scored("one", 1.0), scored("two", 1.0), scored("three", 1.0)];
        let accepted = select_within_budget(chunks, 100);
        assert_eq!(texts(&accepted), vec!["one", "two", "three"]);
    }

    #[test]
    fn joined_text_respects_budget_and_is_maximal_prefix() {
        let chunks: Vec<ScoredChunk> = (0..20)
            .map(|i| scored(&"x".repeat(7 + i % 5), (i * 7 % 13) as f32))
            .collect();
        for budget in [0, 5, 12, 40, 73, 200] {
            let mut sorted = chunks.clone();
            sorted.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

            let accepted = select_within_budget(chunks.clone(), budget);
            let joined = join_chunks(&accepted);
            assert!(char_len(&joined) <= budget);

            // Accepted chunks are exactly the first k of the sorted list ...
            assert_eq!(texts(&accepted), texts(&sorted[..accepted.len()]));
            // ... and the next one would not have fit.
            if let Some(next) = sorted.get(accepted.len()) {
                let mut extended = accepted.clone();
                extended.push(next.clone());
                assert!(char_len(&join_chunks(&extended)) > budget);
            }
        }
    }
}
