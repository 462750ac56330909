//! Transcript Comparator
//!
//! Scores how faithfully an independent transcript reproduces the script.
//!
//! # Similarity Dimensions
//! - **Character**: matching-blocks ratio over the normalized strings
//! - **Word**: matching-blocks ratio over whitespace-separated tokens
//! - **Length**: `min(len) / max(len)` in characters, 0 when both empty
//! - **Average**: unweighted mean of the three
//!
//! # Ratio Algorithm
//! Ratcliff/Obershelp: recursively take the longest common contiguous block,
//! then recurse on the unmatched pieces to its left and right. With `M`
//! matched elements the ratio is `2M / (|a| + |b|)`, and 1.0 when both
//! sequences are empty. Among equally long blocks the earliest in `a` (then
//! in `b`) wins. No "popular element" junk heuristic is applied.

use crate::types::SimilarityMetrics;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::debug;

/// Transcript Comparator
///
/// Pure and deterministic; holds no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranscriptComparator;

impl TranscriptComparator {
    pub fn new() -> Self {
        Self
    }

    /// Compare the script with its transcript
    pub fn compare(&self, original: &str, transcribed: &str) -> SimilarityMetrics {
        let original = normalize_whitespace(original);
        let transcribed = normalize_whitespace(transcribed);

        let original_chars: Vec<char> = original.chars().collect();
        let transcribed_chars: Vec<char> = transcribed.chars().collect();
        let character_similarity = sequence_ratio(&original_chars, &transcribed_chars);

        let original_words: Vec<&str> = original.split_whitespace().collect();
        let transcribed_words: Vec<&str> = transcribed.split_whitespace().collect();
        let word_similarity = sequence_ratio(&original_words, &transcribed_words);

        let length_similarity = length_ratio(original_chars.len(), transcribed_chars.len());

        let average_similarity = (character_similarity + word_similarity + length_similarity) / 3.0;

        debug!(
            character = character_similarity,
            word = word_similarity,
            length = length_similarity,
            average = average_similarity,
            "Transcript comparison complete"
        );

        SimilarityMetrics {
            character_similarity,
            word_similarity,
            length_similarity,
            average_similarity,
        }
    }
}

/// Collapse whitespace runs to single spaces and trim the ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn length_ratio(a: usize, b: usize) -> f32 {
    let longest = a.max(b);
    if longest == 0 {
        return 0.0;
    }
    a.min(b) as f32 / longest as f32
}

/// Matching-blocks similarity ratio in [0,1]
pub fn sequence_ratio<T: Eq + Hash>(a: &[T], b: &[T]) -> f32 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched: usize = matching_blocks(a, b).iter().map(|block| block.size).sum();
    (2 * matched) as f32 / total as f32
}

/// A run of `size` equal elements at `a[a_start..]` and `b[b_start..]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchingBlock {
    pub a_start: usize,
    pub b_start: usize,
    pub size: usize,
}

/// Non-overlapping matching blocks, sorted by position
pub fn matching_blocks<T: Eq + Hash>(a: &[T], b: &[T]) -> Vec<MatchingBlock> {
    // Positions of each element of `b`, ascending
    let mut b_index: HashMap<&T, Vec<usize>> = HashMap::new();
    for (j, item) in b.iter().enumerate() {
        b_index.entry(item).or_default().push(j);
    }

    let mut blocks = Vec::new();
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
        let block = longest_match(a, &b_index, a_lo, a_hi, b_lo, b_hi);
        if block.size == 0 {
            continue;
        }
        if a_lo < block.a_start && b_lo < block.b_start {
            pending.push((a_lo, block.a_start, b_lo, block.b_start));
        }
        let a_end = block.a_start + block.size;
        let b_end = block.b_start + block.size;
        if a_end < a_hi && b_end < b_hi {
            pending.push((a_end, a_hi, b_end, b_hi));
        }
        blocks.push(block);
    }

    blocks.sort_by_key(|block| (block.a_start, block.b_start));
    blocks
}

/// Longest common block of `a[a_lo..a_hi]` and `b[b_lo..b_hi]`
fn longest_match<T: Eq + Hash>(
    a: &[T],
    b_index: &HashMap<&T, Vec<usize>>,
    a_lo: usize,
    a_hi: usize,
    b_lo: usize,
    b_hi: usize,
) -> MatchingBlock {
    let mut best = MatchingBlock {
        a_start: a_lo,
        b_start: b_lo,
        size: 0,
    };

    // run_ending_at[j] = length of the match ending at a[i-1], b[j]
    let mut run_ending_at: HashMap<usize, usize> = HashMap::new();

    for (i, item) in a.iter().enumerate().take(a_hi).skip(a_lo) {
        let mut next_runs = HashMap::new();
        if let Some(positions) = b_index.get(item) {
            for &j in positions {
                if j < b_lo {
                    continue;
                }
                if j >= b_hi {
                    break;
                }
                let previous = if j > 0 {
                    run_ending_at.get(&(j - 1)).copied().unwrap_or(0)
                } else {
                    0
                };
                let run = previous + 1;
                next_runs.insert(j, run);
                if run > best.size {
                    best = MatchingBlock {
                        a_start: i + 1 - run,
                        b_start: j + 1 - run,
                        size: run,
                    };
                }
            }
        }
        run_ending_at = next_runs;
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_identity_transcript() {
        let comparator = TranscriptComparator::new();
        let text = "스타벅스의 새로운 겨울 메뉴를 소개합니다";
        let metrics = comparator.compare(text, text);

        assert_eq!(metrics.character_similarity, 1.0);
        assert_eq!(metrics.word_similarity, 1.0);
        assert_eq!(metrics.length_similarity, 1.0);
        assert_eq!(metrics.average_similarity, 1.0);
    }

    #[test]
    fn test_disjoint_transcript() {
        let metrics = TranscriptComparator::new().compare("abc", "xyz");
        assert_eq!(metrics.character_similarity, 0.0);
        assert_eq!(metrics.word_similarity, 0.0);
        assert_eq!(metrics.length_similarity, 1.0);
    }

    #[test]
    fn test_empty_strings_are_well_defined() {
        let metrics = TranscriptComparator::new().compare("", "");
        assert_eq!(metrics.length_similarity, 0.0);
        assert_eq!(metrics.character_similarity, 1.0);
        assert_eq!(metrics.word_similarity, 1.0);
        assert!(metrics.average_similarity.is_finite());
        assert!(approx(metrics.average_similarity, 2.0 / 3.0));
    }

    #[test]
    fn test_empty_transcript_against_script() {
        let metrics = TranscriptComparator::new().compare("hello world", "");
        assert_eq!(metrics.character_similarity, 0.0);
        assert_eq!(metrics.word_similarity, 0.0);
        assert_eq!(metrics.length_similarity, 0.0);
        assert_eq!(metrics.average_similarity, 0.0);
    }

    #[test]
    fn test_whitespace_is_normalized() {
        let metrics = TranscriptComparator::new().compare("  hello \t\n world ", "hello world");
        assert_eq!(metrics.character_similarity, 1.0);
        assert_eq!(metrics.word_similarity, 1.0);
        assert_eq!(metrics.length_similarity, 1.0);
    }

    #[test]
    fn test_sequence_ratio_partial_overlap() {
        let a: Vec<char> = "abcd".chars().collect();
        let b: Vec<char> = "bcde".chars().collect();
        // "bcd" matches: 2 * 3 / 8
        assert!(approx(sequence_ratio(&a, &b), 0.75));
    }

    #[test]
    fn test_matching_blocks_recurse_both_sides() {
        let a: Vec<char> = "xabcyde".chars().collect();
        let b: Vec<char> = "abczde".chars().collect();
        let blocks = matching_blocks(&a, &b);
        assert_eq!(
            blocks,
            vec![
                MatchingBlock { a_start: 1, b_start: 0, size: 3 },
                MatchingBlock { a_start: 5, b_start: 4, size: 2 },
            ]
        );
        assert!(approx(sequence_ratio(&a, &b), 10.0 / 13.0));
    }

    #[test]
    fn test_earliest_block_wins_ties() {
        let a: Vec<char> = "abab".chars().collect();
        let b: Vec<char> = "ab".chars().collect();
        let blocks = matching_blocks(&a, &b);
        assert_eq!(blocks, vec![MatchingBlock { a_start: 0, b_start: 0, size: 2 }]);
    }

    #[test]
    fn test_word_similarity_single_substitution() {
        let metrics = TranscriptComparator::new().compare(
            "새로운 겨울 메뉴를 소개합니다",
            "새로운 여름 메뉴를 소개합니다",
        );
        // 3 of 4 words match: 2 * 3 / 8
        assert!(approx(metrics.word_similarity, 0.75));
        assert!(metrics.character_similarity > 0.85);
        assert_eq!(metrics.length_similarity, 1.0);
    }

    #[test]
    fn test_bounds() {
        let comparator = TranscriptComparator::new();
        let pairs = [
            ("a", "aaaa"),
            ("the quick brown fox", "quick the fox brown"),
            ("", "something"),
            ("가나다라", "라다나가"),
        ];
        for (a, b) in pairs {
            let m = comparator.compare(a, b);
            for value in [
                m.character_similarity,
                m.word_similarity,
                m.length_similarity,
                m.average_similarity,
            ] {
                assert!((0.0..=1.0).contains(&value), "{a:?} vs {b:?} gave {value}");
            }
        }
    }
}
