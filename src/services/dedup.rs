//! Near-duplicate story detection.
//!
//! Stories are compared with a character-sequence similarity ratio
//! (`2 * matches / total_len`), where matches are found by repeatedly taking
//! the longest common substring and recursing on both sides of it. The ratio
//! is order-sensitive and lies in `[0, 1]`.

use std::collections::HashMap;

use crate::domain::ComicRecord;

/// Default ratio at or above which two stories count as the same.
pub const DEFAULT_THRESHOLD: f64 = 0.9;

#[derive(Debug, Clone, Copy)]
pub struct DuplicateDetector {
    threshold: f64,
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl DuplicateDetector {
    #[must_use]
    pub const fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    #[must_use]
    pub fn is_similar(&self, a: &str, b: &str) -> bool {
        // Cheap upper bound first: the ratio can never exceed 2*min/total.
        let (la, lb) = (a.chars().count(), b.chars().count());
        let total = la + lb;
        if total > 0 {
            #[allow(clippy::cast_precision_loss)]
            let bound = 2.0 * la.min(lb) as f64 / total as f64;
            if bound < self.threshold {
                return false;
            }
        }
        similarity_ratio(a, b) >= self.threshold
    }

    /// True when any story in `corpus` is similar to `candidate`.
    pub fn is_duplicate<'a, I>(&self, candidate: &str, corpus: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        corpus
            .into_iter()
            .any(|story| self.is_similar(candidate, story))
    }

    /// First stored comic whose original story is similar to `candidate`.
    #[must_use]
    pub fn find_duplicate<'a>(
        &self,
        candidate: &str,
        records: &'a [ComicRecord],
    ) -> Option<&'a ComicRecord> {
        records
            .iter()
            .find(|r| self.is_similar(candidate, &r.original_story))
    }
}

/// Similarity ratio of two strings, `1.0` for two empty strings.
#[must_use]
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let ratio = 2.0 * matching_characters(&a, &b) as f64 / total as f64;
    ratio
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, c) in b.iter().enumerate() {
        b2j.entry(*c).or_default().push(j);
    }

    let mut matched = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, &b2j, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }

    matched
}

/// Longest common run within `a[alo..ahi]` and `b[blo..bhi]`.
///
/// Ties go to the run starting earliest in `a`, then earliest in `b`.
fn longest_match(
    a: &[char],
    b2j: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_len) = (alo, blo, 0);
    let mut run_ending_at: HashMap<usize, usize> = HashMap::new();

    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next: HashMap<usize, usize> = HashMap::new();
        if let Some(positions) = b2j.get(c) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let k = j
                    .checked_sub(1)
                    .and_then(|prev| run_ending_at.get(&prev))
                    .copied()
                    .unwrap_or(0)
                    + 1;
                next.insert(j, k);
                if k > best_len {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_len = k;
                }
            }
        }
        run_ending_at = next;
    }

    (best_i, best_j, best_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn ratio_known_values() {
        assert!(approx(similarity_ratio("abcd", "bcde"), 0.75));
        assert!(approx(similarity_ratio("", ""), 1.0));
        assert!(approx(similarity_ratio("abc", ""), 0.0));
        assert!(approx(similarity_ratio("same", "same"), 1.0));
        assert!(approx(similarity_ratio("abc", "xyz"), 0.0));
    }

    #[test]
    fn ratio_is_order_sensitive() {
        // Same characters, reversed order: only one character can line up.
        assert!(similarity_ratio("abcdef", "fedcba") < 0.5);
    }

    #[test]
    fn ratio_recurses_on_both_sides() {
        // "ab" + "X" + "cd" vs "ab" + "Y" + "cd": 4 of 5 characters match
        assert!(approx(similarity_ratio("abXcd", "abYcd"), 0.8));
    }

    #[test]
    fn detects_near_duplicate_story() {
        let detector = DuplicateDetector::default();
        let stored = "A black bear was sighted downtown near the bakery on Main Street this morning.";
        let paraphrase =
            "A black bear was sighted downtown near the bakery on Main Street this morning!";
        let unrelated = "The city council approved a new budget for road repairs.";

        assert!(detector.is_duplicate(paraphrase, [stored]));
        assert!(!detector.is_duplicate(unrelated, [stored]));
        assert!(!detector.is_duplicate(paraphrase, std::iter::empty()));
    }

    #[test]
    fn threshold_is_inclusive() {
        let detector = DuplicateDetector::new(0.75);
        assert!(detector.is_similar("abcd", "bcde"));
        let strict = DuplicateDetector::new(0.76);
        assert!(!strict.is_similar("abcd", "bcde"));
    }
}
