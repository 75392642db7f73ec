//! Transcript window extraction.
//!
//! Given a full episode transcript and a target timestamp, pulls out the
//! stretch of text the listener was hearing. Downstream consumers only need
//! a topical window, not word-perfect boundaries, so the flat-text mode uses
//! a reading-rate heuristic rather than exact alignment.

use crate::episode::TranscriptPayload;

/// Default extraction window.
pub const DEFAULT_WINDOW_SECONDS: u32 = 30;

/// Assumed speaking rate for locating a word offset in flat text.
const WORDS_PER_MINUTE: usize = 150;

/// Words kept before and after the estimated position.
const WORDS_BEFORE: usize = 25;
const WORDS_AFTER: usize = 75;

/// Grace applied to both ends of the window in segmented mode.
const GRACE_SECONDS: f64 = 5.0;

/// Extract the transcript window around `timestamp_seconds`.
///
/// Returns `None` when the payload holds nothing usable at that position,
/// signaling the caller to fall back to the audio path.
pub fn extract(
    payload: &TranscriptPayload,
    timestamp_seconds: u32,
    window_seconds: u32,
) -> Option<String> {
    match payload {
        TranscriptPayload::FlatText(text) => extract_flat(text, timestamp_seconds),
        TranscriptPayload::TimedSegments(segments) => {
            extract_timed(segments, timestamp_seconds, window_seconds)
        }
    }
}

fn extract_flat(text: &str, timestamp_seconds: u32) -> Option<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }

    let word_index = (timestamp_seconds as usize * WORDS_PER_MINUTE / 60).min(words.len());
    let start = word_index.saturating_sub(WORDS_BEFORE);
    let end = (word_index + WORDS_AFTER).min(words.len());
    if start >= end {
        return None;
    }

    Some(words[start..end].join(" "))
}

fn extract_timed(
    segments: &[crate::episode::TimedSegment],
    timestamp_seconds: u32,
    window_seconds: u32,
) -> Option<String> {
    let lo = timestamp_seconds as f64 - GRACE_SECONDS;
    let hi = (timestamp_seconds + window_seconds) as f64 + GRACE_SECONDS;

    let texts: Vec<&str> = segments
        .iter()
        .filter(|s| s.start_seconds <= hi && s.end_seconds > lo)
        .map(|s| s.text.trim())
        .filter(|t| !t.is_empty())
        .collect();

    if texts.is_empty() {
        None
    } else {
        Some(texts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episode::TimedSegment;

    fn flat(words: usize) -> TranscriptPayload {
        let text = (0..words).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        TranscriptPayload::FlatText(text)
    }

    fn timed(segments: &[(f64, f64, &str)]) -> TranscriptPayload {
        TranscriptPayload::TimedSegments(
            segments
                .iter()
                .map(|(start, end, text)| TimedSegment {
                    start_seconds: *start,
                    end_seconds: *end,
                    text: text.to_string(),
                })
                .collect(),
        )
    }

    #[test]
    fn test_flat_window_around_estimated_word() {
        // 60s at 150 wpm puts the cursor at word 150.
        let result = extract(&flat(1000), 60, DEFAULT_WINDOW_SECONDS).unwrap();
        let words: Vec<&str> = result.split_whitespace().collect();
        assert_eq!(words.first(), Some(&"w125"));
        assert_eq!(words.last(), Some(&"w224"));
        assert_eq!(words.len(), WORDS_BEFORE + WORDS_AFTER);
    }

    #[test]
    fn test_flat_clamps_at_the_start() {
        let result = extract(&flat(1000), 0, DEFAULT_WINDOW_SECONDS).unwrap();
        let words: Vec<&str> = result.split_whitespace().collect();
        assert_eq!(words.first(), Some(&"w0"));
        assert_eq!(words.len(), WORDS_AFTER);
    }

    #[test]
    fn test_flat_clamps_at_the_end() {
        // Timestamp far past the text still yields the tail of the episode.
        let result = extract(&flat(100), 3600, DEFAULT_WINDOW_SECONDS).unwrap();
        let words: Vec<&str> = result.split_whitespace().collect();
        assert_eq!(words.first(), Some(&"w75"));
        assert_eq!(words.last(), Some(&"w99"));
    }

    #[test]
    fn test_flat_output_is_contiguous() {
        let result = extract(&flat(500), 45, DEFAULT_WINDOW_SECONDS).unwrap();
        let words: Vec<&str> = result.split_whitespace().collect();
        let first: usize = words[0][1..].parse().unwrap();
        for (offset, word) in words.iter().enumerate() {
            assert_eq!(*word, format!("w{}", first + offset));
        }
    }

    #[test]
    fn test_flat_empty_text_yields_none() {
        assert_eq!(extract(&TranscriptPayload::FlatText("   ".into()), 10, 30), None);
    }

    #[test]
    fn test_timed_overlap_respects_grace_boundary() {
        let payload = timed(&[(10.0, 15.0, "a"), (50.0, 55.0, "b")]);
        // Window [7, 47]: "a" overlaps, "b" starts past the grace boundary.
        let result = extract(&payload, 12, 30).unwrap();
        assert!(result.contains('a'));
        assert!(!result.contains('b'));
    }

    #[test]
    fn test_timed_includes_segment_starting_on_the_boundary() {
        let payload = timed(&[(47.0, 52.0, "edge")]);
        let result = extract(&payload, 12, 30).unwrap();
        assert_eq!(result, "edge");
    }

    #[test]
    fn test_timed_concatenates_in_original_order() {
        let payload = timed(&[(10.0, 12.0, "first"), (12.0, 14.0, "second"), (14.0, 16.0, "third")]);
        let result = extract(&payload, 12, 30).unwrap();
        assert_eq!(result, "first second third");
    }

    #[test]
    fn test_timed_no_overlap_yields_none() {
        let payload = timed(&[(100.0, 110.0, "far away")]);
        assert_eq!(extract(&payload, 10, 30), None);
    }

    #[test]
    fn test_extract_is_deterministic() {
        let payload = timed(&[(5.0, 9.0, "x"), (9.0, 13.0, "y")]);
        assert_eq!(extract(&payload, 8, 30), extract(&payload, 8, 30));
    }
}
