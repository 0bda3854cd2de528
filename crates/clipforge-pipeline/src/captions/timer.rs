//! Word rebasing and chunk grouping.

use tracing::debug;

use clipforge_models::{CaptionChunk, CaptionWord, EditPlan, Transcript};

/// Chunking parameters, defaulted from the pipeline config.
#[derive(Debug, Clone, Copy)]
pub struct CaptionOptions {
    /// Maximum words per chunk.
    pub max_words_per_chunk: usize,
    /// Maximum chunk duration in output-time seconds.
    pub max_chunk_duration_s: f64,
    /// Output-time gap between consecutive words that forces a new chunk.
    pub max_intra_chunk_gap_s: f64,
}

impl Default for CaptionOptions {
    fn default() -> Self {
        Self {
            max_words_per_chunk: 5,
            max_chunk_duration_s: 3.0,
            max_intra_chunk_gap_s: 0.7,
        }
    }
}

/// Rebase transcript words through the plan's timeline and group them into
/// caption chunks.
///
/// A word is located by its source midpoint: if the midpoint falls in
/// removed material the word is dropped; otherwise its start and end are
/// mapped through the containing span (clamped to the span, so a word
/// straddling a cut cannot leak outside its segment).
pub fn rebase_captions(
    transcript: &Transcript,
    plan: &EditPlan,
    options: &CaptionOptions,
) -> Vec<CaptionChunk> {
    let mut words: Vec<CaptionWord> = Vec::new();

    for word in transcript.words() {
        // Only words overlapping the clip window are candidates.
        if word.end <= plan.clip_start || word.start >= plan.clip_end {
            continue;
        }

        let Some(span) = plan.timeline.span_containing(word.midpoint()) else {
            continue;
        };

        let src_start = word.start.clamp(span.src_start, span.src_end);
        let src_end = word.end.clamp(span.src_start, span.src_end);

        let out_start = span.out_start + (src_start - span.src_start);
        let mut out_end = span.out_start + (src_end - span.src_start);
        if out_end <= out_start {
            out_end = out_start + 0.05;
        }

        words.push(CaptionWord {
            text: word.text.trim().to_string(),
            out_start,
            out_end: out_end.min(plan.output_duration),
        });
    }

    words.retain(|w| !w.text.is_empty());
    words.sort_by(|a, b| a.out_start.total_cmp(&b.out_start));

    let chunks = group_chunks(words, options);

    debug!(
        chunks = chunks.len(),
        output_duration = format!("{:.3}", plan.output_duration),
        "Rebased captions"
    );

    chunks
}

/// Greedy grouping: a chunk closes when it is full, when the next word
/// would stretch it past the duration cap, or when the inter-word gap is
/// too large to read as one phrase.
fn group_chunks(words: Vec<CaptionWord>, options: &CaptionOptions) -> Vec<CaptionChunk> {
    let mut chunks: Vec<CaptionChunk> = Vec::new();
    let mut current: Vec<CaptionWord> = Vec::new();

    for word in words {
        let should_break = match current.as_slice() {
            [] => false,
            chunk => {
                chunk.len() >= options.max_words_per_chunk
                    || word.out_end - chunk[0].out_start > options.max_chunk_duration_s
                    || word.out_start - chunk[chunk.len() - 1].out_end
                        > options.max_intra_chunk_gap_s
            }
        };

        if should_break {
            chunks.push(close_chunk(std::mem::take(&mut current)));
        }
        current.push(word);
    }

    if !current.is_empty() {
        chunks.push(close_chunk(current));
    }

    // Chunks must not overlap on screen; clamp words along with their
    // owning chunk so every word stays inside its chunk's times.
    for i in 0..chunks.len().saturating_sub(1) {
        if chunks[i].out_end > chunks[i + 1].out_start {
            let limit = chunks[i + 1].out_start;
            chunks[i].out_end = limit;
            for word in &mut chunks[i].words {
                word.out_end = word.out_end.min(limit);
                word.out_start = word.out_start.min(limit);
            }
        }
    }

    chunks
}

fn close_chunk(words: Vec<CaptionWord>) -> CaptionChunk {
    let out_start = words.first().map(|w| w.out_start).unwrap_or(0.0);
    let out_end = words.last().map(|w| w.out_end).unwrap_or(0.0);
    CaptionChunk {
        words,
        out_start,
        out_end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipforge_models::{
        KeptSegment, PlatformPreset, TimelineMap, TimelineSpan, TranscriptSegment, WordTiming,
    };

    fn plan_with_spans(spans: Vec<TimelineSpan>, clip_start: f64, clip_end: f64) -> EditPlan {
        let output_duration = spans.last().map(|s| s.out_end).unwrap_or(0.0);
        EditPlan {
            source_id: "s".to_string(),
            preset: PlatformPreset::Linkedin,
            clip_start,
            clip_end,
            kept_segments: spans
                .iter()
                .map(|s| KeptSegment {
                    src_start: s.src_start,
                    src_end: s.src_end,
                    lead_fade_s: 0.0,
                    trail_fade_s: 0.0,
                })
                .collect(),
            timeline: TimelineMap { spans },
            output_duration,
            silences_detected: 0,
            silences_trimmed: 0,
        }
    }

    fn transcript(words: &[(&str, f64, f64)]) -> Transcript {
        Transcript {
            segments: vec![TranscriptSegment {
                start: words.first().map(|w| w.1).unwrap_or(0.0),
                end: words.last().map(|w| w.2).unwrap_or(0.0),
                words: words
                    .iter()
                    .map(|&(text, start, end)| WordTiming {
                        text: text.to_string(),
                        start,
                        end,
                    })
                    .collect(),
            }],
        }
    }

    #[test]
    fn test_words_rebased_through_cut() {
        // Source [10, 12) and [15, 18) kept; 3s removed in between.
        let plan = plan_with_spans(
            vec![
                TimelineSpan { src_start: 10.0, src_end: 12.0, out_start: 0.0, out_end: 2.0 },
                TimelineSpan { src_start: 15.0, src_end: 18.0, out_start: 2.0, out_end: 5.0 },
            ],
            10.0,
            18.0,
        );
        let t = transcript(&[
            ("before", 10.5, 11.0),
            ("cut", 13.0, 13.5), // removed material
            ("after", 15.5, 16.0),
        ]);

        let chunks = rebase_captions(&t, &plan, &CaptionOptions::default());
        let words: Vec<&CaptionWord> = chunks.iter().flat_map(|c| c.words.iter()).collect();

        assert_eq!(words.len(), 2);
        assert!((words[0].out_start - 0.5).abs() < 1e-9);
        // "after" lands at 2.0 + 0.5 in output-time: the cut is invisible.
        assert!((words[1].out_start - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_words_outside_clip_window_dropped() {
        let plan = plan_with_spans(
            vec![TimelineSpan { src_start: 10.0, src_end: 20.0, out_start: 0.0, out_end: 10.0 }],
            10.0,
            20.0,
        );
        let t = transcript(&[("early", 5.0, 5.5), ("inside", 12.0, 12.5), ("late", 25.0, 25.5)]);

        let chunks = rebase_captions(&t, &plan, &CaptionOptions::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].words.len(), 1);
        assert_eq!(chunks[0].words[0].text, "inside");
    }

    #[test]
    fn test_chunk_word_limit() {
        let plan = plan_with_spans(
            vec![TimelineSpan { src_start: 0.0, src_end: 10.0, out_start: 0.0, out_end: 10.0 }],
            0.0,
            10.0,
        );
        let word_list: Vec<(String, f64, f64)> = (0..12)
            .map(|i| (format!("w{i}"), i as f64 * 0.4, i as f64 * 0.4 + 0.3))
            .collect();
        let refs: Vec<(&str, f64, f64)> = word_list
            .iter()
            .map(|(t, s, e)| (t.as_str(), *s, *e))
            .collect();

        let options = CaptionOptions { max_words_per_chunk: 5, ..Default::default() };
        let chunks = rebase_captions(&transcript(&refs), &plan, &options);

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.words.len() <= 5));
    }

    #[test]
    fn test_gap_forces_new_chunk() {
        let plan = plan_with_spans(
            vec![TimelineSpan { src_start: 0.0, src_end: 10.0, out_start: 0.0, out_end: 10.0 }],
            0.0,
            10.0,
        );
        let t = transcript(&[("one", 0.0, 0.3), ("two", 0.4, 0.7), ("далеко", 3.0, 3.4)]);

        let chunks = rebase_captions(&t, &plan, &CaptionOptions::default());
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_containment_invariants() {
        let plan = plan_with_spans(
            vec![
                TimelineSpan { src_start: 0.0, src_end: 4.0, out_start: 0.0, out_end: 4.0 },
                TimelineSpan { src_start: 6.0, src_end: 9.0, out_start: 3.99, out_end: 6.99 },
            ],
            0.0,
            9.0,
        );
        let t = transcript(&[
            ("a", 0.5, 1.0),
            ("b", 1.2, 1.8),
            ("c", 6.5, 7.0),
            ("d", 7.2, 8.9),
        ]);

        let chunks = rebase_captions(&t, &plan, &CaptionOptions::default());
        for pair in chunks.windows(2) {
            assert!(pair[0].out_end <= pair[1].out_start + 1e-9);
        }
        for chunk in &chunks {
            assert!(chunk.out_end <= plan.output_duration + 1e-9);
            for word in &chunk.words {
                assert!(word.out_start >= chunk.out_start - 1e-9);
                assert!(word.out_end <= chunk.out_end + 1e-9);
            }
        }
    }

    #[test]
    fn test_word_straddling_cut_clamped() {
        let plan = plan_with_spans(
            vec![
                TimelineSpan { src_start: 0.0, src_end: 2.0, out_start: 0.0, out_end: 2.0 },
                TimelineSpan { src_start: 5.0, src_end: 8.0, out_start: 2.0, out_end: 5.0 },
            ],
            0.0,
            8.0,
        );
        // Midpoint 1.9 is in the first span; the end reaches into removed
        // material and must clamp to the span edge.
        let t = transcript(&[("edge", 1.6, 2.2)]);

        let chunks = rebase_captions(&t, &plan, &CaptionOptions::default());
        let word = &chunks[0].words[0];
        assert!((word.out_start - 1.6).abs() < 1e-9);
        assert!(word.out_end <= 2.0 + 1e-9);
    }
}
