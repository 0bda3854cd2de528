//! Transcript input and caption output types.

use serde::{Deserialize, Serialize};

/// Word-level transcript as delivered by the transcription provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    /// Iterate all words across segments in order.
    pub fn words(&self) -> impl Iterator<Item = &WordTiming> {
        self.segments.iter().flat_map(|s| s.words.iter())
    }
}

/// A provider segment grouping consecutive words.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptSegment {
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub end: f64,
    #[serde(default)]
    pub words: Vec<WordTiming>,
}

/// A single transcribed word with source-time bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    #[serde(alias = "word")]
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl WordTiming {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Source-time midpoint, used to locate the word in the timeline map.
    pub fn midpoint(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

/// A word rebased into output-time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionWord {
    pub text: String,
    pub out_start: f64,
    pub out_end: f64,
}

impl CaptionWord {
    pub fn duration(&self) -> f64 {
        self.out_end - self.out_start
    }
}

/// A group of words displayed together, in output-time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionChunk {
    pub words: Vec<CaptionWord>,
    pub out_start: f64,
    pub out_end: f64,
}

impl CaptionChunk {
    /// Display text of the chunk.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn duration(&self) -> f64 {
        self.out_end - self.out_start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_alias_deserialization() {
        // Whisper-style transcripts use "word" rather than "text".
        let w: WordTiming =
            serde_json::from_str(r#"{"word": "hello", "start": 1.0, "end": 1.4}"#).unwrap();
        assert_eq!(w.text, "hello");
        assert!((w.midpoint() - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_chunk_text() {
        let chunk = CaptionChunk {
            words: vec![
                CaptionWord {
                    text: "hello".to_string(),
                    out_start: 0.0,
                    out_end: 0.4,
                },
                CaptionWord {
                    text: "world".to_string(),
                    out_start: 0.5,
                    out_end: 0.9,
                },
            ],
            out_start: 0.0,
            out_end: 0.9,
        };
        assert_eq!(chunk.text(), "hello world");
    }
}
