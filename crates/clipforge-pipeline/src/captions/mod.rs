//! Caption timing and ASS subtitle generation.
//!
//! Word timestamps are rebased from source-time into output-time through
//! the plan's timeline map, the same map the audio assembler and the
//! renderer consume, so captions cannot drift from speech no matter how
//! many silences were cut.

mod ass;
mod style;
mod timer;

pub use ass::{render_ass, subtitles_filter_path};
pub use style::{CaptionStyle, HighlightStyle};
pub use timer::{rebase_captions, CaptionOptions};
