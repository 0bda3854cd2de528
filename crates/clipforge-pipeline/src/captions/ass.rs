//! ASS subtitle emission with karaoke word highlighting.

use clipforge_models::{CaptionChunk, FormatSpec};

use super::style::{CaptionStyle, HighlightStyle};

/// Render caption chunks as a complete ASS file.
pub fn render_ass(chunks: &[CaptionChunk], style: &CaptionStyle, spec: &FormatSpec) -> String {
    let mut lines = vec![header(style, spec)];
    for chunk in chunks {
        lines.push(dialogue_line(chunk, style));
    }
    lines.join("\n") + "\n"
}

fn header(style: &CaptionStyle, spec: &FormatSpec) -> String {
    format!(
        "[Script Info]\n\
         Title: Captions\n\
         ScriptType: v4.00+\n\
         WrapStyle: 0\n\
         ScaledBorderAndShadow: yes\n\
         YCbCr Matrix: TV.709\n\
         PlayResX: {width}\n\
         PlayResY: {height}\n\
         \n\
         [V4+ Styles]\n\
         Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, \
         BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, \
         BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n\
         {style_line}\n\
         \n\
         [Events]\n\
         Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text",
        width = spec.width,
        height = spec.height,
        style_line = style.to_ass_style("Default"),
    )
}

fn dialogue_line(chunk: &CaptionChunk, style: &CaptionStyle) -> String {
    let mut text = karaoke_text(chunk, style);

    if style.fade_in_ms > 0 || style.fade_out_ms > 0 {
        text = format!("{{\\fad({},{})}}{}", style.fade_in_ms, style.fade_out_ms, text);
    }

    format!(
        "Dialogue: 0,{start},{end},Default,,0,0,0,,{text}",
        start = format_time(chunk.out_start),
        end = format_time(chunk.out_end),
    )
}

/// `\kf` sweeps the secondary colour across each word for its duration,
/// measured in centiseconds.
fn karaoke_text(chunk: &CaptionChunk, style: &CaptionStyle) -> String {
    match style.highlight {
        HighlightStyle::None => chunk.text(),
        HighlightStyle::ColorSweep => chunk
            .words
            .iter()
            .map(|w| {
                let duration_cs = (w.duration() * 100.0).round().max(0.0) as u64;
                format!("{{\\kf{duration_cs}}}{}", w.text)
            })
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// ASS timestamp: `h:mm:ss.cc` (centiseconds).
fn format_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let hours = (seconds / 3600.0) as u64;
    let minutes = ((seconds % 3600.0) / 60.0) as u64;
    let secs = seconds % 60.0;
    format!("{hours}:{minutes:02}:{secs:05.2}")
}

/// Escape an ASS file path for use inside a `subtitles=` filter argument.
pub fn subtitles_filter_path(path: &str) -> String {
    path.replace('\\', "\\\\").replace(':', "\\:")
}
