//! Per-platform caption styling.

use clipforge_models::ExportFormat;

/// Word highlighting mode for the karaoke effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightStyle {
    /// No per-word highlighting.
    None,
    /// Colour sweep across the current word (`\kf`).
    ColorSweep,
}

/// Complete caption styling for one platform.
///
/// Colours are in ASS `&HAABBGGRR` form; sizes assume the format's native
/// output resolution.
#[derive(Debug, Clone)]
pub struct CaptionStyle {
    pub font_name: &'static str,
    pub font_size: u32,
    pub bold: bool,

    pub primary_color: &'static str,
    pub secondary_color: &'static str,
    pub outline_color: &'static str,
    pub back_color: &'static str,

    pub outline_width: f32,
    pub shadow_depth: f32,

    pub margin_left: u32,
    pub margin_right: u32,
    pub margin_vertical: u32,
    /// ASS alignment (numpad layout: 2 = bottom-centre, 5 = centre).
    pub alignment: u8,

    pub highlight: HighlightStyle,
    pub fade_in_ms: u32,
    pub fade_out_ms: u32,
}

impl CaptionStyle {
    /// Style for an export format.
    pub fn for_format(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Tiktok => Self {
                font_name: "Montserrat",
                font_size: 72,
                bold: true,
                primary_color: "&H00FFFFFF",
                secondary_color: "&H0000FFFF",
                outline_color: "&H00000000",
                back_color: "&H80000000",
                outline_width: 3.0,
                shadow_depth: 1.5,
                margin_left: 80,
                margin_right: 80,
                margin_vertical: 450,
                alignment: 5,
                highlight: HighlightStyle::ColorSweep,
                fade_in_ms: 0,
                fade_out_ms: 100,
            },
            ExportFormat::YoutubeShorts => Self {
                font_size: 68,
                ..Self::for_format(ExportFormat::Tiktok)
            },
            ExportFormat::InstagramReels => Self {
                font_size: 70,
                secondary_color: "&H0000BFFF",
                margin_vertical: 430,
                ..Self::for_format(ExportFormat::Tiktok)
            },
            ExportFormat::Linkedin => Self {
                font_name: "Helvetica Neue",
                font_size: 56,
                bold: true,
                primary_color: "&H00FFFFFF",
                secondary_color: "&H00FFCC00",
                outline_color: "&H00000000",
                back_color: "&H60000000",
                outline_width: 2.5,
                shadow_depth: 1.0,
                margin_left: 60,
                margin_right: 60,
                margin_vertical: 120,
                alignment: 2,
                highlight: HighlightStyle::ColorSweep,
                fade_in_ms: 50,
                fade_out_ms: 50,
            },
            ExportFormat::LinkedinSquare => Self {
                font_size: 52,
                ..Self::for_format(ExportFormat::Linkedin)
            },
        }
    }

    /// Emit the `[V4+ Styles]` line for this style.
    ///
    /// Format: Name,Fontname,Fontsize,PrimaryColour,SecondaryColour,
    /// OutlineColour,BackColour,Bold,Italic,Underline,StrikeOut,ScaleX,
    /// ScaleY,Spacing,Angle,BorderStyle,Outline,Shadow,Alignment,MarginL,
    /// MarginR,MarginV,Encoding
    pub fn to_ass_style(&self, name: &str) -> String {
        let bold = if self.bold { -1 } else { 0 };
        format!(
            "Style: {name},{font},{size},{primary},{secondary},{outline},{back},\
             {bold},0,0,0,100,100,0,0,1,{outline_w},{shadow},{align},{ml},{mr},{mv},1",
            font = self.font_name,
            size = self.font_size,
            primary = self.primary_color,
            secondary = self.secondary_color,
            outline = self.outline_color,
            back = self.back_color,
            bold = bold,
            outline_w = self.outline_width,
            shadow = self.shadow_depth,
            align = self.alignment,
            ml = self.margin_left,
            mr = self.margin_right,
            mv = self.margin_vertical,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_format_has_a_style() {
        for format in ExportFormat::ALL {
            let style = CaptionStyle::for_format(*format);
            assert!(style.font_size > 0);
            assert!(style.alignment >= 1 && style.alignment <= 9);
        }
    }

    #[test]
    fn test_vertical_formats_center_captions() {
        assert_eq!(CaptionStyle::for_format(ExportFormat::Tiktok).alignment, 5);
        assert_eq!(CaptionStyle::for_format(ExportFormat::Linkedin).alignment, 2);
    }

    #[test]
    fn test_ass_style_line_shape() {
        let line = CaptionStyle::for_format(ExportFormat::Tiktok).to_ass_style("Default");
        assert!(line.starts_with("Style: Default,Montserrat,72,"));
        // 22 commas separate the 23 fields.
        assert_eq!(line.matches(',').count(), 22);
    }
}
