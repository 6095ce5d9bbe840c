use embedded_graphics::mono_font::{ascii, MonoFont};
use profont::{
    PROFONT_10_POINT, PROFONT_12_POINT, PROFONT_14_POINT, PROFONT_18_POINT, PROFONT_24_POINT,
    PROFONT_7_POINT, PROFONT_9_POINT,
};

use crate::{Error, Result};

/// ProFont faces, ascending by height.
const PROFONT_FACES: [&MonoFont<'static>; 7] = [
    &PROFONT_7_POINT,
    &PROFONT_9_POINT,
    &PROFONT_10_POINT,
    &PROFONT_12_POINT,
    &PROFONT_14_POINT,
    &PROFONT_18_POINT,
    &PROFONT_24_POINT,
];

/// embedded-graphics fixed ASCII faces, ascending by height.
const MONO_FACES: [&MonoFont<'static>; 9] = [
    &ascii::FONT_4X6,
    &ascii::FONT_5X7,
    &ascii::FONT_5X8,
    &ascii::FONT_6X9,
    &ascii::FONT_6X10,
    &ascii::FONT_6X12,
    &ascii::FONT_7X14,
    &ascii::FONT_9X18,
    &ascii::FONT_10X20,
];

/// Bitmap text families available to `fonts.text_font`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFamily {
    ProFont,
    Mono,
}

impl FontFamily {
    /// Font file names (`*.ttf`, `*.otf`) map onto ProFont, the closest built-in face.
    pub fn from_name(name: &str) -> Result<Self> {
        let normalized = name.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "profont" => Ok(FontFamily::ProFont),
            "mono" | "ascii" => Ok(FontFamily::Mono),
            other if other.ends_with(".ttf") || other.ends_with(".otf") => Ok(FontFamily::ProFont),
            _ => Err(Error::Config(format!(
                "fonts.text_font '{name}' is not available (use 'profont' or 'mono')"
            ))),
        }
    }

    fn faces(self) -> &'static [&'static MonoFont<'static>] {
        match self {
            FontFamily::ProFont => &PROFONT_FACES,
            FontFamily::Mono => &MONO_FACES,
        }
    }

    /// Tallest face whose glyph height fits in `size` pixels and that lays out
    /// `chars` characters within `max_width`; the smallest face when none fits.
    pub fn select(self, size: u32, chars: u32, max_width: u32) -> &'static MonoFont<'static> {
        let faces = self.faces();
        faces
            .iter()
            .rev()
            .find(|face| face.character_size.height <= size && text_width(face, chars) <= max_width)
            .copied()
            .unwrap_or(faces[0])
    }
}

/// Pixel width of `chars` characters set in `face`.
pub fn text_width(face: &MonoFont<'_>, chars: u32) -> u32 {
    match chars {
        0 => 0,
        n => n * face.character_size.width + (n - 1) * face.character_spacing,
    }
}

/// Icon font names rendered with the built-in glyph bitmaps.
pub fn icon_font_supported(name: &str) -> bool {
    let normalized = name.trim().to_ascii_lowercase();
    normalized == "builtin" || normalized.ends_with(".ttf") || normalized.ends_with(".otf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_family_names() {
        assert_eq!(FontFamily::from_name("ProFont").unwrap(), FontFamily::ProFont);
        assert_eq!(FontFamily::from_name("mono").unwrap(), FontFamily::Mono);
        assert_eq!(
            FontFamily::from_name("DejaVuSans.ttf").unwrap(),
            FontFamily::ProFont
        );
        let err = FontFamily::from_name("comic").unwrap_err();
        assert!(format!("{err}").contains("comic"));
    }

    #[test]
    fn selected_face_fits_requested_height() {
        for family in [FontFamily::ProFont, FontFamily::Mono] {
            for size in [12, 16, 24] {
                let face = family.select(size, 0, u32::MAX);
                assert!(face.character_size.height <= size, "{family:?} {size}");
            }
        }
    }

    #[test]
    fn larger_request_never_picks_smaller_face() {
        let small = FontFamily::ProFont.select(16, 0, u32::MAX);
        let large = FontFamily::ProFont.select(24, 0, u32::MAX);
        assert!(large.character_size.height >= small.character_size.height);
    }

    #[test]
    fn width_limit_steps_down_to_a_narrower_face() {
        let tall = FontFamily::ProFont.select(16, 0, u32::MAX);
        let fitted = FontFamily::ProFont.select(16, 18, 112);
        assert!(text_width(tall, 18) > 112);
        assert!(text_width(fitted, 18) <= 112);
        assert!(fitted.character_size.height <= 16);
    }

    #[test]
    fn impossible_width_falls_back_to_smallest() {
        let face = FontFamily::Mono.select(16, 100, 10);
        assert_eq!(face.character_size, ascii::FONT_4X6.character_size);
    }

    #[test]
    fn tiny_request_falls_back_to_smallest() {
        let face = FontFamily::Mono.select(1, 0, u32::MAX);
        assert_eq!(face.character_size, ascii::FONT_4X6.character_size);
    }

    #[test]
    fn icon_font_names() {
        assert!(icon_font_supported("builtin"));
        assert!(icon_font_supported("la-solid-900.ttf"));
        assert!(!icon_font_supported("wingdings"));
    }
}
