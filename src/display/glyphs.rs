/// Built-in icon font: 8x8 bitmaps for the Font Awesome codepoints the default
/// icon table (and common overrides) use. Rows top to bottom, MSB on the left.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Glyph {
    Desktop,
    Wifi,
    NetworkWired,
    Sitemap,
    PowerOff,
    Bolt,
    Fire,
    ThermometerHalf,
    Tasks,
    Warning,
    Hdd,
}

impl Glyph {
    pub fn from_codepoint(ch: char) -> Option<Self> {
        match ch {
            '\u{f108}' => Some(Glyph::Desktop),
            '\u{f1eb}' => Some(Glyph::Wifi),
            '\u{f6ff}' => Some(Glyph::NetworkWired),
            '\u{f0e8}' => Some(Glyph::Sitemap),
            '\u{f011}' => Some(Glyph::PowerOff),
            '\u{f0e7}' => Some(Glyph::Bolt),
            '\u{f06d}' => Some(Glyph::Fire),
            '\u{f2c9}' => Some(Glyph::ThermometerHalf),
            '\u{f0ae}' => Some(Glyph::Tasks),
            '\u{f071}' => Some(Glyph::Warning),
            '\u{f0a0}' => Some(Glyph::Hdd),
            _ => None,
        }
    }

    pub fn bitmap(&self) -> [u8; 8] {
        match self {
            Glyph::Desktop => [0xff, 0x81, 0x81, 0x81, 0xff, 0x18, 0x3c, 0x00],
            Glyph::Wifi => [0x7e, 0x81, 0x3c, 0x42, 0x18, 0x24, 0x00, 0x18],
            Glyph::NetworkWired => [0x3c, 0x3c, 0x18, 0xff, 0x81, 0x81, 0xe7, 0xe7],
            Glyph::Sitemap => [0x3c, 0x3c, 0x18, 0x7e, 0x42, 0xe7, 0xe7, 0x00],
            Glyph::PowerOff => [0x18, 0x5a, 0x99, 0x99, 0x81, 0x81, 0x42, 0x3c],
            Glyph::Bolt => [0x0c, 0x18, 0x30, 0x7e, 0x0c, 0x18, 0x30, 0x20],
            Glyph::Fire => [0x10, 0x38, 0x3c, 0x7e, 0xf7, 0xe7, 0x66, 0x3c],
            Glyph::ThermometerHalf => [0x18, 0x24, 0x24, 0x3c, 0x3c, 0x7e, 0x7e, 0x3c],
            Glyph::Tasks => [0xdf, 0x00, 0xdf, 0x00, 0xdf, 0x00, 0xdf, 0x00],
            Glyph::Warning => [0x18, 0x24, 0x24, 0x5a, 0x5a, 0x81, 0x99, 0xff],
            Glyph::Hdd => [0x00, 0x7e, 0x42, 0x42, 0xff, 0x81, 0x85, 0xff],
        }
    }
}

/// Bitmap for a configured glyph; codepoints outside the built-in set draw nothing.
pub fn bitmap_for(ch: char) -> Option<[u8; 8]> {
    Glyph::from_codepoint(ch).map(|glyph| glyph.bitmap())
}
