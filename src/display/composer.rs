//! Pure frame layout: snapshot + icon states + rotation phase in, pixels out.
//!
//! Four text lines split the panel height evenly. Every line reserves an icon
//! column of `icon_size + 2` pixels whether or not icons are drawn, so turning
//! icons off never moves text.

use std::collections::BTreeMap;

use embedded_graphics::{
    mono_font::{MonoFont, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::Point,
    text::{Baseline, Text},
    Drawable,
};

use super::{
    fonts::{icon_font_supported, text_width, FontFamily},
    glyphs::bitmap_for,
    icons::{IconStates, Metric},
    rotation::RotationPhase,
    Frame,
};
use crate::{
    config::Config,
    metrics::{MetricSnapshot, Usage, PLACEHOLDER},
    Result,
};

const REFERENCE_WIDTH: u32 = 128;
const REFERENCE_HEIGHT: u32 = 64;
const TEMP_COLUMN_X: u32 = 75;
const LINES: u32 = 4;
const GLYPH_PX: u32 = 8;
const OFFLINE_MARGIN_X: u32 = 10;
const OFFLINE_HOST_Y: u32 = 8;
const OFFLINE_STATUS_Y: u32 = 32;
const OFFLINE_TEXT: &str = "OFFLINE";
const OFFLINE_ICON: &str = "offline";
/// Widest stats line the text face must fit: `117.2/117.2GB 100%`.
const WIDEST_LINE_CHARS: u32 = 18;

pub fn format_load(load: f64) -> String {
    format!("{load:.2}")
}

pub fn format_temperature(celsius: f64) -> String {
    format!("{celsius:.0}C")
}

/// `used/totalGB pct%` with one decimal on the sizes and a rounded percentage.
pub fn format_usage(usage: &Usage) -> String {
    format!(
        "{:.1}/{:.1}GB {}%",
        usage.used_gb(),
        usage.total_gb(),
        usage.percent().round() as i64
    )
}

/// Text content of one stats frame, before layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTexts {
    pub identity: String,
    pub load: String,
    pub temperature: String,
    pub memory: String,
    pub disk: String,
}

impl LineTexts {
    pub fn from_snapshot(snapshot: &MetricSnapshot, phase: RotationPhase) -> Self {
        let identity = match phase {
            RotationPhase::Hostname => snapshot.hostname.as_deref(),
            RotationPhase::Lan => snapshot.lan_ip.as_deref(),
            RotationPhase::Wifi => snapshot.wifi_ip.as_deref(),
        };
        Self {
            identity: identity.unwrap_or(PLACEHOLDER).to_string(),
            load: format_load(snapshot.load),
            temperature: format_temperature(snapshot.temperature_c),
            memory: format_usage(&snapshot.memory),
            disk: format_usage(&snapshot.disk),
        }
    }
}

#[derive(Clone)]
pub struct FrameComposer {
    width: u32,
    height: u32,
    text_font: &'static MonoFont<'static>,
    large_font: &'static MonoFont<'static>,
    /// Resolved bitmaps by icon key; empty when icons are disabled.
    icons: BTreeMap<String, [u8; 8]>,
    icon_scale: u32,
    icon_slot: u32,
    large_icon_scale: u32,
    large_icon_slot: u32,
    line_height: u32,
    temp_x: u32,
}

impl FrameComposer {
    /// Fails only when the configured text font cannot be resolved.
    pub fn new(config: &Config) -> Result<Self> {
        let fonts = &config.fonts;
        let family = FontFamily::from_name(&fonts.text_font)?;
        let icons = if fonts.icons_enabled() && icon_font_supported(&fonts.icon_font) {
            config
                .icons
                .keys()
                .filter_map(|key| {
                    let bitmap = config.icon(key).and_then(bitmap_for)?;
                    Some((key.clone(), bitmap))
                })
                .collect()
        } else {
            BTreeMap::new()
        };

        let width = config.display.width;
        let height = config.display.height;
        let icon_slot = fonts.icon_size.saturating_add(2);
        let large_icon_slot = fonts.text_size_large.saturating_add(2);
        let text_room = width.saturating_sub(icon_slot);
        let large_room = width.saturating_sub(OFFLINE_MARGIN_X.saturating_add(large_icon_slot));
        Ok(Self {
            width,
            height,
            text_font: family.select(fonts.text_size, WIDEST_LINE_CHARS, text_room),
            large_font: family.select(
                fonts.text_size_large,
                OFFLINE_TEXT.len() as u32,
                large_room,
            ),
            icons,
            icon_scale: (fonts.icon_size / GLYPH_PX).max(1),
            icon_slot,
            large_icon_scale: (fonts.text_size_large / GLYPH_PX).max(1),
            large_icon_slot,
            line_height: height / LINES,
            temp_x: TEMP_COLUMN_X * width / REFERENCE_WIDTH,
        })
    }

    pub fn icons_enabled(&self) -> bool {
        !self.icons.is_empty()
    }

    pub fn blank(&self) -> Frame {
        Frame::new(self.width, self.height)
    }

    /// Lay out one stats frame:
    ///
    /// ```text
    /// [id]  hostname | lan ip | wifi ip
    /// [ld]  load          [tp] temp
    /// [mem] used/totalGB pct%
    /// [dsk] used/totalGB pct%
    /// ```
    pub fn compose(
        &self,
        snapshot: &MetricSnapshot,
        states: &IconStates,
        phase: RotationPhase,
    ) -> Frame {
        let texts = LineTexts::from_snapshot(snapshot, phase);
        let mut frame = self.blank();
        let text_x = self.icon_slot;

        let y = self.row_y(0);
        self.draw_icon(&mut frame, phase.icon_key(), 0, y);
        self.draw_text(&mut frame, &texts.identity, text_x, y, self.text_font);

        let y = self.row_y(1);
        self.draw_icon(&mut frame, Metric::Load.icon_key(states.load), 0, y);
        self.draw_text(&mut frame, &texts.load, text_x, y, self.text_font);
        let temp_key = Metric::Temperature.icon_key(states.temperature);
        self.draw_icon(&mut frame, temp_key, self.temp_x, y);
        self.draw_text(
            &mut frame,
            &texts.temperature,
            self.temp_x + self.icon_slot,
            y,
            self.text_font,
        );

        let y = self.row_y(2);
        self.draw_icon(&mut frame, Metric::Memory.icon_key(states.memory), 0, y);
        self.draw_text(&mut frame, &texts.memory, text_x, y, self.text_font);

        let y = self.row_y(3);
        self.draw_icon(&mut frame, Metric::Disk.icon_key(states.disk), 0, y);
        self.draw_text(&mut frame, &texts.disk, text_x, y, self.text_font);

        frame
    }

    /// Terminal frame: hostname on top, then the offline icon and `OFFLINE` in
    /// the large face.
    pub fn compose_offline(&self, hostname: &str) -> Frame {
        let mut frame = self.blank();
        let host_y = OFFLINE_HOST_Y * self.height / REFERENCE_HEIGHT;
        let status_y = OFFLINE_STATUS_Y * self.height / REFERENCE_HEIGHT;

        self.draw_text(&mut frame, hostname, OFFLINE_MARGIN_X, host_y, self.text_font);
        if let Some(bitmap) = self.icons.get(OFFLINE_ICON) {
            draw_bitmap(
                &mut frame,
                bitmap,
                OFFLINE_MARGIN_X,
                status_y,
                self.large_icon_scale,
            );
        }
        self.draw_text(
            &mut frame,
            OFFLINE_TEXT,
            OFFLINE_MARGIN_X + self.large_icon_slot,
            status_y,
            self.large_font,
        );
        frame
    }

    fn row_y(&self, line: u32) -> u32 {
        line * self.line_height
    }

    /// Icons are vertically centred in their line; unresolved keys draw nothing.
    fn draw_icon(&self, frame: &mut Frame, key: &str, x: u32, line_y: u32) {
        let Some(bitmap) = self.icons.get(key) else {
            return;
        };
        let size = GLYPH_PX * self.icon_scale;
        let y = line_y + self.line_height.saturating_sub(size) / 2;
        draw_bitmap(frame, bitmap, x, y, self.icon_scale);
    }

    fn draw_text(&self, frame: &mut Frame, text: &str, x: u32, y: u32, font: &MonoFont<'_>) {
        let style = MonoTextStyle::new(font, BinaryColor::On);
        let origin = Point::new(x as i32, y as i32);
        // Drawing into a Frame cannot fail; out-of-bounds pixels are clipped.
        let _ = Text::with_baseline(text, origin, style, Baseline::Top).draw(frame);
    }
}

fn draw_bitmap(frame: &mut Frame, bitmap: &[u8; 8], x: u32, y: u32, scale: u32) {
    for (row, bits) in bitmap.iter().enumerate() {
        for col in 0..GLYPH_PX {
            if bits & (0x80 >> col) == 0 {
                continue;
            }
            let px = x + col * scale;
            let py = y + row as u32 * scale;
            for dy in 0..scale {
                for dx in 0..scale {
                    frame.set_pixel(px + dx, py + dy, true);
                }
            }
        }
    }
}
