//! Word cloud of the year's most used words.

use hearth_common::{HearthError, Result};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::collections::BTreeMap;
use tracing::info;

use crate::canvas::render_png;

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 1600;
const MAX_WORDS: usize = 200;
const MAX_FONT: u32 = 160;
const MIN_FONT: u32 = 14;
const SPIRAL_STEPS: usize = 4000;
const FONT: &str = "sans-serif";

const SET3: [RGBColor; 12] = [
    RGBColor(0x8D, 0xD3, 0xC7),
    RGBColor(0xFF, 0xFF, 0xB3),
    RGBColor(0xBE, 0xBA, 0xDA),
    RGBColor(0xFB, 0x80, 0x72),
    RGBColor(0x80, 0xB1, 0xD3),
    RGBColor(0xFD, 0xB4, 0x62),
    RGBColor(0xB3, 0xDE, 0x69),
    RGBColor(0xFC, 0xCD, 0xE5),
    RGBColor(0xD9, 0xD9, 0xD9),
    RGBColor(0xBC, 0x80, 0xBD),
    RGBColor(0xCC, 0xEB, 0xC5),
    RGBColor(0xFF, 0xED, 0x6F),
];

/// A word placed on the canvas; `x`/`y` is the top-left corner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedWord {
    /// The word.
    pub word: String,
    /// Font size in pixels.
    pub size: u32,
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Box width.
    pub width: u32,
    /// Box height.
    pub height: u32,
}

impl PlacedWord {
    fn overlaps(&self, x: i32, y: i32, w: u32, h: u32) -> bool {
        x < self.x + self.width as i32
            && self.x < x + w as i32
            && y < self.y + self.height as i32
            && self.y < y + h as i32
    }
}

/// The most frequent words with their font sizes, largest first.
pub fn sized_words(words: &BTreeMap<String, u64>) -> Vec<(String, u32)> {
    let mut ranked: Vec<(&String, u64)> = words.iter().map(|(w, &n)| (w, n)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(MAX_WORDS);

    let top = ranked.first().map_or(1, |(_, n)| (*n).max(1)) as f64;
    ranked
        .into_iter()
        .map(|(word, n)| {
            let size = (f64::from(MAX_FONT) * (n as f64 / top).sqrt()).round() as u32;
            (word.clone(), size.max(MIN_FONT))
        })
        .collect()
}

/// Lay words out on an outward spiral from the centre of a `width` x `height`
/// canvas. `measure` gives a word's box at a font size; words that fit
/// nowhere are left out.
pub fn place_words<M>(words: &[(String, u32)], width: u32, height: u32, mut measure: M) -> Vec<PlacedWord>
where
    M: FnMut(&str, u32) -> Option<(u32, u32)>,
{
    let mut placed: Vec<PlacedWord> = Vec::new();
    let (cx, cy) = (f64::from(width) / 2.0, f64::from(height) / 2.0);

    for (word, size) in words {
        let Some((w, h)) = measure(word, *size) else {
            continue;
        };
        if w > width || h > height {
            continue;
        }

        let spot = (0..SPIRAL_STEPS).find_map(|step| {
            let t = step as f64 * 0.1;
            let radius = 2.0 * t;
            let x = (cx + radius * t.cos() - f64::from(w) / 2.0).round() as i32;
            let y = (cy + radius * t.sin() - f64::from(h) / 2.0).round() as i32;
            let inside = x >= 0 && y >= 0 && x + w as i32 <= width as i32 && y + h as i32 <= height as i32;
            (inside && !placed.iter().any(|p| p.overlaps(x, y, w, h))).then_some((x, y))
        });

        if let Some((x, y)) = spot {
            placed.push(PlacedWord {
                word: word.clone(),
                size: *size,
                x,
                y,
                width: w,
                height: h,
            });
        }
    }
    placed
}

/// Render the cloud for word frequencies as PNG bytes.
pub fn render_word_cloud(words: &BTreeMap<String, u64>) -> Result<Vec<u8>> {
    let sized = sized_words(words);
    if sized.is_empty() {
        return Err(HearthError::graph("No words to draw"));
    }

    let mut drawn = 0;
    let png = render_png(WIDTH, HEIGHT, |root| {
        root.fill(&BLACK)?;
        let placed = place_words(&sized, WIDTH, HEIGHT, |word, size| {
            root.estimate_text_size(word, &TextStyle::from((FONT, size).into_font())).ok()
        });

        for (i, p) in placed.iter().enumerate() {
            let style = (FONT, p.size)
                .into_font()
                .color(&SET3[i % SET3.len()])
                .pos(Pos::new(HPos::Left, VPos::Top));
            root.draw(&Text::new(p.word.as_str(), (p.x, p.y), style))?;
        }
        drawn = placed.len();
        Ok(Vec::new())
    })?;

    info!(words = drawn, "Rendered word cloud");
    Ok(png)
}
