//! Horizontal message-count bars, one per member, with avatars at the bar ends.

use hearth_common::{HearthError, Result};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::info;

use crate::avatar::Avatar;
use crate::canvas::{render_png, Overlay, BACKGROUND, FALLBACK_BAR};

const WIDTH: u32 = 1200;
const MIN_HEIGHT: u32 = 600;
const ROW_HEIGHT: u32 = 50;

/// Side length of the avatar drawn at each bar end.
pub const AVATAR_SIZE: u32 = 40;

/// One member's bar.
#[derive(Debug, Clone)]
pub struct UserBar {
    /// Axis label.
    pub name: String,
    /// Messages sent this year.
    pub count: u64,
    /// Avatar; its average colour also fills the bar.
    pub avatar: Option<Avatar>,
}

impl UserBar {
    fn color(&self) -> RGBColor {
        self.avatar
            .as_ref()
            .map_or(FALLBACK_BAR, Avatar::average_color)
    }
}

fn chart_height(rows: usize) -> u32 {
    (rows as u32 * ROW_HEIGHT).max(MIN_HEIGHT)
}

/// Bars ordered so the busiest member ends up on top.
fn ascending(bars: &[UserBar]) -> Vec<&UserBar> {
    let mut sorted: Vec<&UserBar> = bars.iter().collect();
    sorted.sort_by(|a, b| a.count.cmp(&b.count).then_with(|| b.name.cmp(&a.name)));
    sorted
}

/// Render the bars as PNG bytes.
pub fn render_message_counts(bars: &[UserBar]) -> Result<Vec<u8>> {
    if bars.is_empty() {
        return Err(HearthError::graph("No message counts to draw"));
    }

    let sorted = ascending(bars);
    let rows = sorted.len() as i32;
    let max = sorted.last().map_or(1, |b| b.count.max(1));
    let x_limit = max as f64 * 1.2;

    let png = render_png(WIDTH, chart_height(sorted.len()), |root| {
        root.fill(&BACKGROUND)?;

        let mut chart = ChartBuilder::on(root)
            .caption("Message Counts by User", ("sans-serif", 30).into_font().color(&WHITE))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(180)
            .build_cartesian_2d(0.0..x_limit, (0..rows).into_segmented())?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .light_line_style(TRANSPARENT)
            .bold_line_style(WHITE.mix(0.15))
            .y_labels(sorted.len())
            .y_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) => sorted
                    .get(*i as usize)
                    .map(|b| b.name.clone())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .x_desc("Number of Messages")
            .axis_style(WHITE)
            .label_style(("sans-serif", 16).into_font().color(&WHITE))
            .axis_desc_style(("sans-serif", 18).into_font().color(&WHITE))
            .draw()?;

        chart.draw_series(sorted.iter().enumerate().map(|(i, bar)| {
            let i = i as i32;
            let mut rect = Rectangle::new(
                [(0.0, SegmentValue::Exact(i)), (bar.count as f64, SegmentValue::Exact(i + 1))],
                bar.color().filled(),
            );
            rect.set_margin(6, 6, 0, 0);
            rect
        }))?;

        let count_style = ("sans-serif", 16)
            .into_font()
            .color(&WHITE)
            .pos(Pos::new(HPos::Left, VPos::Center));
        let mut overlays = Vec::new();
        for (i, bar) in sorted.iter().enumerate() {
            let end = chart.backend_coord(&(bar.count as f64, SegmentValue::CenterOf(i as i32)));
            let text_x = match &bar.avatar {
                Some(avatar) => {
                    let half = AVATAR_SIZE as i32 / 2;
                    overlays.push(Overlay {
                        avatar,
                        center: (end.0 + half + 4, end.1),
                    });
                    end.0 + AVATAR_SIZE as i32 + 12
                }
                None => end.0 + 8,
            };
            root.draw(&Text::new(bar.count.to_string(), (text_x, end.1), count_style.clone()))?;
        }

        Ok(overlays)
    })?;

    info!(members = bars.len(), "Rendered message count chart");
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(name: &str, count: u64) -> UserBar {
        UserBar {
            name: name.to_string(),
            count,
            avatar: None,
        }
    }

    #[test]
    fn test_busiest_member_is_last() {
        let bars = vec![bar("ana", 40), bar("bo", 300), bar("cy", 7)];
        let names: Vec<&str> = ascending(&bars).iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["cy", "ana", "bo"]);
    }

    #[test]
    fn test_height_grows_with_members() {
        assert_eq!(chart_height(3), MIN_HEIGHT);
        assert_eq!(chart_height(20), 1000);
    }

    #[test]
    fn test_bar_colour_falls_back_without_avatar() {
        assert_eq!(bar("ana", 1).color(), FALLBACK_BAR);
    }

    #[test]
    fn test_empty_bars_are_an_error() {
        assert!(render_message_counts(&[]).is_err());
    }
}
