//! Activity by hour line chart for the server wrapped.

use hearth_common::Result;
use plotters::prelude::*;
use tracing::info;

use crate::canvas::{lerp_color, render_png, BACKGROUND};

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 600;
const LOW: RGBColor = RGBColor(0, 0, 255);
const HIGH: RGBColor = RGBColor(255, 0, 0);

/// Colour of the segment starting at `hour`, from blue at midnight to red at 23:00.
fn segment_color(hour: usize) -> RGBColor {
    lerp_color(LOW, HIGH, hour as f64 / 23.0)
}

/// Upper bound of the y axis, with headroom above the busiest hour.
fn y_limit(hours: &[u64; 24]) -> f64 {
    let max = hours.iter().copied().max().unwrap_or(0);
    if max == 0 {
        1.0
    } else {
        max as f64 * 1.1
    }
}

/// Render message counts per local hour as PNG bytes.
pub fn render_activity_chart(hours: &[u64; 24], timezone_label: &str) -> Result<Vec<u8>> {
    let caption = format!("Activity by Hour ({timezone_label})");

    let png = render_png(WIDTH, HEIGHT, |root| {
        root.fill(&BACKGROUND)?;

        let mut chart = ChartBuilder::on(root)
            .caption(&caption, ("sans-serif", 30).into_font().color(&WHITE))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(0i32..23i32, 0.0..y_limit(hours))?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(24)
            .x_label_formatter(&|h| format!("{h}:00"))
            .x_desc("Hour of Day")
            .y_desc("Number of Messages")
            .axis_style(WHITE)
            .label_style(("sans-serif", 14).into_font().color(&WHITE))
            .axis_desc_style(("sans-serif", 18).into_font().color(&WHITE))
            .draw()?;

        chart.draw_series(LineSeries::new(
            (0..24).map(|h| (h, hours[h as usize] as f64)),
            WHITE.mix(0.3).stroke_width(2),
        ))?;

        for hour in 0..23 {
            let from = (hour as i32, hours[hour] as f64);
            let to = (hour as i32 + 1, hours[hour + 1] as f64);
            chart.draw_series(std::iter::once(PathElement::new(
                vec![from, to],
                segment_color(hour).stroke_width(4),
            )))?;
        }

        Ok(Vec::new())
    })?;

    info!(
        messages = hours.iter().sum::<u64>(),
        "Rendered activity by hour chart"
    );
    Ok(png)
}
