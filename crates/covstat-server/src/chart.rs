//! SVG line charts for time-series answers.
//!
//! Each chart is written to `<chart_dir>/graph_<request_id>_<insight>.svg`.
//! The request id is reduced to `[A-Za-z0-9_-]` first, so a caller-supplied
//! id can never escape the chart directory.

use std::{fmt::Write as _, path::PathBuf};

use covstat_core::{
  RenderError,
  source::{Chart, ChartRenderer},
};
use tracing::debug;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 450.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 60.0;

#[derive(Debug, Clone)]
pub struct SvgChartRenderer {
  dir: PathBuf,
}

impl SvgChartRenderer {
  pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

  pub fn file_name(chart: &Chart, request_id: &str) -> String {
    format!(
      "graph_{}_{}.svg",
      sanitize(request_id),
      chart.insight.phrase().replace(' ', "_")
    )
  }
}

impl ChartRenderer for SvgChartRenderer {
  async fn render_time_series<'a>(
    &'a self,
    chart: &'a Chart,
    request_id: &'a str,
  ) -> Result<String, RenderError> {
    if chart.points.is_empty() {
      return Err(RenderError::EmptySeries);
    }

    let svg = draw(chart);
    tokio::fs::create_dir_all(&self.dir).await?;
    let path = self.dir.join(Self::file_name(chart, request_id));
    tokio::fs::write(&path, svg).await?;

    debug!(path = %path.display(), points = chart.points.len(), "wrote chart");
    Ok(path.to_string_lossy().into_owned())
  }
}

fn sanitize(request_id: &str) -> String {
  let clean: String = request_id
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
    .collect();
  if clean.is_empty() { "request".to_owned() } else { clean }
}

fn escape(text: &str) -> String {
  text
    .replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
    .replace('"', "&quot;")
}

/// Render `chart` as a standalone SVG document. `chart.points` is non-empty.
fn draw(chart: &Chart) -> String {
  let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
  let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
  let max = chart.points.iter().map(|p| p.value).max().unwrap_or(0).max(1) as f64;
  let last = chart.points.len().saturating_sub(1).max(1) as f64;

  let coords: Vec<(f64, f64)> = chart
    .points
    .iter()
    .enumerate()
    .map(|(i, p)| {
      let x = if chart.points.len() == 1 {
        MARGIN_LEFT + plot_w / 2.0
      } else {
        MARGIN_LEFT + plot_w * i as f64 / last
      };
      let y = MARGIN_TOP + plot_h * (1.0 - p.value as f64 / max);
      (x, y)
    })
    .collect();

  let mut svg = String::new();
  // Writing to a String cannot fail.
  let _ = write!(
    svg,
    r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
  );
  let _ = write!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
  let _ = write!(
    svg,
    r#"<text x="{}" y="30" font-family="sans-serif" font-size="18" text-anchor="middle">{}</text>"#,
    WIDTH / 2.0,
    escape(&chart.title)
  );

  let (x0, y0, x1, y1) = (MARGIN_LEFT, MARGIN_TOP, MARGIN_LEFT + plot_w, MARGIN_TOP + plot_h);
  let _ = write!(
    svg,
    r#"<path d="M{x0:.1},{y0:.1} L{x0:.1},{y1:.1} L{x1:.1},{y1:.1}" fill="none" stroke="black"/>"#
  );
  let _ = write!(
    svg,
    r#"<text x="{:.1}" y="{y0:.1}" font-family="sans-serif" font-size="12" text-anchor="end">{}</text>"#,
    x0 - 8.0,
    max as u64
  );
  let _ = write!(
    svg,
    r#"<text x="{:.1}" y="{y1:.1}" font-family="sans-serif" font-size="12" text-anchor="end">0</text>"#,
    x0 - 8.0
  );

  if let (Some(first), Some(last)) = (chart.points.first(), chart.points.last()) {
    let _ = write!(
      svg,
      r#"<text x="{x0:.1}" y="{:.1}" font-family="sans-serif" font-size="12">{}</text>"#,
      y1 + 20.0,
      first.date
    );
    let _ = write!(
      svg,
      r#"<text x="{x1:.1}" y="{:.1}" font-family="sans-serif" font-size="12" text-anchor="end">{}</text>"#,
      y1 + 20.0,
      last.date
    );
  }

  let line = coords
    .iter()
    .map(|(x, y)| format!("{x:.1},{y:.1}"))
    .collect::<Vec<_>>()
    .join(" ");
  let _ = write!(
    svg,
    r#"<polyline points="{line}" fill="none" stroke="steelblue" stroke-width="2"/>"#
  );
  svg.push_str("</svg>\n");
  svg
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use covstat_core::{
    query::{Insight, Scope},
    record::SeriesPoint,
  };

  use super::*;

  fn chart(points: Vec<SeriesPoint>) -> Chart {
    Chart {
      title: "total cases in Trinidad & Tobago".into(),
      insight: Insight::TotalCases,
      scope: Scope::Country("Trinidad & Tobago".into()),
      points,
    }
  }

  fn point(d: u32, value: u64) -> SeriesPoint {
    SeriesPoint { date: NaiveDate::from_ymd_opt(2020, 3, d).unwrap(), value }
  }

  fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("covstat-charts-{}", uuid::Uuid::new_v4()))
  }

  #[test]
  fn request_ids_are_made_filename_safe() {
    assert_eq!(sanitize("abc-123_X"), "abc-123_X");
    assert_eq!(sanitize("../../etc/passwd"), "______etc_passwd");
    assert_eq!(sanitize(""), "request");
  }

  #[test]
  fn file_name_includes_request_and_insight() {
    let name = SvgChartRenderer::file_name(&chart(vec![point(1, 1)]), "r/1");
    assert_eq!(name, "graph_r_1_total_cases.svg");
  }

  #[test]
  fn svg_escapes_title_and_draws_every_point() {
    let svg = draw(&chart(vec![point(1, 0), point(2, 5), point(3, 10)]));
    assert!(svg.contains("Trinidad &amp; Tobago"));
    assert!(svg.contains("2020-03-01"));
    assert!(svg.contains("2020-03-03"));
    let polyline = svg.split("points=\"").nth(1).unwrap().split('"').next().unwrap();
    assert_eq!(polyline.split(' ').count(), 3);
  }

  #[tokio::test]
  async fn render_writes_file_into_chart_dir() {
    let dir = temp_dir();
    let renderer = SvgChartRenderer::new(&dir);
    let c = chart(vec![point(1, 3)]);

    let artifact = renderer.render_time_series(&c, "req-1").await.unwrap();
    assert!(artifact.ends_with("graph_req-1_total_cases.svg"));
    let body = std::fs::read_to_string(&artifact).unwrap();
    assert!(body.starts_with("<svg"));

    let _ = std::fs::remove_dir_all(&dir);
  }

  #[tokio::test]
  async fn empty_series_is_refused() {
    let renderer = SvgChartRenderer::new(temp_dir());
    let err = renderer.render_time_series(&chart(vec![]), "r").await.unwrap_err();
    assert!(matches!(err, RenderError::EmptySeries));
  }
}
