use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::common::config::GapSettings;
use crate::layout_engine::utils::tiling_area;
use crate::model::geometry::{Rect, Size};

/// Position heuristics for re-deriving every slot frame at once,
/// independent of the active template.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArrangeStyle {
    /// Near-square grid, row-major.
    Grid,
    /// Diagonally offset, overlapping panes.
    Cascade,
    /// Exact overlap; z-order decides visibility.
    Stack,
    /// Panes evenly spaced on a ring around the canvas center.
    Circle,
}

const CASCADE_STEP: f64 = 40.0;
const CASCADE_PANE_FRACTION: f64 = 0.6;
const CIRCLE_PANE_FRACTION: f64 = 0.35;

pub fn positions(
    style: ArrangeStyle,
    container: Size,
    count: usize,
    gaps: &GapSettings,
) -> Vec<Rect> {
    if count == 0 {
        return Vec::new();
    }
    match style {
        ArrangeStyle::Grid => grid_positions(container, count, gaps),
        ArrangeStyle::Cascade => cascade_positions(container, count, gaps),
        ArrangeStyle::Stack => stack_positions(container, count, gaps),
        ArrangeStyle::Circle => circle_positions(container, count, gaps),
    }
}

/// Near-square grid: columns = ceil(sqrt(count)), rows as needed. Cells in
/// a short last row keep the same size rather than stretching.
pub(crate) fn grid_positions(container: Size, count: usize, gaps: &GapSettings) -> Vec<Rect> {
    if count == 0 {
        return Vec::new();
    }
    let area = tiling_area(container, gaps);
    let cols = (count as f64).sqrt().ceil() as usize;
    let rows = count.div_ceil(cols);

    let cell_width =
        (area.size.width - gaps.inner.horizontal * (cols - 1) as f64) / cols as f64;
    let cell_height =
        (area.size.height - gaps.inner.vertical * (rows - 1) as f64) / rows as f64;

    (0..count)
        .map(|i| {
            let row = (i / cols) as f64;
            let col = (i % cols) as f64;
            Rect::new(
                area.origin.x + col * (cell_width + gaps.inner.horizontal),
                area.origin.y + row * (cell_height + gaps.inner.vertical),
                cell_width,
                cell_height,
            )
        })
        .collect()
}

fn cascade_positions(container: Size, count: usize, gaps: &GapSettings) -> Vec<Rect> {
    let area = tiling_area(container, gaps);
    let pane = Size::new(
        area.size.width * CASCADE_PANE_FRACTION,
        area.size.height * CASCADE_PANE_FRACTION,
    );
    let max_x = area.max_x() - pane.width;
    let max_y = area.max_y() - pane.height;

    (0..count)
        .map(|i| {
            let offset = i as f64 * CASCADE_STEP;
            Rect::new(
                (area.origin.x + offset).min(max_x),
                (area.origin.y + offset).min(max_y),
                pane.width,
                pane.height,
            )
        })
        .collect()
}

fn stack_positions(container: Size, count: usize, gaps: &GapSettings) -> Vec<Rect> {
    vec![tiling_area(container, gaps); count]
}

fn circle_positions(container: Size, count: usize, gaps: &GapSettings) -> Vec<Rect> {
    let area = tiling_area(container, gaps);
    let pane = Size::new(
        area.size.width * CIRCLE_PANE_FRACTION,
        area.size.height * CIRCLE_PANE_FRACTION,
    );
    // largest ring that keeps every pane fully inside the area
    let radius = 0.5
        * (area.size.width - pane.width).min(area.size.height - pane.height).max(0.0);
    let center = area.mid();

    (0..count)
        .map(|i| {
            let angle = -TAU / 4.0 + TAU * i as f64 / count as f64;
            Rect::new(
                center.x + radius * angle.cos() - pane.width / 2.0,
                center.y + radius * angle.sin() - pane.height / 2.0,
                pane.width,
                pane.height,
            )
        })
        .collect()
}
