use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::common::config::{GapSettings, MAX_SLOTS_CEILING};
use crate::layout_engine::arrange;
use crate::layout_engine::utils::tiling_area;
use crate::model::geometry::{Rect, Size};

/// Catalog identifier for a canvas partition strategy.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TemplateId {
    Single,
    Grid2x2,
    Grid3x3,
    Grid4x4,
    Stack,
    Custom,
}

impl TemplateId {
    pub fn instantiate(self) -> TemplateKind {
        match self {
            TemplateId::Single => SingleTemplate.into(),
            TemplateId::Grid2x2 => GridTemplate::new(2).into(),
            TemplateId::Grid3x3 => GridTemplate::new(3).into(),
            TemplateId::Grid4x4 => GridTemplate::new(4).into(),
            TemplateId::Stack => StackTemplate.into(),
            TemplateId::Custom => CustomTemplate.into(),
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TemplateId::Single => "Single",
            TemplateId::Grid2x2 => "2x2 Grid",
            TemplateId::Grid3x3 => "3x3 Grid",
            TemplateId::Grid4x4 => "4x4 Grid",
            TemplateId::Stack => "Stack",
            TemplateId::Custom => "Custom",
        }
    }
}

/// A canvas partition strategy. `rectangles` is pure and deterministic:
/// same inputs always yield the same list, ordered by slot insertion.
#[enum_dispatch]
pub trait Template {
    fn id(&self) -> TemplateId;

    /// Most streams this template gives screen space to.
    fn max_slots(&self) -> usize;

    /// Advisory column count for pickers.
    fn column_count(&self) -> usize;

    /// Whether slots may be moved/resized by hand while this template is
    /// active.
    fn allows_manual_placement(&self) -> bool;

    /// One rectangle per populated slot, in insertion order. May return
    /// fewer than `slot_count` entries when the count exceeds what the
    /// template can show.
    fn rectangles(&self, container: Size, slot_count: usize, gaps: &GapSettings) -> Vec<Rect>;
}

/// One pane, full canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SingleTemplate;

impl Template for SingleTemplate {
    fn id(&self) -> TemplateId { TemplateId::Single }

    fn max_slots(&self) -> usize { 1 }

    fn column_count(&self) -> usize { 1 }

    fn allows_manual_placement(&self) -> bool { false }

    fn rectangles(&self, container: Size, slot_count: usize, gaps: &GapSettings) -> Vec<Rect> {
        if slot_count == 0 {
            return Vec::new();
        }
        vec![tiling_area(container, gaps)]
    }
}

/// Equal n-by-n cells, filled row-major. Trailing cells stay empty when
/// fewer slots exist.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridTemplate {
    dimension: usize,
}

impl GridTemplate {
    pub fn new(dimension: usize) -> Self {
        debug_assert!(dimension >= 2);
        Self { dimension }
    }

    pub fn dimension(&self) -> usize { self.dimension }
}

impl Template for GridTemplate {
    fn id(&self) -> TemplateId {
        match self.dimension {
            2 => TemplateId::Grid2x2,
            3 => TemplateId::Grid3x3,
            _ => TemplateId::Grid4x4,
        }
    }

    fn max_slots(&self) -> usize { self.dimension * self.dimension }

    fn column_count(&self) -> usize { self.dimension }

    fn allows_manual_placement(&self) -> bool { false }

    fn rectangles(&self, container: Size, slot_count: usize, gaps: &GapSettings) -> Vec<Rect> {
        let area = tiling_area(container, gaps);
        let n = self.dimension;
        let cell_width =
            (area.size.width - gaps.inner.horizontal * (n - 1) as f64) / n as f64;
        let cell_height =
            (area.size.height - gaps.inner.vertical * (n - 1) as f64) / n as f64;

        (0..slot_count.min(n * n))
            .map(|i| {
                let row = (i / n) as f64;
                let col = (i % n) as f64;
                Rect::new(
                    area.origin.x + col * (cell_width + gaps.inner.horizontal),
                    area.origin.y + row * (cell_height + gaps.inner.vertical),
                    cell_width,
                    cell_height,
                )
            })
            .collect()
    }
}

/// Every pane at full canvas size; stacking order decides visibility.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StackTemplate;

impl Template for StackTemplate {
    fn id(&self) -> TemplateId { TemplateId::Stack }

    fn max_slots(&self) -> usize { MAX_SLOTS_CEILING }

    fn column_count(&self) -> usize { 1 }

    fn allows_manual_placement(&self) -> bool { false }

    fn rectangles(&self, container: Size, slot_count: usize, gaps: &GapSettings) -> Vec<Rect> {
        vec![tiling_area(container, gaps); slot_count]
    }
}

/// Free-form placement. Stored slot frames are authoritative; the
/// rectangles here are only the deterministic fallback for slots that do
/// not have a manual position yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomTemplate;

impl Template for CustomTemplate {
    fn id(&self) -> TemplateId { TemplateId::Custom }

    fn max_slots(&self) -> usize { MAX_SLOTS_CEILING }

    fn column_count(&self) -> usize { 1 }

    fn allows_manual_placement(&self) -> bool { true }

    fn rectangles(&self, container: Size, slot_count: usize, gaps: &GapSettings) -> Vec<Rect> {
        arrange::grid_positions(container, slot_count, gaps)
    }
}

#[enum_dispatch(Template)]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplateKind {
    Single(SingleTemplate),
    Grid(GridTemplate),
    Stack(StackTemplate),
    Custom(CustomTemplate),
}
