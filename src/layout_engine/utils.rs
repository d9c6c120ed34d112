use crate::common::config::GapSettings;
use crate::model::geometry::{Rect, Size};

/// Shrinks the container by the outer gaps to get the area templates and
/// arrange heuristics may place panes in.
pub(crate) fn tiling_area(container: Size, gaps: &GapSettings) -> Rect {
    if gaps.outer.top == 0.0
        && gaps.outer.left == 0.0
        && gaps.outer.bottom == 0.0
        && gaps.outer.right == 0.0
    {
        Rect::from_parts(Default::default(), container)
    } else {
        Rect::new(
            gaps.outer.left,
            gaps.outer.top,
            (container.width - gaps.outer.left - gaps.outer.right).max(0.0),
            (container.height - gaps.outer.top - gaps.outer.bottom).max(0.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::common::config::OuterGaps;

    #[test]
    fn test_zero_gaps_covers_container() {
        let area = tiling_area(Size::new(800.0, 600.0), &GapSettings::default());
        assert_eq!(area, Rect::new(0.0, 0.0, 800.0, 600.0));
    }

    #[test]
    fn test_outer_gaps_shrink_area() {
        let gaps = GapSettings {
            outer: OuterGaps {
                top: 10.0,
                left: 20.0,
                bottom: 10.0,
                right: 20.0,
            },
            ..Default::default()
        };
        let area = tiling_area(Size::new(800.0, 600.0), &gaps);
        assert_eq!(area, Rect::new(20.0, 10.0, 760.0, 580.0));
    }

    #[test]
    fn test_oversized_gaps_clamp_to_zero() {
        let gaps = GapSettings {
            outer: OuterGaps {
                top: 400.0,
                left: 0.0,
                bottom: 400.0,
                right: 0.0,
            },
            ..Default::default()
        };
        let area = tiling_area(Size::new(800.0, 600.0), &gaps);
        assert_eq!(area.size.height, 0.0);
    }
}
