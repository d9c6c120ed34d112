use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self { Self { x, y } }

    pub fn translated(self, delta: Vec2) -> Self {
        Self {
            x: self.x + delta.dx,
            y: self.y + delta.dy,
        }
    }
}

/// A 2-dimensional offset, used for drag translations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub dx: f64,
    pub dy: f64,
}

impl Vec2 {
    pub fn new(dx: f64, dy: f64) -> Self { Self { dx, dy } }

    pub fn length(self) -> f64 { (self.dx * self.dx + self.dy * self.dy).sqrt() }

    pub fn between(from: Point, to: Point) -> Self {
        Self {
            dx: to.x - from.x,
            dy: to.y - from.y,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self { Self { width, height } }

    pub fn is_degenerate(self) -> bool { self.width <= 0.0 || self.height <= 0.0 }

    pub fn scaled(self, factor: f64) -> Self {
        Self {
            width: self.width * factor,
            height: self.height * factor,
        }
    }

    /// Component-wise lower bound.
    pub fn at_least(self, floor: Size) -> Self {
        Self {
            width: self.width.max(floor.width),
            height: self.height.max(floor.height),
        }
    }

    /// Component-wise upper bound.
    pub fn at_most(self, ceiling: Size) -> Self {
        Self {
            width: self.width.min(ceiling.width),
            height: self.height.min(ceiling.height),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn from_parts(origin: Point, size: Size) -> Self { Self { origin, size } }

    pub fn max_x(self) -> f64 { self.origin.x + self.size.width }

    pub fn max_y(self) -> f64 { self.origin.y + self.size.height }

    pub fn mid(self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    pub fn area(self) -> f64 { self.size.width * self.size.height }

    pub fn contains(self, point: Point) -> bool {
        point.x >= self.origin.x
            && point.x < self.max_x()
            && point.y >= self.origin.y
            && point.y < self.max_y()
    }

    pub fn intersects(self, other: Rect) -> bool {
        self.origin.x < other.max_x()
            && other.origin.x < self.max_x()
            && self.origin.y < other.max_y()
            && other.origin.y < self.max_y()
    }

    pub fn round(self) -> Self {
        Self {
            origin: Point::new(self.origin.x.round(), self.origin.y.round()),
            size: Size::new(self.size.width.round(), self.size.height.round()),
        }
    }

    /// Shifts (and if necessary shrinks) the rectangle so it lies fully
    /// inside a container anchored at the origin.
    pub fn clamp_within(self, container: Size) -> Self {
        let size = self.size.at_most(container);
        let x = self.origin.x.clamp(0.0, (container.width - size.width).max(0.0));
        let y = self.origin.y.clamp(0.0, (container.height - size.height).max(0.0));
        Self {
            origin: Point::new(x, y),
            size,
        }
    }
}
