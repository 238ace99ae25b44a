/// Axis-aligned rectangle in physical pixels (top-left origin, +Y down).
///
/// Used for window and grid-cell viewports.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle anchored at the origin.
    #[inline]
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Exclusive right edge.
    #[inline]
    pub const fn right(self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[inline]
    pub const fn bottom(self) -> u32 {
        self.y + self.height
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub const fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub const fn contains(self, px: u32, py: u32) -> bool {
        px >= self.x && py >= self.y && px < self.right() && py < self.bottom()
    }

    /// Returns `true` if both rectangles cover at least one common pixel.
    #[inline]
    pub fn overlaps(self, other: Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── containment ───────────────────────────────────────────────────────

    #[test]
    fn contains_top_left_inclusive() {
        assert!(Rect::new(10, 10, 5, 5).contains(10, 10));
    }

    #[test]
    fn contains_bottom_right_exclusive() {
        assert!(!Rect::new(10, 10, 5, 5).contains(15, 15));
        assert!(Rect::new(10, 10, 5, 5).contains(14, 14));
    }

    // ── overlap ───────────────────────────────────────────────────────────

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = Rect::new(0, 0, 400, 300);
        let b = Rect::new(400, 0, 400, 300);
        assert!(!a.overlaps(b));
    }

    #[test]
    fn nested_rects_overlap() {
        let outer = Rect::from_size(800, 600);
        let inner = Rect::new(100, 100, 10, 10);
        assert!(outer.overlaps(inner));
        assert!(inner.overlaps(outer));
    }

    #[test]
    fn empty_and_area() {
        assert!(Rect::new(3, 3, 0, 7).is_empty());
        assert_eq!(Rect::new(0, 0, 801, 600).area(), 480_600);
    }
}
