pub use kurbo::{Affine, Point, Rect, Vec2};

/// Pixel resolution as `(width, height)`.
pub type Res = (usize, usize);

/// A pair of per-axis values, written `[x, y]` in pipeline documents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct XY<T> {
    pub x: T,
    pub y: T,
}

impl<T> XY<T> {
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T> From<[T; 2]> for XY<T> {
    fn from([x, y]: [T; 2]) -> Self {
        Self { x, y }
    }
}

impl<T: serde::Serialize> serde::Serialize for XY<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.x, &self.y).serialize(serializer)
    }
}

impl<'de, T: serde::Deserialize<'de>> serde::Deserialize<'de> for XY<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (x, y) = <(T, T)>::deserialize(deserializer)?;
        Ok(Self { x, y })
    }
}

/// Half-open sub-rectangle of an array, in rows and columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Region {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl Region {
    pub fn rows(self) -> usize {
        self.row_end.saturating_sub(self.row_start)
    }

    pub fn cols(self) -> usize {
        self.col_end.saturating_sub(self.col_start)
    }

    pub fn is_empty(self) -> bool {
        self.rows() == 0 || self.cols() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xy_reads_and_writes_two_element_arrays() {
        let v: XY<f64> = serde_json::from_str("[1.5, -2]").unwrap();
        assert_eq!(v, XY::new(1.5, -2.0));
        assert_eq!(serde_json::to_string(&v).unwrap(), "[1.5,-2.0]");
        assert!(serde_json::from_str::<XY<f64>>("[1, 2, 3]").is_err());
    }

    #[test]
    fn region_extent_and_emptiness() {
        let r = Region {
            row_start: 45,
            row_end: 55,
            col_start: 40,
            col_end: 60,
        };
        assert_eq!(r.rows(), 10);
        assert_eq!(r.cols(), 20);
        assert!(!r.is_empty());

        let empty = Region {
            row_start: 100,
            row_end: 100,
            col_start: 0,
            col_end: 100,
        };
        assert!(empty.is_empty());
    }
}
