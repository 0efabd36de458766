/// A dense 2D grid backed by a flat vector, indexed `y * width + x`.
///
/// Every generated field (height, mask, wind, flow, ...) shares this index
/// space, so stages can exchange plain cell indices instead of coordinate
/// pairs. The grid is finite on both axes; neighbor lookups never wrap.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Wrap an existing flat vector. The vector length must be `width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Self {
        assert_eq!(data.len(), width * height, "grid data length mismatch");
        Self {
            width,
            height,
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn coords(&self, i: usize) -> (usize, usize) {
        (i % self.width, i / self.width)
    }

    pub fn get(&self, i: usize) -> &T {
        &self.data[i]
    }

    pub fn set(&mut self, i: usize, value: T) {
        self.data[i] = value;
    }

    pub fn at(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn at_mut(&mut self, x: usize, y: usize) -> &mut T {
        let i = self.index(x, y);
        &mut self.data[i]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// 4-connected neighbor indices of cell `i`, in up/down/left/right order.
    /// Edge cells yield fewer than four.
    pub fn neighbors4(&self, i: usize) -> impl Iterator<Item = usize> {
        let (x, y) = self.coords(i);
        let up = (y > 0).then(|| i - self.width);
        let down = (y + 1 < self.height).then(|| i + self.width);
        let left = (x > 0).then(|| i - 1);
        let right = (x + 1 < self.width).then(|| i + 1);
        [up, down, left, right].into_iter().flatten()
    }
}

impl Grid<f32> {
    /// Minimum and maximum over all cells. Empty grids report `(0.0, 0.0)`.
    pub fn min_max(&self) -> (f32, f32) {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for &v in &self.data {
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }
        if self.data.is_empty() {
            (0.0, 0.0)
        } else {
            (min, max)
        }
    }

    /// Divide every cell by the field maximum so the result peaks at 1.0.
    /// A constant-zero (or near-zero) field stays all-zero instead of
    /// dividing by zero.
    pub fn normalized_by_max(mut self) -> Self {
        let (_, max) = self.min_max();
        if max.abs() < f32::EPSILON {
            self.data.fill(0.0);
            return self;
        }
        for v in &mut self.data {
            *v /= max;
        }
        self
    }

    /// Min-max rescale so the field spans exactly [0, 1]. Both ends are
    /// reset: the minimum becomes 0 and the maximum becomes 1. A constant
    /// field collapses to all-zero.
    pub fn rescaled_unit(mut self) -> Self {
        let (min, max) = self.min_max();
        let range = max - min;
        if range < f32::EPSILON {
            self.data.fill(0.0);
            return self;
        }
        for v in &mut self.data {
            *v = (*v - min) / range;
        }
        self
    }
}
