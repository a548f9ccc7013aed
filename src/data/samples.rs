use std::sync::Arc;

use crate::foundation::error::{ImagecatError, ImagecatResult};

/// Intended storage precision of a sample array.
///
/// Samples always live in memory as `f32`; the tag records how codecs should store them and is
/// carried through operators that replace data.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SampleType {
    /// 16-bit float, the usual choice for color data.
    F16,
    #[default]
    F32,
    /// 32-bit integer, used by id-like data.
    I32,
}

/// Dense `rows x cols x channels` sample array, row-major with interleaved channels.
///
/// The buffer is reference counted: cloning a `Samples` never copies pixels, and writers go
/// through [`Samples::make_mut`], which copies only when the buffer is shared.
#[derive(Clone, Debug, PartialEq)]
pub struct Samples {
    rows: usize,
    cols: usize,
    channels: usize,
    sample_type: SampleType,
    data: Arc<Vec<f32>>,
}

impl Samples {
    pub fn new(rows: usize, cols: usize, channels: usize, data: Vec<f32>) -> ImagecatResult<Self> {
        let expected = sample_count(rows, cols, channels)?;
        if data.len() != expected {
            return Err(ImagecatError::validation(format!(
                "sample array of shape {rows}x{cols}x{channels} needs {expected} values, received {}",
                data.len()
            )));
        }
        Ok(Self {
            rows,
            cols,
            channels,
            sample_type: SampleType::default(),
            data: Arc::new(data),
        })
    }

    /// Build from an explicit shape; anything other than three dimensions is rejected.
    pub fn from_shape_vec(shape: &[usize], data: Vec<f32>) -> ImagecatResult<Self> {
        match *shape {
            [rows, cols, channels] => Self::new(rows, cols, channels, data),
            _ => Err(ImagecatError::validation(format!(
                "layer data must have three dimensions, received {}",
                shape.len()
            ))),
        }
    }

    pub fn zeros(rows: usize, cols: usize, channels: usize) -> ImagecatResult<Self> {
        let mut data = allocate(rows, cols, channels)?;
        data.resize(rows * cols * channels, 0.0);
        Self::new(rows, cols, channels, data)
    }

    /// Every pixel set to `values`, one value per channel.
    pub fn filled(rows: usize, cols: usize, values: &[f32]) -> ImagecatResult<Self> {
        let mut data = allocate(rows, cols, values.len())?;
        if !values.is_empty() {
            for _ in 0..rows * cols {
                data.extend_from_slice(values);
            }
        }
        Self::new(rows, cols, values.len(), data)
    }

    /// Build by evaluating `f(row, col, channel)` for every sample.
    pub fn from_fn(
        rows: usize,
        cols: usize,
        channels: usize,
        mut f: impl FnMut(usize, usize, usize) -> f32,
    ) -> ImagecatResult<Self> {
        let mut data = allocate(rows, cols, channels)?;
        for r in 0..rows {
            for c in 0..cols {
                for ch in 0..channels {
                    data.push(f(r, c, ch));
                }
            }
        }
        Self::new(rows, cols, channels, data)
    }

    pub fn with_sample_type(mut self, sample_type: SampleType) -> Self {
        self.sample_type = sample_type;
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// `[rows, cols, channels]`.
    pub fn shape(&self) -> [usize; 3] {
        [self.rows, self.cols, self.channels]
    }

    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize, channel: usize) -> f32 {
        self.data[self.index(row, col) + channel]
    }

    pub fn pixel(&self, row: usize, col: usize) -> &[f32] {
        let i = self.index(row, col);
        &self.data[i..i + self.channels]
    }

    /// Mutable access, copying the buffer first if another array still references it.
    pub fn make_mut(&mut self) -> &mut [f32] {
        Arc::make_mut(&mut self.data).as_mut_slice()
    }

    /// Whether both arrays read from the same buffer.
    pub fn shares_buffer(&self, other: &Samples) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Apply `f` to every pixel, producing `out_channels` values per pixel.
    pub fn map_pixels(&self, out_channels: usize, mut f: impl FnMut(&[f32], &mut [f32])) -> Self {
        let mut data = vec![0.0f32; self.rows * self.cols * out_channels];
        if out_channels > 0 && self.channels > 0 {
            for (src, dst) in self
                .data
                .chunks_exact(self.channels)
                .zip(data.chunks_exact_mut(out_channels))
            {
                f(src, dst);
            }
        }
        Self {
            rows: self.rows,
            cols: self.cols,
            channels: out_channels,
            sample_type: self.sample_type,
            data: Arc::new(data),
        }
    }

    pub(crate) fn index(&self, row: usize, col: usize) -> usize {
        (row * self.cols + col) * self.channels
    }
}

/// `rows * cols * channels`, or a validation error when it does not fit in memory.
fn sample_count(rows: usize, cols: usize, channels: usize) -> ImagecatResult<usize> {
    rows.checked_mul(cols)
        .and_then(|v| v.checked_mul(channels))
        .filter(|&n| n <= isize::MAX as usize / std::mem::size_of::<f32>())
        .ok_or_else(|| {
            ImagecatError::validation(format!(
                "sample array of shape {rows}x{cols}x{channels} is too large"
            ))
        })
}

/// An empty buffer with room for exactly `rows * cols * channels` samples.
fn allocate(rows: usize, cols: usize, channels: usize) -> ImagecatResult<Vec<f32>> {
    let count = sample_count(rows, cols, channels)?;
    let mut data = Vec::new();
    data.try_reserve_exact(count).map_err(|e| {
        ImagecatError::validation(format!(
            "cannot allocate a {rows}x{cols}x{channels} sample array: {e}"
        ))
    })?;
    Ok(data)
}
