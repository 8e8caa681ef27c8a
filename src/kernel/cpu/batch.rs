//! Batched row access for host kernels
//!
//! Every kernel input is viewed as `batch` rows of `width` values in its last
//! dimension. Data is widened to f64 on read and narrowed back to the input
//! dtype on write.

use super::CpuKernels;
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::runtime::CpuRuntime;
use crate::tensor::Tensor;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// A host tensor read as rows
#[derive(Debug)]
pub(super) struct Rows {
    data: Vec<f64>,
    width: usize,
    batch: usize,
    shape: Vec<usize>,
    dtype: DType,
}

impl Rows {
    /// Read `t` expecting last dimension `width`
    pub fn read(t: &Tensor, width: usize) -> Result<Self> {
        Self::read_any(t, &[width])
    }

    /// Read `t` whose last dimension may be any of `widths`
    pub fn read_any(t: &Tensor, widths: &[usize]) -> Result<Self> {
        if !t.device().is_cpu() {
            return Err(Error::DeviceMismatch {
                kernel: CpuRuntime::name(),
                device: *t.device(),
            });
        }

        let shape = t.shape().to_vec();
        let width = match shape.last() {
            Some(&w) if widths.contains(&w) => w,
            _ => {
                let mut expected = shape.clone();
                match expected.last_mut() {
                    Some(last) => *last = widths[0],
                    None => expected.push(widths[0]),
                }
                return Err(Error::shape_mismatch(&expected, &shape));
            }
        };

        let data = t.to_f64_vec()?;
        let batch = data.len() / width;
        Ok(Self {
            data,
            width,
            batch,
            shape,
            dtype: t.dtype(),
        })
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.width..(i + 1) * self.width]
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn batch(&self) -> usize {
        self.batch
    }

    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Batch dimensions (all but the last)
    #[inline]
    pub fn lead(&self) -> &[usize] {
        &self.shape[..self.shape.len() - 1]
    }

    /// Shape of an output with this batch and last dimension `width`
    pub fn shape_with(&self, width: usize) -> Vec<usize> {
        let mut shape = self.lead().to_vec();
        shape.push(width);
        shape
    }

    /// Shape of an output with this batch and trailing `rows x cols`
    pub fn shape_with_matrix(&self, rows: usize, cols: usize) -> Vec<usize> {
        let mut shape = self.lead().to_vec();
        shape.extend([rows, cols]);
        shape
    }

    /// Check that `other` shares this batch layout and dtype
    pub fn expect_same_batch(&self, other: &Rows) -> Result<()> {
        if other.dtype != self.dtype {
            return Err(Error::DTypeMismatch {
                lhs: self.dtype,
                rhs: other.dtype,
            });
        }
        if other.lead() != self.lead() {
            return Err(Error::shape_mismatch(
                &self.shape_with(other.width),
                &other.shape,
            ));
        }
        Ok(())
    }
}

impl CpuKernels {
    /// Fill `batch` output rows of `width` values
    pub(super) fn map_rows<F>(&self, batch: usize, width: usize, f: F) -> Vec<f64>
    where
        F: Fn(usize, &mut [f64]) + Send + Sync,
    {
        let mut out = vec![0.0; batch * width];
        if width == 0 {
            return out;
        }

        #[cfg(feature = "rayon")]
        if batch >= self.rayon_min_len() {
            out.par_chunks_mut(width)
                .enumerate()
                .with_min_len(self.rayon_min_len())
                .for_each(|(i, row)| f(i, row));
            return out;
        }

        for (i, row) in out.chunks_mut(width).enumerate() {
            f(i, row);
        }
        out
    }

    /// Fill two output row sets in one pass
    pub(super) fn map_rows2<F>(
        &self,
        batch: usize,
        width_a: usize,
        width_b: usize,
        f: F,
    ) -> (Vec<f64>, Vec<f64>)
    where
        F: Fn(usize, &mut [f64], &mut [f64]) + Send + Sync,
    {
        let mut out_a = vec![0.0; batch * width_a];
        let mut out_b = vec![0.0; batch * width_b];
        if width_a == 0 || width_b == 0 {
            return (out_a, out_b);
        }

        #[cfg(feature = "rayon")]
        if batch >= self.rayon_min_len() {
            out_a
                .par_chunks_mut(width_a)
                .zip(out_b.par_chunks_mut(width_b))
                .enumerate()
                .with_min_len(self.rayon_min_len())
                .for_each(|(i, (row_a, row_b))| f(i, row_a, row_b));
            return (out_a, out_b);
        }

        for (i, (row_a, row_b)) in out_a
            .chunks_mut(width_a)
            .zip(out_b.chunks_mut(width_b))
            .enumerate()
        {
            f(i, row_a, row_b);
        }
        (out_a, out_b)
    }
}

/// Wrap computed rows as a host tensor
#[inline]
pub(super) fn to_tensor(data: &[f64], shape: &[usize], dtype: DType) -> Result<Tensor> {
    Tensor::from_f64_slice(data, shape, dtype)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_rows() {
        let t = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], &[2, 4]);
        let rows = Rows::read(&t, 4).unwrap();
        assert_eq!(rows.batch(), 2);
        assert_eq!(rows.row(1), &[5.0, 6.0, 7.0, 8.0]);
        assert_eq!(rows.lead(), &[2]);
        assert_eq!(rows.shape_with_matrix(4, 4), vec![2, 4, 4]);
    }

    #[test]
    fn test_read_rejects_wrong_width() {
        let t = Tensor::from_slice(&[0.0f64; 6], &[2, 3]);
        match Rows::read(&t, 4) {
            Err(Error::ShapeMismatch { expected, got }) => {
                assert_eq!(expected, vec![2, 4]);
                assert_eq!(got, vec![2, 3]);
            }
            other => panic!("expected shape mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_read_rejects_scalar() {
        let t = Tensor::from_slice(&[1.0f64], &[]);
        assert!(matches!(
            Rows::read(&t, 3),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_read_rejects_non_host() {
        let t = Tensor::meta(&[2, 4], DType::F32);
        assert!(matches!(
            Rows::read(&t, 4),
            Err(Error::DeviceMismatch { .. })
        ));
    }

    #[test]
    fn test_map_rows_parallel_matches_serial() {
        let serial = CpuKernels::new().with_min_len(usize::MAX);
        let parallel = CpuKernels::new().with_min_len(1);
        let f = |i: usize, row: &mut [f64]| row.iter_mut().for_each(|v| *v = i as f64);
        assert_eq!(serial.map_rows(100, 3, f), parallel.map_rows(100, 3, f));

        let (a, b) = parallel.map_rows2(5, 1, 2, |i, ra, rb| {
            ra[0] = i as f64;
            rb[1] = -(i as f64);
        });
        assert_eq!(a, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(b[9], -4.0);
    }
}
