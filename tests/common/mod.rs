//! Common test utilities
#![allow(dead_code)]

use lietensor::dtype::DType;
use lietensor::error::Result;
use lietensor::group::GroupId;
use lietensor::kernel::LieKernels;
use lietensor::tensor::{Tensor, TensorId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Initialise logging once; output is captured per test
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Assert two f64 slices are close within tolerance
///
/// Uses the formula: |a - b| <= atol + rtol * |b|
pub fn assert_allclose_f64(a: &[f64], b: &[f64], rtol: f64, atol: f64, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}

/// Host f64 tensor
pub fn tensor(data: &[f64], shape: &[usize]) -> Tensor {
    Tensor::from_slice(data, shape)
}

/// A non-contiguous view with the given shape (a transposed buffer)
pub fn strided(shape: &[usize]) -> Tensor {
    assert_eq!(shape.len(), 2);
    let buf = Tensor::zeros(&[shape[1], shape[0]], DType::F64).unwrap();
    let view = buf.transpose(0, 1).unwrap();
    assert!(!view.is_contiguous());
    view
}

/// `(N, K)` for a group index
pub fn dims(group_index: i32) -> (usize, usize) {
    let id = GroupId::try_from(group_index).unwrap();
    (id.embedding_dim(), id.tangent_dim())
}

pub fn rng() -> StdRng {
    StdRng::seed_from_u64(7)
}

/// Values uniform in `[-scale, scale)`
pub fn random_vec(rng: &mut StdRng, len: usize, scale: f64) -> Vec<f64> {
    (0..len).map(|_| rng.gen_range(-scale..scale)).collect()
}

// ============================================================================
// Recording provider
// ============================================================================

/// One kernel invocation seen by [`RecordingKernels`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub kernel: &'static str,
    pub group_index: i32,
    pub args: Vec<TensorId>,
}

/// Provider that records its calls and answers with a fixed tensor
pub struct RecordingKernels {
    name: &'static str,
    pub output: Tensor,
    calls: Mutex<Vec<Call>>,
}

impl RecordingKernels {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            output: Tensor::meta(&[1], DType::F64),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, kernel: &'static str, group_index: i32, args: &[&Tensor]) {
        self.calls.lock().unwrap().push(Call {
            kernel,
            group_index,
            args: args.iter().map(|t| t.id()).collect(),
        });
    }

    fn one(&self, kernel: &'static str, g: i32, args: &[&Tensor]) -> Result<Tensor> {
        self.record(kernel, g, args);
        Ok(self.output.clone())
    }

    fn many(&self, kernel: &'static str, g: i32, args: &[&Tensor]) -> Result<Vec<Tensor>> {
        self.record(kernel, g, args);
        Ok(vec![self.output.clone(), self.output.clone()])
    }
}

impl LieKernels for RecordingKernels {
    fn name(&self) -> &'static str {
        self.name
    }

    fn exp_forward(&self, g: i32, a: &Tensor) -> Result<Tensor> {
        self.one("exp_forward", g, &[a])
    }

    fn exp_backward(&self, g: i32, grad: &Tensor, a: &Tensor) -> Result<Vec<Tensor>> {
        self.many("exp_backward", g, &[grad, a])
    }

    fn log_forward(&self, g: i32, x: &Tensor) -> Result<Tensor> {
        self.one("log_forward", g, &[x])
    }

    fn log_backward(&self, g: i32, grad: &Tensor, x: &Tensor) -> Result<Vec<Tensor>> {
        self.many("log_backward", g, &[grad, x])
    }

    fn inv_forward(&self, g: i32, x: &Tensor) -> Result<Tensor> {
        self.one("inv_forward", g, &[x])
    }

    fn inv_backward(&self, g: i32, grad: &Tensor, x: &Tensor) -> Result<Vec<Tensor>> {
        self.many("inv_backward", g, &[grad, x])
    }

    fn mul_forward(&self, g: i32, x: &Tensor, y: &Tensor) -> Result<Tensor> {
        self.one("mul_forward", g, &[x, y])
    }

    fn mul_backward(&self, g: i32, grad: &Tensor, x: &Tensor, y: &Tensor) -> Result<Vec<Tensor>> {
        self.many("mul_backward", g, &[grad, x, y])
    }

    fn adj_forward(&self, g: i32, x: &Tensor, a: &Tensor) -> Result<Tensor> {
        self.one("adj_forward", g, &[x, a])
    }

    fn adj_backward(&self, g: i32, grad: &Tensor, x: &Tensor, a: &Tensor) -> Result<Vec<Tensor>> {
        self.many("adj_backward", g, &[grad, x, a])
    }

    fn adjt_forward(&self, g: i32, x: &Tensor, a: &Tensor) -> Result<Tensor> {
        self.one("adjT_forward", g, &[x, a])
    }

    fn adjt_backward(&self, g: i32, grad: &Tensor, x: &Tensor, a: &Tensor) -> Result<Vec<Tensor>> {
        self.many("adjT_backward", g, &[grad, x, a])
    }

    fn act_forward(&self, g: i32, x: &Tensor, p: &Tensor) -> Result<Tensor> {
        self.one("act_forward", g, &[x, p])
    }

    fn act_backward(&self, g: i32, grad: &Tensor, x: &Tensor, p: &Tensor) -> Result<Vec<Tensor>> {
        self.many("act_backward", g, &[grad, x, p])
    }

    fn act4_forward(&self, g: i32, x: &Tensor, p: &Tensor) -> Result<Tensor> {
        self.one("act4_forward", g, &[x, p])
    }

    fn act4_backward(&self, g: i32, grad: &Tensor, x: &Tensor, p: &Tensor) -> Result<Vec<Tensor>> {
        self.many("act4_backward", g, &[grad, x, p])
    }

    fn as_matrix_forward(&self, g: i32, x: &Tensor) -> Result<Tensor> {
        self.one("as_matrix_forward", g, &[x])
    }

    fn orthogonal_projector(&self, g: i32, x: &Tensor) -> Result<Tensor> {
        self.one("orthogonal_projector", g, &[x])
    }

    fn jleft_forward(&self, g: i32, x: &Tensor, a: &Tensor) -> Result<Tensor> {
        self.one("jleft_forward", g, &[x, a])
    }
}
