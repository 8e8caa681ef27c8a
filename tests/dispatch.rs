//! Dispatcher behaviour observed through a recording kernel provider

mod common;

use common::{init_logger, strided, RecordingKernels};
use lietensor::dispatch::{Dispatcher, FallbackPolicy, OpOutput};
use lietensor::dtype::DType;
use lietensor::error::Error;
use lietensor::runtime::Device;
use lietensor::tensor::Tensor;
use std::sync::Arc;

/// An exported operation: argument names in call order, the order in which
/// contiguity is checked, and the provider entry point it lands on
struct Case {
    op: &'static str,
    args: &'static [&'static str],
    check: &'static [&'static str],
    kernel: &'static str,
}

const fn case(
    op: &'static str,
    args: &'static [&'static str],
    check: &'static [&'static str],
    kernel: &'static str,
) -> Case {
    Case {
        op,
        args,
        check,
        kernel,
    }
}

const CASES: &[Case] = &[
    case("expm", &["a"], &["a"], "exp_forward"),
    case("expm_backward", &["grad", "a"], &["a", "grad"], "exp_backward"),
    case("logm", &["X"], &["X"], "log_forward"),
    case("logm_backward", &["grad", "X"], &["X", "grad"], "log_backward"),
    case("inv", &["X"], &["X"], "inv_forward"),
    case("inv_backward", &["grad", "X"], &["X", "grad"], "inv_backward"),
    case("mul", &["X", "Y"], &["X", "Y"], "mul_forward"),
    case("mul_backward", &["grad", "X", "Y"], &["X", "Y", "grad"], "mul_backward"),
    case("adj", &["X", "a"], &["X", "a"], "adj_forward"),
    case("adj_backward", &["grad", "X", "a"], &["X", "a", "grad"], "adj_backward"),
    case("adjT", &["X", "a"], &["X", "a"], "adjT_forward"),
    case("adjT_backward", &["grad", "X", "a"], &["X", "a", "grad"], "adjT_backward"),
    case("act", &["X", "p"], &["X", "p"], "act_forward"),
    case("act_backward", &["grad", "X", "p"], &["X", "p", "grad"], "act_backward"),
    case("act4", &["X", "p"], &["X", "p"], "act4_forward"),
    case("act4_backward", &["grad", "X", "p"], &["X", "p", "grad"], "act4_backward"),
    case("as_matrix", &["X"], &["X"], "as_matrix_forward"),
    case("projector", &["X"], &["X"], "orthogonal_projector"),
    case("Jinv", &["X", "a"], &["X", "a"], "jleft_forward"),
];

impl Case {
    fn is_backward(&self) -> bool {
        self.op.ends_with("_backward")
    }

    /// Argument handed back when no provider serves the device
    fn fallback_arg(&self) -> &'static str {
        if self.op == "Jinv" {
            "a"
        } else {
            self.check[0]
        }
    }

    fn position(&self, arg: &str) -> usize {
        self.args.iter().position(|a| *a == arg).unwrap()
    }
}

fn recording_dispatcher() -> (Arc<RecordingKernels>, Dispatcher) {
    let recorder = Arc::new(RecordingKernels::new("recording"));
    let dispatcher = Dispatcher::builder().cpu_kernels(recorder.clone()).build();
    (recorder, dispatcher)
}

fn host_args(case: &Case) -> Vec<Tensor> {
    case.args
        .iter()
        .map(|_| Tensor::zeros(&[2, 4], DType::F64).unwrap())
        .collect()
}

fn meta_args(case: &Case) -> Vec<Tensor> {
    case.args
        .iter()
        .map(|_| Tensor::meta(&[2, 4], DType::F32))
        .collect()
}

#[test]
fn test_every_op_forwards_arguments_unchanged() {
    init_logger();
    let (recorder, dispatcher) = recording_dispatcher();

    for (i, case) in CASES.iter().enumerate() {
        let args = host_args(case);
        // Group indices are not validated on the way through
        let group_index = 40 + i as i32;
        let out = dispatcher.call(case.op, group_index, &args).unwrap();

        let calls = recorder.calls();
        assert_eq!(calls.len(), i + 1, "{}: provider not called once", case.op);
        let call = calls.last().unwrap();
        assert_eq!(call.kernel, case.kernel, "{}", case.op);
        assert_eq!(call.group_index, group_index, "{}", case.op);
        let ids: Vec<_> = args.iter().map(|t| t.id()).collect();
        assert_eq!(call.args, ids, "{}: arguments reordered or copied", case.op);

        match out {
            OpOutput::Tensor(t) => {
                assert!(!case.is_backward(), "{}", case.op);
                assert!(t.same_data(&recorder.output), "{}", case.op);
            }
            OpOutput::Tensors(ts) => {
                assert!(case.is_backward(), "{}", case.op);
                assert_eq!(ts.len(), 2, "{}", case.op);
                assert!(ts.iter().all(|t| t.same_data(&recorder.output)));
            }
        }
    }
}

#[test]
fn test_first_noncontiguous_argument_is_reported() {
    let (recorder, dispatcher) = recording_dispatcher();

    for case in CASES {
        // Make every argument from `first` onwards (in check order) strided;
        // the error must name exactly the first of them
        for first in 0..case.check.len() {
            let mut args = host_args(case);
            for name in &case.check[first..] {
                args[case.position(name)] = strided(&[2, 4]);
            }
            match dispatcher.call(case.op, 1, &args) {
                Err(Error::NotContiguous { arg }) => {
                    assert_eq!(arg, case.check[first], "{}", case.op)
                }
                other => panic!("{}: expected NotContiguous, got {other:?}", case.op),
            }
        }
    }

    assert!(recorder.calls().is_empty());
}

#[test]
fn test_noncontiguous_grad_alone_is_reported() {
    let (recorder, dispatcher) = recording_dispatcher();
    let x = Tensor::zeros(&[2, 7], DType::F64).unwrap();
    let y = Tensor::zeros(&[2, 7], DType::F64).unwrap();
    let grad = strided(&[2, 7]);

    let err = dispatcher.mul_backward(2, &grad, &x, &y).unwrap_err();
    assert!(matches!(err, Error::NotContiguous { arg: "grad" }));
    assert_eq!(err.to_string(), "grad must be contiguous");
    assert!(recorder.calls().is_empty());
}

#[test]
fn test_unmatched_device_passes_through() {
    init_logger();
    let dispatcher = Dispatcher::new();

    for case in CASES {
        let args = meta_args(case);
        let out = dispatcher.call(case.op, 1, &args).unwrap();
        if case.is_backward() {
            assert!(out.into_tensors().unwrap().is_empty(), "{}", case.op);
        } else {
            let expected = &args[case.position(case.fallback_arg())];
            let t = out.into_tensor().unwrap();
            assert!(t.same_data(expected), "{}", case.op);
            assert_eq!(t.device(), &Device::meta());
        }
    }
}

#[test]
fn test_jinv_passthrough_returns_tangent() {
    let dispatcher = Dispatcher::new();
    let x = Tensor::meta(&[5, 7], DType::F32);
    let a = Tensor::meta(&[5, 6], DType::F32);

    let out = dispatcher.jinv(2, &x, &a).unwrap();
    assert!(out.same_data(&a));
    assert!(!out.same_data(&x));
    assert_eq!(out.shape(), &[5, 6]);
}

#[test]
fn test_strict_policy_rejects_unmatched_device() {
    let dispatcher = Dispatcher::builder()
        .fallback(FallbackPolicy::Error)
        .build();

    for case in CASES {
        match dispatcher.call(case.op, 1, &meta_args(case)) {
            Err(Error::UnsupportedDevice { device, op }) => {
                assert_eq!(op, case.op);
                assert_eq!(device, Device::meta());
            }
            other => panic!("{}: expected UnsupportedDevice, got {other:?}", case.op),
        }
    }
}

#[test]
fn test_contiguity_is_checked_before_routing() {
    let dispatcher = Dispatcher::builder()
        .fallback(FallbackPolicy::Error)
        .build();
    let x = Tensor::meta(&[4, 2], DType::F32).transpose(0, 1).unwrap();
    assert!(!x.is_contiguous());

    assert!(matches!(
        dispatcher.as_matrix(1, &x),
        Err(Error::NotContiguous { arg: "X" })
    ));
}

#[test]
fn test_routing_follows_primary_tensor() {
    let (recorder, dispatcher) = recording_dispatcher();
    let x_host = Tensor::zeros(&[1, 4], DType::F64).unwrap();
    let x_meta = Tensor::meta(&[1, 4], DType::F64);

    // Only X decides the device; Y is never inspected
    dispatcher.mul(1, &x_host, &x_meta).unwrap();
    assert_eq!(recorder.calls().len(), 1);

    let out = dispatcher.mul(1, &x_meta, &x_host).unwrap();
    assert!(out.same_data(&x_meta));
    assert_eq!(recorder.calls().len(), 1);
}

#[cfg(feature = "cpu")]
#[test]
fn test_provider_error_is_returned_unchanged() {
    let dispatcher = Dispatcher::new();
    let x = Tensor::from_slice(&[0.0f64, 0.0, 0.0, 1.0], &[1, 4]);

    // The host provider validates the group index, the dispatcher does not
    assert!(matches!(dispatcher.logm(9, &x), Err(Error::InvalidGroup(9))));
}

#[cfg(not(feature = "cuda"))]
#[test]
fn test_cuda_tensor_without_cuda_provider_passes_through() {
    let (recorder, dispatcher) = recording_dispatcher();
    // Never dereferenced: no provider is registered for CUDA
    let x = unsafe { Tensor::from_external(0x1000, &[8, 7], DType::F32, Device::cuda(0)) };

    let out = dispatcher.logm(2, &x).unwrap();
    assert!(out.same_data(&x));
    assert!(dispatcher.logm_backward(2, &x, &x).unwrap().is_empty());
    assert!(recorder.calls().is_empty());
}

#[cfg(feature = "cuda")]
#[test]
fn test_cuda_tensor_routes_to_injected_provider() {
    let gpu = Arc::new(RecordingKernels::new("gpu"));
    let host = Arc::new(RecordingKernels::new("host"));
    let dispatcher = Dispatcher::builder()
        .cpu_kernels(host.clone())
        .cuda_kernels(gpu.clone())
        .build();
    let x = unsafe { Tensor::from_external(0x1000, &[8, 7], DType::F32, Device::cuda(0)) };
    let p = unsafe { Tensor::from_external(0x2000, &[8, 3], DType::F32, Device::cuda(0)) };

    let out = dispatcher.act(2, &x, &p).unwrap();
    assert!(out.same_data(&gpu.output));
    assert_eq!(gpu.calls().len(), 1);
    assert_eq!(gpu.calls()[0].kernel, "act_forward");
    assert!(host.calls().is_empty());
}
