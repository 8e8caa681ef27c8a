//! Operation registry
//!
//! The exported operations by name, as an embedding framework would register
//! them. [`Dispatcher::call`] invokes an operation from its name and a slice
//! of tensor arguments.

use super::Dispatcher;
use crate::error::{Error, Result};
use crate::tensor::Tensor;

/// Role of a registered operation
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Differentiable forward operation, returns one tensor
    Forward,
    /// Gradient of a forward operation, returns a list of tensors
    Backward,
    /// Operation without a gradient, returns one tensor
    NoGrad,
}

/// One entry of the operation table
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OpSpec {
    /// Exported name
    pub name: &'static str,
    /// One-line description
    pub doc: &'static str,
    /// Number of tensor arguments, not counting the group index
    pub arity: usize,
    /// Role of the operation
    pub kind: OpKind,
}

const fn op(name: &'static str, doc: &'static str, arity: usize, kind: OpKind) -> OpSpec {
    OpSpec {
        name,
        doc,
        arity,
        kind,
    }
}

/// All exported operations, in registration order
pub static OPS: &[OpSpec] = &[
    op("expm", "exp map forward", 1, OpKind::Forward),
    op("expm_backward", "exp map backward", 2, OpKind::Backward),
    op("logm", "log map forward", 1, OpKind::Forward),
    op("logm_backward", "log map backward", 2, OpKind::Backward),
    op("inv", "inverse operator", 1, OpKind::Forward),
    op("inv_backward", "inverse operator backward", 2, OpKind::Backward),
    op("mul", "group operator", 2, OpKind::Forward),
    op("mul_backward", "group operator backward", 3, OpKind::Backward),
    op("adj", "adjoint operator", 2, OpKind::Forward),
    op("adj_backward", "adjoint operator backward", 3, OpKind::Backward),
    op("adjT", "transposed adjoint operator", 2, OpKind::Forward),
    op("adjT_backward", "transposed adjoint operator backward", 3, OpKind::Backward),
    op("act", "action on point", 2, OpKind::Forward),
    op("act_backward", "action on point backward", 3, OpKind::Backward),
    op("act4", "action on homogeneous point", 2, OpKind::Forward),
    op("act4_backward", "action on homogeneous point backward", 3, OpKind::Backward),
    op("as_matrix", "convert to matrix", 1, OpKind::NoGrad),
    op("projector", "orthogonal projection matrix", 1, OpKind::NoGrad),
    op("Jinv", "left inverse jacobian operator", 2, OpKind::NoGrad),
];

/// Find an operation by its exported name
pub fn lookup(name: &str) -> Option<&'static OpSpec> {
    OPS.iter().find(|spec| spec.name == name)
}

/// Result of a call through the registry
#[derive(Debug)]
pub enum OpOutput {
    /// Output of a forward or gradient-free operation
    Tensor(Tensor),
    /// Gradients returned by a backward operation
    Tensors(Vec<Tensor>),
}

impl OpOutput {
    /// The single tensor, if this is a forward result
    pub fn into_tensor(self) -> Option<Tensor> {
        match self {
            OpOutput::Tensor(t) => Some(t),
            OpOutput::Tensors(_) => None,
        }
    }

    /// The gradient list, if this is a backward result
    pub fn into_tensors(self) -> Option<Vec<Tensor>> {
        match self {
            OpOutput::Tensors(ts) => Some(ts),
            OpOutput::Tensor(_) => None,
        }
    }
}

impl Dispatcher {
    /// Invoke a registered operation by name
    ///
    /// `args` are the tensor arguments in the exported order, gradient
    /// first for backward operations.
    pub fn call(&self, name: &str, group_index: i32, args: &[Tensor]) -> Result<OpOutput> {
        let spec = lookup(name).ok_or_else(|| Error::UnknownOp(name.to_string()))?;
        if args.len() != spec.arity {
            return Err(Error::ArityMismatch {
                op: spec.name,
                expected: spec.arity,
                got: args.len(),
            });
        }

        let g = group_index;
        let one = |t: Result<Tensor>| t.map(OpOutput::Tensor);
        let many = |ts: Result<Vec<Tensor>>| ts.map(OpOutput::Tensors);

        match (spec.name, args) {
            ("expm", [a]) => one(self.expm(g, a)),
            ("expm_backward", [grad, a]) => many(self.expm_backward(g, grad, a)),
            ("logm", [x]) => one(self.logm(g, x)),
            ("logm_backward", [grad, x]) => many(self.logm_backward(g, grad, x)),
            ("inv", [x]) => one(self.inv(g, x)),
            ("inv_backward", [grad, x]) => many(self.inv_backward(g, grad, x)),
            ("mul", [x, y]) => one(self.mul(g, x, y)),
            ("mul_backward", [grad, x, y]) => many(self.mul_backward(g, grad, x, y)),
            ("adj", [x, a]) => one(self.adj(g, x, a)),
            ("adj_backward", [grad, x, a]) => many(self.adj_backward(g, grad, x, a)),
            ("adjT", [x, a]) => one(self.adj_t(g, x, a)),
            ("adjT_backward", [grad, x, a]) => many(self.adj_t_backward(g, grad, x, a)),
            ("act", [x, p]) => one(self.act(g, x, p)),
            ("act_backward", [grad, x, p]) => many(self.act_backward(g, grad, x, p)),
            ("act4", [x, p]) => one(self.act4(g, x, p)),
            ("act4_backward", [grad, x, p]) => many(self.act4_backward(g, grad, x, p)),
            ("as_matrix", [x]) => one(self.as_matrix(g, x)),
            ("projector", [x]) => one(self.projector(g, x)),
            ("Jinv", [x, a]) => one(self.jinv(g, x, a)),
            _ => Err(Error::UnknownOp(name.to_string())),
        }
    }
}
