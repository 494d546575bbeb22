//! Local approximations of constraint rows around `(x, u)`.

use nalgebra::{DMatrix, DVector, SMatrix, SVector};

/// Value and first derivatives, stacked row-wise.
///
/// `derivative_state` is `rows × S`, `derivative_input` is `rows × I`.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearApproximation<const S: usize, const I: usize> {
    pub value: DVector<f64>,
    pub derivative_state: DMatrix<f64>,
    pub derivative_input: DMatrix<f64>,
}

impl<const S: usize, const I: usize> LinearApproximation<S, I> {
    pub fn zeros(rows: usize) -> Self {
        Self {
            value: DVector::zeros(rows),
            derivative_state: DMatrix::zeros(rows, S),
            derivative_input: DMatrix::zeros(rows, I),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.value.len()
    }

    /// Copy `block` into rows `offset..offset + block.num_rows()`.
    pub(crate) fn write_block(&mut self, offset: usize, block: &Self) {
        let n = block.num_rows();
        self.value.rows_mut(offset, n).copy_from(&block.value);
        self.derivative_state
            .rows_mut(offset, n)
            .copy_from(&block.derivative_state);
        self.derivative_input
            .rows_mut(offset, n)
            .copy_from(&block.derivative_input);
    }
}

/// Value, gradients and Hessians, one entry per constraint row.
///
/// Row `k` of every field refers to the same scalar constraint.
#[derive(Clone, Debug, PartialEq)]
pub struct QuadraticApproximation<const S: usize, const I: usize> {
    pub value: Vec<f64>,
    pub derivative_state: Vec<SVector<f64, S>>,
    pub derivative_input: Vec<SVector<f64, I>>,
    pub second_derivatives_state: Vec<SMatrix<f64, S, S>>,
    pub second_derivatives_input: Vec<SMatrix<f64, I, I>>,
    /// `∂²h/∂u∂x`, `I × S` per row.
    pub derivatives_input_state: Vec<SMatrix<f64, I, S>>,
}

impl<const S: usize, const I: usize> Default for QuadraticApproximation<S, I> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<const S: usize, const I: usize> QuadraticApproximation<S, I> {
    pub fn with_capacity(rows: usize) -> Self {
        Self {
            value: Vec::with_capacity(rows),
            derivative_state: Vec::with_capacity(rows),
            derivative_input: Vec::with_capacity(rows),
            second_derivatives_state: Vec::with_capacity(rows),
            second_derivatives_input: Vec::with_capacity(rows),
            derivatives_input_state: Vec::with_capacity(rows),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.value.len()
    }

    /// Append one row with zero second derivatives.
    pub fn push_first_order(
        &mut self,
        value: f64,
        derivative_state: SVector<f64, S>,
        derivative_input: SVector<f64, I>,
    ) {
        self.value.push(value);
        self.derivative_state.push(derivative_state);
        self.derivative_input.push(derivative_input);
        self.second_derivatives_state.push(SMatrix::zeros());
        self.second_derivatives_input.push(SMatrix::zeros());
        self.derivatives_input_state.push(SMatrix::zeros());
    }

    /// Second-order view of a linear approximation (all Hessians zero).
    pub fn from_linear(linear: &LinearApproximation<S, I>) -> Self {
        let rows = linear.num_rows();
        let mut quadratic = Self::with_capacity(rows);
        for r in 0..rows {
            let dx = SVector::<f64, S>::from_fn(|c, _| linear.derivative_state[(r, c)]);
            let du = SVector::<f64, I>::from_fn(|c, _| linear.derivative_input[(r, c)]);
            quadratic.push_first_order(linear.value[r], dx, du);
        }
        quadratic
    }

    /// Append all rows of `other`.
    pub fn extend(&mut self, other: Self) {
        self.value.extend(other.value);
        self.derivative_state.extend(other.derivative_state);
        self.derivative_input.extend(other.derivative_input);
        self.second_derivatives_state
            .extend(other.second_derivatives_state);
        self.second_derivatives_input
            .extend(other.second_derivatives_input);
        self.derivatives_input_state
            .extend(other.derivatives_input_state);
    }
}
