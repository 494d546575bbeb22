//! Named, ordered registry of constraint terms.
//!
//! Terms keep their insertion order. Aggregated outputs stack the rows of the
//! active terms in that order with no gaps, so row `k` of a value vector and
//! row `k` of every derivative refer to the same scalar constraint.

use std::collections::HashMap;

use nalgebra::{DVector, SVector};
use stride_core::ConstraintError;

use crate::approximation::{LinearApproximation, QuadraticApproximation};
use crate::kinematics::KinematicsModel;
use crate::terms::{ConstraintTerm, TermConfig};

#[derive(Clone, Debug, Default)]
pub struct ConstraintCollection {
    terms: Vec<ConstraintTerm>,
    index: HashMap<String, usize>,
}

impl ConstraintCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a term. Names must be unique within the collection.
    pub fn add(&mut self, term: ConstraintTerm) -> Result<(), ConstraintError> {
        if self.index.contains_key(term.name()) {
            return Err(ConstraintError::DuplicateConstraint(term.name().to_string()));
        }
        self.index.insert(term.name().to_string(), self.terms.len());
        self.terms.push(term);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&ConstraintTerm, ConstraintError> {
        self.index
            .get(name)
            .map(|&i| &self.terms[i])
            .ok_or_else(|| ConstraintError::UnknownConstraint(name.to_string()))
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut ConstraintTerm, ConstraintError> {
        match self.index.get(name) {
            Some(&i) => Ok(&mut self.terms[i]),
            None => Err(ConstraintError::UnknownConstraint(name.to_string())),
        }
    }

    pub fn set_activity(&mut self, name: &str, active: bool) -> Result<(), ConstraintError> {
        self.get_mut(name)?.set_activity(active);
        Ok(())
    }

    pub fn activate(&mut self, name: &str) -> Result<(), ConstraintError> {
        self.set_activity(name, true)
    }

    pub fn deactivate(&mut self, name: &str) -> Result<(), ConstraintError> {
        self.set_activity(name, false)
    }

    pub fn is_active(&self, name: &str) -> Result<bool, ConstraintError> {
        Ok(self.get(name)?.is_active())
    }

    pub fn configure(&mut self, name: &str, config: TermConfig) -> Result<(), ConstraintError> {
        self.get_mut(name)?.configure(config)
    }

    /// Term names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.terms.iter().map(ConstraintTerm::name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConstraintTerm> + '_ {
        self.terms.iter()
    }

    fn active(&self) -> impl Iterator<Item = &ConstraintTerm> + '_ {
        self.terms.iter().filter(|term| term.is_active())
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Total rows of the active terms.
    pub fn num_constraints(&self) -> usize {
        self.active().map(ConstraintTerm::num_constraints).sum()
    }

    pub fn value<const S: usize, const I: usize>(
        &self,
        kinematics: &dyn KinematicsModel<S, I>,
        x: &SVector<f64, S>,
        u: &SVector<f64, I>,
    ) -> DVector<f64> {
        let mut value = DVector::zeros(self.num_constraints());
        let mut offset = 0;
        for term in self.active() {
            let block = term.value(kinematics, x, u);
            value.rows_mut(offset, block.len()).copy_from(&block);
            offset += block.len();
        }
        value
    }

    pub fn linear_approximation<const S: usize, const I: usize>(
        &self,
        kinematics: &dyn KinematicsModel<S, I>,
        x: &SVector<f64, S>,
        u: &SVector<f64, I>,
    ) -> LinearApproximation<S, I> {
        let mut linear = LinearApproximation::zeros(self.num_constraints());
        let mut offset = 0;
        for term in self.active() {
            let block = term.linear_approximation(kinematics, x, u);
            linear.write_block(offset, &block);
            offset += block.num_rows();
        }
        linear
    }

    pub fn quadratic_approximation<const S: usize, const I: usize>(
        &self,
        kinematics: &dyn KinematicsModel<S, I>,
        x: &SVector<f64, S>,
        u: &SVector<f64, I>,
    ) -> QuadraticApproximation<S, I> {
        let mut quadratic = QuadraticApproximation::with_capacity(self.num_constraints());
        for term in self.active() {
            quadratic.extend(term.quadratic_approximation(kinematics, x, u));
        }
        quadratic
    }
}
