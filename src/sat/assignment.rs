use crate::sat::literal::{Literal, Variable};
use core::ops::{Index, IndexMut};

#[derive(Debug, Clone, PartialEq, Eq, Copy, Default, Hash, PartialOrd, Ord)]
pub enum VarState {
    #[default]
    Unassigned,
    Assigned(bool),
}

impl VarState {
    pub const fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned(_))
    }

    pub const fn is_unassigned(&self) -> bool {
        !self.is_assigned()
    }

    pub const fn is_true(&self) -> bool {
        matches!(self, Self::Assigned(true))
    }

    pub const fn is_false(&self) -> bool {
        matches!(self, Self::Assigned(false))
    }
}

/// Per-variable truth values, indexed by [`Variable`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VecAssignment(Vec<VarState>);

impl Index<Variable> for VecAssignment {
    type Output = VarState;

    fn index(&self, index: Variable) -> &Self::Output {
        &self.0[index as usize]
    }
}

impl IndexMut<Variable> for VecAssignment {
    fn index_mut(&mut self, index: Variable) -> &mut Self::Output {
        &mut self.0[index as usize]
    }
}

impl VecAssignment {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(vec![VarState::Unassigned; num_vars + 1])
    }

    /// Makes room for variables up to and including `num_vars`.
    pub fn grow(&mut self, num_vars: usize) {
        if self.0.len() < num_vars + 1 {
            self.0.resize(num_vars + 1, VarState::Unassigned);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn assign<L: Literal>(&mut self, lit: L) {
        self[lit.variable()] = VarState::Assigned(lit.polarity());
    }

    pub fn unassign(&mut self, var: Variable) {
        self[var] = VarState::Unassigned;
    }

    #[must_use]
    pub fn var_value(&self, var: Variable) -> Option<bool> {
        match self.0.get(var as usize) {
            Some(VarState::Assigned(b)) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn literal_value<L: Literal>(&self, lit: L) -> Option<bool> {
        self.var_value(lit.variable()).map(|b| b == lit.polarity())
    }
}
