//! Structures for the possible (virtual) views on the solver's decision
//! variables.

use std::ops::{Add, Mul, Neg, Not};

use crate::{
	helpers::linear_transform::LinearTransform, solver::int_var::IntVarRef, IntVal, NonZeroIntVal,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// A Boolean expression that can be inspected within the solver engine.
///
/// Boolean decisions are stored as integer decision variables with the domain
/// `{0, 1}`, where `1` represents `true`. A [`BoolView`] is thus a view on an
/// integer, and its negation is the linear view `1 - x`.
pub struct BoolView(pub(crate) IntView);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// An integer expression that can be inspected and propagated within the
/// solver engine.
pub struct IntView(pub(crate) IntViewInner);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// The internal representation of [`IntView`].
pub(crate) enum IntViewInner {
	/// Direct reference to an integer variable.
	VarRef(IntVarRef),
	/// Constant integer value.
	Const(IntVal),
	/// Linear transformation of an integer variable.
	Linear {
		/// The linear transformation on the value of the variable.
		transformer: LinearTransform,
		/// The variable being transformed.
		var: IntVarRef,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// A reference to a decision variable (or its transformation) in the solver.
pub enum View {
	/// Boolean view.
	Bool(BoolView),
	/// Integer view.
	Int(IntView),
}

impl BoolView {
	/// Access the integer view that stores the 0/1 value of the Boolean view.
	pub fn as_int(self) -> IntView {
		self.0
	}
}

impl From<bool> for BoolView {
	fn from(value: bool) -> Self {
		BoolView(IntView(IntViewInner::Const(value as IntVal)))
	}
}

impl Not for BoolView {
	type Output = Self;

	fn not(self) -> Self::Output {
		BoolView(-self.0 + 1)
	}
}

impl Add<IntVal> for IntView {
	type Output = Self;

	fn add(self, rhs: IntVal) -> Self::Output {
		if rhs == 0 {
			return self;
		}
		IntView(match self.0 {
			IntViewInner::VarRef(var) => IntViewInner::Linear {
				transformer: LinearTransform::offset(rhs),
				var,
			},
			IntViewInner::Const(v) => IntViewInner::Const(v + rhs),
			IntViewInner::Linear { transformer, var } => {
				let transformer = transformer + rhs;
				if transformer.is_identity() {
					IntViewInner::VarRef(var)
				} else {
					IntViewInner::Linear { transformer, var }
				}
			}
		})
	}
}

impl From<IntVal> for IntView {
	fn from(value: IntVal) -> Self {
		IntView(IntViewInner::Const(value))
	}
}

impl Mul<NonZeroIntVal> for IntView {
	type Output = Self;

	fn mul(self, rhs: NonZeroIntVal) -> Self::Output {
		IntView(match self.0 {
			IntViewInner::VarRef(var) => IntViewInner::Linear {
				transformer: LinearTransform::scaled(rhs),
				var,
			},
			IntViewInner::Const(v) => IntViewInner::Const(v * rhs.get()),
			IntViewInner::Linear { transformer, var } => IntViewInner::Linear {
				transformer: transformer * rhs,
				var,
			},
		})
	}
}

impl Neg for IntView {
	type Output = Self;

	fn neg(self) -> Self::Output {
		self * NonZeroIntVal::new(-1).unwrap()
	}
}

impl From<BoolView> for View {
	fn from(value: BoolView) -> Self {
		View::Bool(value)
	}
}

impl From<IntView> for View {
	fn from(value: IntView) -> Self {
		View::Int(value)
	}
}
