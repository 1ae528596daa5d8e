//! Module containing the solution values that will be returned when
//! inspecting a solution.

use std::{fmt::Display, num::NonZeroI64};

use rangelist::RangeList;

use crate::solver::View;

/// Type alias for a set of integers parameter value.
pub type IntSetVal = RangeList<IntVal>;

/// Type alias for an parameter integer value.
pub type IntVal = i64;

/// Type alias for a non-zero paremeter integer value.
pub type NonZeroIntVal = NonZeroI64;

/// A trait for a function that can be used to evaluate a [`View`] to a
/// [`Value`], which can be used when inspecting a solution.
pub trait Valuation: Fn(View) -> Value {}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(variant_size_differences, reason = "`Int` cannot be as smal as `Bool`")]
/// The general representation of a solution value in the solver.
pub enum Value {
	/// A Boolean value.
	Bool(bool),
	/// An integer value.
	Int(IntVal),
}

impl<F: Fn(View) -> Value> Valuation for F {}

impl Value {
	/// If the `Value` is a Boolean, represent it as bool. Returns None otherwise.
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Bool(b) => Some(*b),
			_ => None,
		}
	}
	/// If the `Value` is an integer, represent it as `IntVal`. Returns None
	/// otherwise.
	pub fn as_int(&self) -> Option<IntVal> {
		match self {
			Value::Int(i) => Some(*i),
			_ => None,
		}
	}
}

impl Display for Value {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Value::Bool(b) => write!(f, "{b}"),
			Value::Int(i) => write!(f, "{i}"),
		}
	}
}
