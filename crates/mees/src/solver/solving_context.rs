//! Struct to encapsulate the state of the solver engine as accessed by a
//! propagator during its execution.

use delegate::delegate;

use crate::{
	actions::{DecisionActions, InspectionActions, PropagationActions, TrailingActions},
	constraints::Conflict,
	solver::{
		engine::{PropRef, State},
		trail::TrailedInt,
		BoolView, IntLitMeaning, IntView,
	},
	IntSetVal, IntVal,
};

#[derive(Debug)]
/// Object through which a running propagator accesses and changes the state of
/// the solver engine.
///
/// Domain changes made through this context do not re-enqueue the propagator
/// that made them.
pub struct SolvingContext<'a> {
	/// The propagator that is currently being executed.
	prop: PropRef,
	/// The state of the solver engine.
	state: &'a mut State,
}

impl<'a> SolvingContext<'a> {
	/// Create a new [`SolvingContext`] for the execution of the given
	/// propagator.
	pub(crate) fn new(state: &'a mut State, prop: PropRef) -> Self {
		Self { prop, state }
	}
}

impl DecisionActions for SolvingContext<'_> {
	delegate! {
		to self.state {
			fn get_num_conflicts(&self) -> u64;
		}
	}
}

impl InspectionActions for SolvingContext<'_> {
	delegate! {
		to self.state {
			fn check_int_in_domain(&self, var: IntView, val: IntVal) -> bool;
			fn get_int_domain_size(&self, var: IntView) -> IntVal;
			fn get_int_lower_bound(&self, var: IntView) -> IntVal;
			fn get_int_upper_bound(&self, var: IntView) -> IntVal;
		}
	}
}

impl PropagationActions for SolvingContext<'_> {
	fn set_bool(&mut self, bv: BoolView) -> Result<(), Conflict> {
		self.state
			.apply_lit(bv.0, IntLitMeaning::Eq(1), Some(self.prop))
	}

	fn set_int_in_set(&mut self, var: IntView, values: &IntSetVal) -> Result<(), Conflict> {
		self.state.apply_set(var, values, true, Some(self.prop))
	}

	fn set_int_lower_bound(&mut self, var: IntView, val: IntVal) -> Result<(), Conflict> {
		self.state
			.apply_lit(var, IntLitMeaning::GreaterEq(val), Some(self.prop))
	}

	fn set_int_not_eq(&mut self, var: IntView, val: IntVal) -> Result<(), Conflict> {
		self.state
			.apply_lit(var, IntLitMeaning::NotEq(val), Some(self.prop))
	}

	fn set_int_not_in_set(&mut self, var: IntView, values: &IntSetVal) -> Result<(), Conflict> {
		self.state.apply_set(var, values, false, Some(self.prop))
	}

	fn set_int_upper_bound(&mut self, var: IntView, val: IntVal) -> Result<(), Conflict> {
		self.state
			.apply_lit(var, IntLitMeaning::Less(val + 1), Some(self.prop))
	}

	fn set_int_val(&mut self, var: IntView, val: IntVal) -> Result<(), Conflict> {
		self.state
			.apply_lit(var, IntLitMeaning::Eq(val), Some(self.prop))
	}
}

impl TrailingActions for SolvingContext<'_> {
	delegate! {
		to self.state {
			fn get_trailed_int(&self, i: TrailedInt) -> IntVal;
			fn set_trailed_int(&mut self, i: TrailedInt, v: IntVal) -> IntVal;
		}
	}
}
