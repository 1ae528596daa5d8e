//! Traits that encapsulate different sets of actions that can be performed at
//! different phases and by different objects in the solving process.

use crate::{
	branchers::BoxedBrancher,
	constraints::{BoxedPropagator, Conflict},
	solver::{
		activation_list::IntPropCond, engine::PropRef, queue::PriorityLevel, trail::TrailedInt,
		BoolView, IntView,
	},
	BoolDecision, IntDecision, IntSetVal, IntVal,
};

/// Actions that can be performed during the initialization of branchers.
pub trait BrancherInitActions: DecisionActions {
	/// Create a new trailed integer value with the given initial value.
	fn new_trailed_int(&mut self, init: IntVal) -> TrailedInt;

	/// Push a new [`crate::branchers::Brancher`] to the end of the solving
	/// branching queue.
	fn push_brancher(&mut self, brancher: BoxedBrancher);
}

/// Actions that can be performed by a [`crate::branchers::Brancher`] when
/// making search decisions.
pub trait DecisionActions: InspectionActions {
	/// Returns the number of conflicts up to this point in the search process.
	fn get_num_conflicts(&self) -> u64;
}

/// Actions that can generally be performed when the solver is (partially)
/// initialized.
pub trait InspectionActions: TrailingActions {
	/// Check whether a given integer view can take a given value (given the
	/// current search decisions).
	fn check_int_in_domain(&self, var: IntView, val: IntVal) -> bool;

	/// Get the current value of a [`BoolView`], if it has been assigned.
	fn get_bool_val(&self, bv: BoolView) -> Option<bool> {
		self.get_int_val(bv.0).map(|v| v == 1)
	}

	/// Convenience method to get both the lower and upper bounds of an integer
	/// view.
	fn get_int_bounds(&self, var: IntView) -> (IntVal, IntVal) {
		(self.get_int_lower_bound(var), self.get_int_upper_bound(var))
	}

	/// Get the minimum value that an integer view is guaranteed to take (given
	/// the current search decisions).
	fn get_int_lower_bound(&self, var: IntView) -> IntVal;

	/// Get the maximum value that an integer view is guaranteed to take (given
	/// the current search decisions).
	fn get_int_upper_bound(&self, var: IntView) -> IntVal;

	/// Get the current value of an integer view, if it has been assigned.
	fn get_int_val(&self, var: IntView) -> Option<IntVal> {
		let (lb, ub) = self.get_int_bounds(var);
		if lb == ub {
			Some(lb)
		} else {
			None
		}
	}

	/// Get the number of values that an integer view can still take.
	fn get_int_domain_size(&self, var: IntView) -> IntVal;
}

/// Actions that can be performed during propagation.
pub trait PropagationActions: DecisionActions {
	/// Enforce a boolean view to be `true`.
	///
	/// Note that it is possible to enforce that a boolean view is `false` by
	/// negating the view, i.e. `!bv`.
	fn set_bool(&mut self, bv: BoolView) -> Result<(), Conflict>;

	/// Enforce that an integer view takes a value in the given set.
	fn set_int_in_set(&mut self, var: IntView, values: &IntSetVal) -> Result<(), Conflict>;

	/// Enforce that an integer view takes a value that is greater or equal to
	/// `val`.
	fn set_int_lower_bound(&mut self, var: IntView, val: IntVal) -> Result<(), Conflict>;

	/// Enforce that an integer view cannot take a value `val`.
	fn set_int_not_eq(&mut self, var: IntView, val: IntVal) -> Result<(), Conflict>;

	/// Enforce that an integer view cannot take any of the values in the given
	/// set.
	fn set_int_not_in_set(&mut self, var: IntView, values: &IntSetVal) -> Result<(), Conflict>;

	/// Enforce that an integer view takes a value that is less or equal to
	/// `val`.
	fn set_int_upper_bound(&mut self, var: IntView, val: IntVal) -> Result<(), Conflict>;

	/// Enforce that an integer view takes a value `val`.
	fn set_int_val(&mut self, var: IntView, val: IntVal) -> Result<(), Conflict>;
}

/// Actions that can be performed during the initialization of propagators.
pub trait PropagatorInitActions: DecisionActions {
	/// Add a propagator to the solver.
	fn add_propagator(&mut self, propagator: BoxedPropagator, priority: PriorityLevel) -> PropRef;

	/// Enqueue a propagator to be activated at the root node.
	fn enqueue_now(&mut self, prop: PropRef);

	/// Enqueue a propagator to be enqueued when a Boolean variable is assigned.
	fn enqueue_on_bool_change(&mut self, prop: PropRef, var: BoolView) {
		self.enqueue_on_int_change(prop, var.0, IntPropCond::Fixed);
	}

	/// Enqueue a propagator to be enqueued when an integer variable is changed
	/// according to the given propagation condition.
	fn enqueue_on_int_change(&mut self, prop: PropRef, var: IntView, condition: IntPropCond);
}

/// Actions that can be performed when reformulating a [`crate::Model`] object
/// into a [`crate::Solver`] object.
pub trait ReformulationActions: PropagatorInitActions + BrancherInitActions {
	/// Lookup the solver [`BoolView`] to which the given model [`BoolDecision`]
	/// maps.
	fn get_solver_bool(&mut self, bv: BoolDecision) -> BoolView;

	/// Lookup the solver [`IntView`] to which the given model [`IntDecision`]
	/// maps.
	fn get_solver_int(&mut self, iv: IntDecision) -> IntView;

	/// Create a new integer decision variable to use in the encoding.
	fn new_int_var(&mut self, domain: IntSetVal) -> IntView;
}

/// Basic actions that can be performed when the trailing infrastructure is
/// available.
pub trait TrailingActions {
	/// Get the current value of a [`TrailedInt`].
	fn get_trailed_int(&self, i: TrailedInt) -> IntVal;
	/// Change the value of a [`TrailedInt`] in a way that can be undone if the
	/// solver backtracks to a previous state.
	fn set_trailed_int(&mut self, i: TrailedInt, v: IntVal) -> IntVal;
}
