//! Core solving structures, including the [`Solver`] object that is used to
//! search for solutions of a problem instance.

pub(crate) mod activation_list;
pub(crate) mod engine;
pub(crate) mod int_var;
pub(crate) mod queue;
pub(crate) mod solving_context;
pub(crate) mod trail;
pub mod value;
pub mod view;

use std::{
	fmt::{self, Debug},
	time::{Duration, Instant},
};

use delegate::delegate;

use crate::{
	actions::{
		BrancherInitActions, DecisionActions, InspectionActions, PropagatorInitActions,
		TrailingActions,
	},
	branchers::BoxedBrancher,
	constraints::BoxedPropagator,
	solver::{
		activation_list::IntPropCond,
		engine::{Engine, PropRef, SearchResult},
		queue::PriorityLevel,
		trail::TrailedInt,
		view::IntViewInner,
	},
};
pub use crate::solver::{
	engine::SearchStatistics,
	int_var::IntLitMeaning,
	value::{IntSetVal, IntVal, NonZeroIntVal, Valuation, Value},
	view::{BoolView, IntView, View},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// The objective direction of an optimization problem, used by
/// [`Solver::branch_and_bound`].
pub enum Goal {
	/// Find a solution that maximizes the objective.
	Maximize,
	/// Find a solution that minimizes the objective.
	Minimize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Statistics of the creation of a [`Solver`] object.
pub struct InitStatistics {
	/// Number of integer decision variables in the solver.
	int_vars: usize,
	/// Number of propagators in the solver.
	propagators: usize,
}

/// The main solver object, which is used to search for solutions of a problem
/// instance created using [`crate::Model::to_solver`].
pub struct Solver {
	/// Time at which the current search has to stop, if any.
	deadline: Option<Instant>,
	/// The search and propagation engine.
	pub(crate) engine: Engine,
	/// Whether a solution has been found since the last reset.
	found_solution: bool,
	/// External callback that can signal that the search should stop.
	terminate: Option<Box<dyn FnMut() -> bool>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// The result of a solving attempt, e.g. by [`Solver::solve`].
pub enum SolveResult {
	/// The search space has been fully explored, and all requested solutions
	/// have been found.
	Complete,
	/// A solution has been found, but the search space has not been exhausted.
	Satisfied,
	/// The search was interrupted before it could reach a conclusion.
	Unknown,
	/// The problem has been proven to have no (further) solutions.
	Unsatisfiable,
}

impl InitStatistics {
	/// Number of integer decision variables in the solver.
	pub fn int_vars(&self) -> usize {
		self.int_vars
	}

	/// Number of propagators in the solver.
	pub fn propagators(&self) -> usize {
		self.propagators
	}
}

impl Solver {
	/// Find all remaining solutions of the problem, calling `on_sol` with a
	/// valuation for every solution found.
	///
	/// Returns [`SolveResult::Complete`] when the search space was exhausted
	/// after finding at least one solution, [`SolveResult::Unsatisfiable`] when
	/// no solution was found at all, and [`SolveResult::Unknown`] when the
	/// search was interrupted.
	pub fn all_solutions(&mut self, mut on_sol: impl FnMut(&dyn Valuation)) -> SolveResult {
		loop {
			match self.next_solution(&mut on_sol) {
				SearchResult::Solution => {}
				SearchResult::Exhausted => {
					return if self.found_solution {
						SolveResult::Complete
					} else {
						SolveResult::Unsatisfiable
					};
				}
				SearchResult::Stopped => return SolveResult::Unknown,
			}
		}
	}

	/// Find a solution that optimizes the given objective in the given
	/// direction, calling `on_sol` with a valuation for every improving
	/// solution found.
	///
	/// Returns [`SolveResult::Complete`] and the objective value when an
	/// optimal solution was found and proven optimal,
	/// [`SolveResult::Unsatisfiable`] when the problem has no solution, and
	/// [`SolveResult::Unknown`] with the best objective value found so far when
	/// the search was interrupted.
	pub fn branch_and_bound(
		&mut self,
		objective: IntView,
		goal: Goal,
		mut on_sol: impl FnMut(&dyn Valuation),
	) -> (SolveResult, Option<IntVal>) {
		let mut best: Option<IntVal> = None;
		loop {
			match self.next_solution(&mut on_sol) {
				SearchResult::Solution => {
					let obj_val = self
						.engine
						.state
						.get_int_val(objective)
						.unwrap_or_else(|| unreachable!("objective unfixed in solution"));
					best = Some(obj_val);
					// Restart the search, requiring an improving objective.
					self.engine.reset_to_root();
					let bound = match goal {
						Goal::Maximize => IntLitMeaning::GreaterEq(obj_val + 1),
						Goal::Minimize => IntLitMeaning::Less(obj_val),
					};
					tracing::debug!(obj_val, "solution found, tightening objective bound");
					if self.engine.state.apply_lit(objective, bound, None).is_err() {
						return (SolveResult::Complete, best);
					}
				}
				SearchResult::Exhausted => {
					return if best.is_some() {
						(SolveResult::Complete, best)
					} else {
						(SolveResult::Unsatisfiable, None)
					};
				}
				SearchResult::Stopped => return (SolveResult::Unknown, best),
			}
		}
	}

	/// Find all remaining solutions of the problem and collect the values that
	/// the given views take in them.
	pub fn get_all_solutions(&mut self, views: &[View]) -> (SolveResult, Vec<Vec<Value>>) {
		let mut solutions = Vec::new();
		let status = self.all_solutions(|value| {
			solutions.push(views.iter().map(|&v| value(v)).collect());
		});
		(status, solutions)
	}

	/// Statistics of the creation of this solver object.
	pub fn init_statistics(&self) -> InitStatistics {
		InitStatistics {
			int_vars: self.engine.state.int_vars.len(),
			propagators: self.engine.propagators.len(),
		}
	}

	/// Continue the search until the next solution, calling `on_sol` when one
	/// is found.
	fn next_solution(&mut self, on_sol: &mut impl FnMut(&dyn Valuation)) -> SearchResult {
		let deadline = self.deadline;
		let terminate = &mut self.terminate;
		let mut stop = move || {
			deadline.is_some_and(|d| Instant::now() >= d)
				|| terminate.as_mut().is_some_and(|cb| cb())
		};
		let result = self.engine.search(&mut stop);
		if result == SearchResult::Solution {
			self.found_solution = true;
			let state = &self.engine.state;
			let value = |view: View| match view {
				View::Bool(bv) => Value::Bool(
					state
						.get_bool_val(bv)
						.unwrap_or_else(|| unreachable!("unfixed variable in solution")),
				),
				View::Int(iv) => Value::Int(
					state
						.get_int_val(iv)
						.unwrap_or_else(|| unreachable!("unfixed variable in solution")),
				),
			};
			on_sol(&value);
		}
		result
	}

	/// Returns the statistics of the search process up to this point.
	pub fn search_statistics(&self) -> &SearchStatistics {
		&self.engine.state.statistics
	}

	/// Set a callback that is polled during the search, which can return `true`
	/// to stop the search.
	pub fn set_terminate_callback(&mut self, cb: Option<impl FnMut() -> bool + 'static>) {
		self.terminate = cb.map(|cb| Box::new(cb) as Box<dyn FnMut() -> bool>);
	}

	/// Set the maximum duration of the search, measured from the moment of this
	/// call. Any running deadline is replaced, and `None` removes it.
	pub fn set_time_limit(&mut self, dur: Option<Duration>) {
		self.deadline = dur.map(|dur| Instant::now() + dur);
	}

	/// Try and find a (next) solution of the problem, calling `on_sol` with a
	/// valuation when one is found.
	///
	/// The search position is kept, so a subsequent call continues the search
	/// for a next solution. [`SolveResult::Unsatisfiable`] is only returned
	/// when no solution was found at all, exhausting the search space after
	/// earlier solutions yields [`SolveResult::Complete`].
	pub fn solve(&mut self, mut on_sol: impl FnMut(&dyn Valuation)) -> SolveResult {
		match self.next_solution(&mut on_sol) {
			SearchResult::Solution => SolveResult::Satisfied,
			SearchResult::Exhausted => {
				if self.found_solution {
					SolveResult::Complete
				} else {
					SolveResult::Unsatisfiable
				}
			}
			SearchResult::Stopped => SolveResult::Unknown,
		}
	}
}

impl BrancherInitActions for Solver {
	fn new_trailed_int(&mut self, init: IntVal) -> TrailedInt {
		self.engine.state.trail.new_trailed_int(init)
	}

	fn push_brancher(&mut self, brancher: BoxedBrancher) {
		self.engine.branchers.push(brancher);
	}
}

impl Debug for Solver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Solver")
			.field("deadline", &self.deadline)
			.field("engine", &self.engine)
			.field("found_solution", &self.found_solution)
			.finish_non_exhaustive()
	}
}

impl DecisionActions for Solver {
	delegate! {
		to self.engine.state {
			fn get_num_conflicts(&self) -> u64;
		}
	}
}

impl Default for Solver {
	fn default() -> Self {
		Self {
			deadline: None,
			engine: Engine::default(),
			found_solution: false,
			terminate: None,
		}
	}
}

impl InspectionActions for Solver {
	delegate! {
		to self.engine.state {
			fn check_int_in_domain(&self, var: IntView, val: IntVal) -> bool;
			fn get_int_domain_size(&self, var: IntView) -> IntVal;
			fn get_int_lower_bound(&self, var: IntView) -> IntVal;
			fn get_int_upper_bound(&self, var: IntView) -> IntVal;
		}
	}
}

impl PropagatorInitActions for Solver {
	fn add_propagator(&mut self, propagator: BoxedPropagator, priority: PriorityLevel) -> PropRef {
		let prop = self.engine.propagators.push(propagator);
		let state_ref = self.engine.state.add_propagator_state(priority);
		debug_assert_eq!(prop, state_ref);
		prop
	}

	fn enqueue_now(&mut self, prop: PropRef) {
		self.engine.state.enqueue_propagator(prop);
	}

	fn enqueue_on_int_change(&mut self, prop: PropRef, var: IntView, condition: IntPropCond) {
		let (var, condition) = match var.0 {
			IntViewInner::VarRef(v) => (v, condition),
			IntViewInner::Linear { transformer, var } => {
				// A negative scale mirrors the domain, swapping the bounds.
				let condition = if transformer.positive_scale() {
					condition
				} else {
					match condition {
						IntPropCond::LowerBound => IntPropCond::UpperBound,
						IntPropCond::UpperBound => IntPropCond::LowerBound,
						other => other,
					}
				};
				(var, condition)
			}
			IntViewInner::Const(_) => return,
		};
		self.engine.state.int_activation[var].add(prop, condition);
	}
}

impl TrailingActions for Solver {
	delegate! {
		to self.engine.state {
			fn get_trailed_int(&self, i: TrailedInt) -> IntVal;
			fn set_trailed_int(&mut self, i: TrailedInt, v: IntVal) -> IntVal;
		}
	}
}

#[cfg(test)]
impl Solver {
	/// Assert that the projections of all solutions of the problem onto the
	/// given views match the expected (sorted) list of solutions.
	pub(crate) fn expect_solutions(&mut self, views: &[View], expected: expect_test::Expect) {
		use itertools::Itertools;

		let (status, mut solutions) = self.get_all_solutions(views);
		assert_eq!(
			status,
			SolveResult::Complete,
			"enumeration did not complete"
		);
		solutions.sort_unstable();
		solutions.dedup();
		let text = solutions
			.iter()
			.map(|sol| sol.iter().map(ToString::to_string).join(", "))
			.join("\n");
		expected.assert_eq(&text);
	}
}
