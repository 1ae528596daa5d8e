//! Structures and algorithms for the `all_equal_int` constraint, which
//! enforces that a list of integer decision variables take the same value,
//! and its negation `not_all_equal_int`.

use crate::{
	actions::{InspectionActions, PropagationActions, PropagatorInitActions, ReformulationActions},
	constraints::{Conflict, Constraint, Propagator},
	reformulate::{InitConfig, ReformulationError},
	solver::{
		activation_list::IntPropCond, queue::PriorityLevel, solving_context::SolvingContext,
		view::IntView,
	},
	IntDecision,
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Representation of the `all_equal_int` constraint.
///
/// This constraint enforces that all the given integer decisions take the same
/// value.
pub struct IntAllEqual {
	/// The variables that must be equal.
	pub(crate) vars: Vec<IntDecision>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Bounds propagator for the `all_equal_int` constraint, which forces all
/// variables into the intersection of their bounds.
pub(crate) struct IntAllEqualBounds {
	/// The variables that must be equal.
	vars: Vec<IntView>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Representation of the `not_all_equal_int` constraint.
///
/// This constraint enforces that at least two of the given integer decisions
/// take different values.
pub struct IntNotAllEqual {
	/// The variables that must not all be equal.
	pub(crate) vars: Vec<IntDecision>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Value propagator for the `not_all_equal_int` constraint.
///
/// The propagator waits until at most one variable is unfixed. If the fixed
/// variables all take the same value, the remaining variable must avoid it.
pub(crate) struct IntNotAllEqualValue {
	/// The variables that must not all be equal.
	vars: Vec<IntView>,
}

impl Constraint for IntAllEqual {
	fn to_solver(
		&self,
		slv: &mut dyn ReformulationActions,
		_config: &InitConfig,
	) -> Result<(), ReformulationError> {
		let vars: Vec<IntView> = self.vars.iter().map(|&v| slv.get_solver_int(v)).collect();
		IntAllEqualBounds::new_in(slv, vars);
		Ok(())
	}
}

impl IntAllEqualBounds {
	/// Create a new [`IntAllEqualBounds`] propagator and post it in the solver.
	pub(crate) fn new_in(slv: &mut (impl PropagatorInitActions + ?Sized), vars: Vec<IntView>) {
		let subscribe = vars.clone();
		let prop = slv.add_propagator(Box::new(Self { vars }), PriorityLevel::Highest);
		slv.enqueue_now(prop);
		for v in subscribe {
			slv.enqueue_on_int_change(prop, v, IntPropCond::Bounds);
		}
	}
}

impl Propagator<SolvingContext<'_>> for IntAllEqualBounds {
	#[tracing::instrument(name = "all_equal", level = "trace", skip(self, actions))]
	fn propagate(&mut self, actions: &mut SolvingContext<'_>) -> Result<(), Conflict> {
		let Some(&first) = self.vars.first() else {
			return Ok(());
		};
		let (mut lb, mut ub) = actions.get_int_bounds(first);
		for &v in &self.vars[1..] {
			let (v_lb, v_ub) = actions.get_int_bounds(v);
			lb = lb.max(v_lb);
			ub = ub.min(v_ub);
		}
		if lb > ub {
			return Err(Conflict);
		}
		for &v in &self.vars {
			actions.set_int_lower_bound(v, lb)?;
			actions.set_int_upper_bound(v, ub)?;
		}
		Ok(())
	}
}

impl Constraint for IntNotAllEqual {
	fn to_solver(
		&self,
		slv: &mut dyn ReformulationActions,
		_config: &InitConfig,
	) -> Result<(), ReformulationError> {
		let vars: Vec<IntView> = self.vars.iter().map(|&v| slv.get_solver_int(v)).collect();
		IntNotAllEqualValue::new_in(slv, vars);
		Ok(())
	}
}

impl IntNotAllEqualValue {
	/// Create a new [`IntNotAllEqualValue`] propagator and post it in the
	/// solver.
	pub(crate) fn new_in(slv: &mut (impl PropagatorInitActions + ?Sized), vars: Vec<IntView>) {
		let subscribe = vars.clone();
		let prop = slv.add_propagator(Box::new(Self { vars }), PriorityLevel::Highest);
		slv.enqueue_now(prop);
		for v in subscribe {
			slv.enqueue_on_int_change(prop, v, IntPropCond::Fixed);
		}
	}
}

impl Propagator<SolvingContext<'_>> for IntNotAllEqualValue {
	#[tracing::instrument(name = "not_all_equal", level = "trace", skip(self, actions))]
	fn propagate(&mut self, actions: &mut SolvingContext<'_>) -> Result<(), Conflict> {
		let mut fixed_val = None;
		let mut unfixed = None;
		for &v in &self.vars {
			match actions.get_int_val(v) {
				Some(val) => match fixed_val {
					// Two variables already differ, the constraint holds.
					Some(other) if other != val => return Ok(()),
					_ => fixed_val = Some(val),
				},
				None if unfixed.is_some() => return Ok(()),
				None => unfixed = Some(v),
			}
		}
		match (unfixed, fixed_val) {
			(Some(v), Some(val)) => actions.set_int_not_eq(v, val),
			(None, Some(_)) => Err(Conflict),
			_ => Ok(()),
		}
	}
}

#[cfg(test)]
mod tests {
	use expect_test::expect;
	use tracing_test::traced_test;

	use crate::{all_equal_int, not_all_equal_int, reformulate::InitConfig, Model, Solver};

	#[test]
	#[traced_test]
	fn test_all_equal_sat() {
		let mut prb = Model::default();
		let vars = prb.new_int_vars(3, (1..=3).into());
		prb += all_equal_int(vars.clone());
		let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
		let vars: Vec<_> = vars.iter().map(|v| map.get(&(*v).into())).collect();
		slv.expect_solutions(
			&vars,
			expect![[r#"
			1, 1, 1
			2, 2, 2
			3, 3, 3"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_all_equal_unsat() {
		let mut prb = Model::default();
		let a = prb.new_int_var((1..=2).into());
		let b = prb.new_int_var((3..=4).into());
		prb += all_equal_int(vec![a, b]);
		prb.assert_unsatisfiable();
	}

	#[test]
	#[traced_test]
	fn test_not_all_equal_sat() {
		let mut prb = Model::default();
		let vars = prb.new_int_vars(2, (1..=2).into());
		prb += not_all_equal_int(vars.clone());
		let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
		let vars: Vec<_> = vars.iter().map(|v| map.get(&(*v).into())).collect();
		slv.expect_solutions(
			&vars,
			expect![[r#"
			1, 2
			2, 1"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_not_all_equal_unsat() {
		let mut prb = Model::default();
		let vars = prb.new_int_vars(3, (1..=1).into());
		prb += not_all_equal_int(vars);
		prb.assert_unsatisfiable();
	}
}
