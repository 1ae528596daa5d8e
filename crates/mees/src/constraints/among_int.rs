//! Structures and algorithms for the `among_int` constraint, which counts how
//! many of a list of integer decision variables take a value from a given set.

use crate::{
	actions::{InspectionActions, PropagationActions, PropagatorInitActions, ReformulationActions},
	constraints::{Conflict, Constraint, Propagator},
	reformulate::{InitConfig, ReformulationError},
	solver::{
		activation_list::IntPropCond, queue::PriorityLevel, solving_context::SolvingContext,
		view::IntView,
	},
	IntDecision, IntSetVal, IntVal,
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Representation of the `among_int` constraint.
///
/// This constraint enforces that `count` equals the number of the given
/// integer decisions that take a value from the set `values`.
pub struct IntAmong {
	/// The decision that must equal the number of variables counted.
	pub(crate) count: IntDecision,
	/// The variables whose values are counted.
	pub(crate) vars: Vec<IntDecision>,
	/// The set of values that is counted.
	pub(crate) values: IntSetVal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Bounds propagator for the `among_int` constraint.
///
/// The propagator partitions the variables into those whose domain is fully
/// contained in the counted set, those whose domain is disjoint from it, and
/// the undecided remainder. The sizes of the partitions bound the count, and a
/// tight count forces the undecided variables in or out of the set.
pub(crate) struct IntAmongBounds {
	/// The view that must equal the number of variables counted.
	count: IntView,
	/// The variables whose values are counted.
	vars: Vec<IntView>,
	/// The set of values that is counted.
	values: IntSetVal,
}

/// The relation between the domain of a variable and a set of counted values.
enum SetStatus {
	/// The domain is fully contained in the set.
	Inside,
	/// The domain is disjoint from the set.
	Outside,
	/// The domain contains values inside and outside the set.
	Undecided,
}

/// Determine the relation between the current domain of the given view and
/// the given set of values.
fn set_status(actions: &impl InspectionActions, var: IntView, values: &IntSetVal) -> SetStatus {
	let (lb, ub) = actions.get_int_bounds(var);
	let mut any_in = false;
	let mut any_out = false;
	for v in lb..=ub {
		if !actions.check_int_in_domain(var, v) {
			continue;
		}
		if values.contains(&v) {
			any_in = true;
		} else {
			any_out = true;
		}
		if any_in && any_out {
			return SetStatus::Undecided;
		}
	}
	if any_in {
		SetStatus::Inside
	} else {
		SetStatus::Outside
	}
}

impl Constraint for IntAmong {
	fn to_solver(
		&self,
		slv: &mut dyn ReformulationActions,
		_config: &InitConfig,
	) -> Result<(), ReformulationError> {
		let count = slv.get_solver_int(self.count);
		let vars: Vec<IntView> = self.vars.iter().map(|&v| slv.get_solver_int(v)).collect();
		IntAmongBounds::new_in(slv, count, vars, self.values.clone());
		Ok(())
	}
}

impl IntAmongBounds {
	/// Create a new [`IntAmongBounds`] propagator and post it in the solver.
	pub(crate) fn new_in(
		slv: &mut (impl PropagatorInitActions + ?Sized),
		count: IntView,
		vars: Vec<IntView>,
		values: IntSetVal,
	) {
		let subscribe = vars.clone();
		let prop = slv.add_propagator(
			Box::new(Self {
				count,
				vars,
				values,
			}),
			PriorityLevel::Medium,
		);
		slv.enqueue_now(prop);
		slv.enqueue_on_int_change(prop, count, IntPropCond::Bounds);
		for v in subscribe {
			slv.enqueue_on_int_change(prop, v, IntPropCond::Domain);
		}
	}
}

impl Propagator<SolvingContext<'_>> for IntAmongBounds {
	#[tracing::instrument(name = "among", level = "trace", skip(self, actions))]
	fn propagate(&mut self, actions: &mut SolvingContext<'_>) -> Result<(), Conflict> {
		let mut inside = 0;
		let mut undecided = Vec::new();
		for &v in &self.vars {
			match set_status(actions, v, &self.values) {
				SetStatus::Inside => inside += 1,
				SetStatus::Outside => {}
				SetStatus::Undecided => undecided.push(v),
			}
		}
		let possible = inside + undecided.len() as IntVal;
		actions.set_int_lower_bound(self.count, inside)?;
		actions.set_int_upper_bound(self.count, possible)?;

		if actions.get_int_upper_bound(self.count) == inside {
			// No further variable may take a counted value.
			for v in undecided {
				actions.set_int_not_in_set(v, &self.values)?;
			}
		} else if actions.get_int_lower_bound(self.count) == possible {
			// All undecided variables must take a counted value.
			for v in undecided {
				actions.set_int_in_set(v, &self.values)?;
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use expect_test::expect;
	use tracing_test::traced_test;

	use crate::{among_int, reformulate::InitConfig, Decision, Model, Solver};

	#[test]
	#[traced_test]
	fn test_among_exact_count() {
		let mut prb = Model::default();
		let vars = prb.new_int_vars(2, (1..=2).into());
		let count = prb.new_int_var((1..=1).into());
		prb += among_int(count, vars.clone(), (1..=1).into());
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
	fn test_among_counts_range() {
		let mut prb = Model::default();
		let vars = prb.new_int_vars(2, (0..=3).into());
		let count = prb.new_int_var((0..=2).into());
		prb += among_int(count, vars.clone(), (2..=3).into());
		let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
		let mut proj = vec![Decision::from(count)];
		proj.extend(vars.iter().map(|v| Decision::from(*v)));
		let proj: Vec<_> = proj.iter().map(|v| map.get(v)).collect();
		slv.expect_solutions(
			&proj,
			expect![[r#"
			0, 0, 0
			0, 0, 1
			0, 1, 0
			0, 1, 1
			1, 0, 2
			1, 0, 3
			1, 1, 2
			1, 1, 3
			1, 2, 0
			1, 2, 1
			1, 3, 0
			1, 3, 1
			2, 2, 2
			2, 2, 3
			2, 3, 2
			2, 3, 3"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_among_unsat() {
		let mut prb = Model::default();
		let vars = prb.new_int_vars(2, (2..=3).into());
		let count = prb.new_int_var((0..=0).into());
		prb += among_int(count, vars, (2..=3).into());
		prb.assert_unsatisfiable();
	}
}
