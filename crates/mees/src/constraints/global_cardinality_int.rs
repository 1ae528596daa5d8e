//! Structures and algorithms for the `global_cardinality_int` constraint,
//! which relates a list of integer decision variables to the number of
//! occurrences of a list of values among them.

use crate::{
	actions::{PropagationActions, PropagatorInitActions, ReformulationActions},
	constraints::{among_int::IntAmongBounds, Conflict, Constraint, Propagator},
	reformulate::{InitConfig, ReformulationError},
	solver::{
		activation_list::IntPropCond, queue::PriorityLevel, solving_context::SolvingContext,
		view::IntView,
	},
	IntDecision, IntSetVal, IntVal,
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Representation of the `global_cardinality_int` constraint.
///
/// This constraint enforces that for every index `i`, the decision `counts[i]`
/// equals the number of the given integer decisions fixed to `values[i]`. When
/// the constraint is closed, the variables can only take values from `values`.
pub struct IntGlobalCardinality {
	/// Whether the variables are restricted to the counted values.
	pub(crate) closed: bool,
	/// The decisions that must equal the occurrence counts of the values.
	pub(crate) counts: Vec<IntDecision>,
	/// The values whose occurrences are counted.
	pub(crate) values: Vec<IntVal>,
	/// The variables whose values are counted.
	pub(crate) vars: Vec<IntDecision>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Propagator that restricts a variable to a set of values as soon as the
/// search starts.
///
/// The propagator is run once at the root of the search and never enqueued
/// again, since domains only shrink during search.
pub(crate) struct IntInSet {
	/// The variable being restricted.
	var: IntView,
	/// The values the variable is allowed to take.
	values: IntSetVal,
}

impl Constraint for IntGlobalCardinality {
	fn to_solver(
		&self,
		slv: &mut dyn ReformulationActions,
		_config: &InitConfig,
	) -> Result<(), ReformulationError> {
		let vars: Vec<IntView> = self.vars.iter().map(|&v| slv.get_solver_int(v)).collect();
		for (&value, &count) in self.values.iter().zip(self.counts.iter()) {
			let count = slv.get_solver_int(count);
			IntAmongBounds::new_in(slv, count, vars.clone(), (value..=value).into());
		}
		if self.closed {
			let values: IntSetVal = self.values.iter().map(|&v| v..=v).collect();
			for &v in &vars {
				IntInSet::new_in(slv, v, values.clone());
			}
		}
		Ok(())
	}
}

impl IntInSet {
	/// Create a new [`IntInSet`] propagator and post it in the solver.
	pub(crate) fn new_in(
		slv: &mut (impl PropagatorInitActions + ?Sized),
		var: IntView,
		values: IntSetVal,
	) {
		let prop = slv.add_propagator(Box::new(Self { var, values }), PriorityLevel::Highest);
		slv.enqueue_now(prop);
		// Membership must be rechecked once the variable is fixed, as
		// bounds-only variables do not record interior removals.
		slv.enqueue_on_int_change(prop, var, IntPropCond::Fixed);
	}
}

impl Propagator<SolvingContext<'_>> for IntInSet {
	#[tracing::instrument(name = "int_in_set", level = "trace", skip(self, actions))]
	fn propagate(&mut self, actions: &mut SolvingContext<'_>) -> Result<(), Conflict> {
		actions.set_int_in_set(self.var, &self.values)
	}
}

#[cfg(test)]
mod tests {
	use expect_test::expect;
	use tracing_test::traced_test;

	use crate::{global_cardinality_int, reformulate::InitConfig, Model, Solver};

	#[test]
	#[traced_test]
	fn test_global_cardinality_closed() {
		let mut prb = Model::default();
		let vars = prb.new_int_vars(3, (1..=5).into());
		let count1 = prb.new_int_var((1..=1).into());
		let count2 = prb.new_int_var((2..=2).into());
		prb += global_cardinality_int(vars.clone(), vec![1, 2], vec![count1, count2], true)
			.unwrap();
		let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
		let vars: Vec<_> = vars.iter().map(|v| map.get(&(*v).into())).collect();
		slv.expect_solutions(
			&vars,
			expect![[r#"
			1, 2, 2
			2, 1, 2
			2, 2, 1"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_global_cardinality_open() {
		let mut prb = Model::default();
		let vars = prb.new_int_vars(2, (1..=3).into());
		let count = prb.new_int_var((1..=1).into());
		prb += global_cardinality_int(vars.clone(), vec![1], vec![count], false).unwrap();
		let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
		let vars: Vec<_> = vars.iter().map(|v| map.get(&(*v).into())).collect();
		slv.expect_solutions(
			&vars,
			expect![[r#"
			1, 2
			1, 3
			2, 1
			3, 1"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_global_cardinality_invalid_args() {
		let mut prb = Model::default();
		let vars = prb.new_int_vars(2, (1..=3).into());
		let count = prb.new_int_var((0..=2).into());
		assert!(global_cardinality_int(vars, vec![1, 1], vec![count, count], false).is_err());
	}
}
