//! Structures and algorithms for linear constraints over integer decision
//! variables, which compare the sum of a list of terms to a constant.

use crate::{
	actions::{InspectionActions, PropagationActions, PropagatorInitActions, ReformulationActions},
	constraints::{Conflict, Constraint, Propagator},
	reformulate::{InitConfig, ReformulationError},
	solver::{
		activation_list::IntPropCond,
		queue::PriorityLevel,
		solving_context::SolvingContext,
		view::{IntView, IntViewInner},
	},
	IntDecision, IntVal,
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Representation of a linear constraint, comparing the sum of a list of
/// integer decision variables to a constant using the given operator.
pub struct IntLinear {
	/// The terms of the sum on the left hand side of the comparison.
	pub(crate) terms: Vec<IntDecision>,
	/// The operator of the comparison.
	pub(crate) operator: LinOperator,
	/// The constant on the right hand side of the comparison.
	pub(crate) rhs: IntVal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Bounds consistent propagator for the constraint `sum(terms) <= max`.
pub(crate) struct IntLinearLessEqBounds {
	/// The variables being summed.
	terms: Vec<IntView>,
	/// The maximum value the sum is allowed to take.
	max: IntVal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Value propagator for the constraint `sum(terms) != violation`.
///
/// The propagator waits until at most one term is unfixed, and then removes
/// the single value that would make the sum equal to the violating value.
pub(crate) struct IntLinearNotEqValue {
	/// The variables being summed.
	terms: Vec<IntView>,
	/// The value the sum is not allowed to take.
	violation: IntVal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Operators that can be used to compare the sum of a linear constraint to its
/// right hand side constant.
pub(crate) enum LinOperator {
	/// The sum must be equal to the constant.
	Equal,
	/// The sum must be less than or equal to the constant.
	LessEq,
	/// The sum must not be equal to the constant.
	NotEqual,
}

/// Replace the given list of views by a shorter list of fresh summary
/// variables, each constrained to be equal to the sum of a chunk of the
/// original list.
///
/// Chunks contain at most `limit` views, and the process is repeated until the
/// resulting list itself contains at most `limit` views.
fn split_sum(
	slv: &mut dyn ReformulationActions,
	mut views: Vec<IntView>,
	limit: usize,
) -> Vec<IntView> {
	while views.len() > limit {
		let mut summaries = Vec::with_capacity(views.len().div_ceil(limit));
		for chunk in views.chunks(limit) {
			let lb: IntVal = chunk.iter().map(|&v| slv.get_int_lower_bound(v)).sum();
			let ub: IntVal = chunk.iter().map(|&v| slv.get_int_upper_bound(v)).sum();
			let sum = slv.new_int_var((lb..=ub).into());
			// Post sum(chunk) == sum as two inequalities.
			IntLinearLessEqBounds::new_in(
				slv,
				chunk.iter().copied().chain([-sum]),
				0,
			);
			IntLinearLessEqBounds::new_in(
				slv,
				chunk.iter().map(|&v| -v).chain([sum]),
				0,
			);
			summaries.push(sum);
		}
		views = summaries;
	}
	views
}

impl Constraint for IntLinear {
	fn to_solver(
		&self,
		slv: &mut dyn ReformulationActions,
		config: &InitConfig,
	) -> Result<(), ReformulationError> {
		let mut rhs = self.rhs;
		let mut views = Vec::with_capacity(self.terms.len());
		for &t in &self.terms {
			let v = slv.get_solver_int(t);
			if let IntViewInner::Const(c) = v.0 {
				rhs -= c;
			} else {
				views.push(v);
			}
		}

		if views.is_empty() {
			let holds = match self.operator {
				LinOperator::Equal => rhs == 0,
				LinOperator::LessEq => rhs >= 0,
				LinOperator::NotEqual => rhs != 0,
			};
			return if holds {
				Ok(())
			} else {
				Err(ReformulationError::TrivialUnsatisfiable)
			};
		}

		let views = split_sum(slv, views, config.sum_split_limit());
		match self.operator {
			LinOperator::Equal => {
				IntLinearLessEqBounds::new_in(slv, views.iter().copied(), rhs);
				IntLinearLessEqBounds::new_in(slv, views.iter().map(|&v| -v), -rhs);
			}
			LinOperator::LessEq => {
				IntLinearLessEqBounds::new_in(slv, views, rhs);
			}
			LinOperator::NotEqual => {
				IntLinearNotEqValue::new_in(slv, views, rhs);
			}
		}
		Ok(())
	}
}

impl IntLinearLessEqBounds {
	/// Create a new [`IntLinearLessEqBounds`] propagator for the constraint
	/// `sum(terms) <= max` and post it in the solver.
	pub(crate) fn new_in(
		slv: &mut (impl PropagatorInitActions + ?Sized),
		terms: impl IntoIterator<Item = IntView>,
		mut max: IntVal,
	) {
		let terms: Vec<IntView> = terms
			.into_iter()
			.filter(|v| {
				if let IntViewInner::Const(c) = v.0 {
					max -= c;
					false
				} else {
					true
				}
			})
			.collect();

		let subscribe: Vec<IntView> = terms.clone();

		let prop = slv.add_propagator(Box::new(Self { terms, max }), PriorityLevel::Low);
		slv.enqueue_now(prop);
		for v in subscribe {
			slv.enqueue_on_int_change(prop, v, IntPropCond::LowerBound);
		}
	}
}

impl Propagator<SolvingContext<'_>> for IntLinearLessEqBounds {
	#[tracing::instrument(name = "int_lin_le", level = "trace", skip(self, actions))]
	fn propagate(&mut self, actions: &mut SolvingContext<'_>) -> Result<(), Conflict> {
		let sum = self
			.terms
			.iter()
			.fold(self.max, |sum, v| sum - actions.get_int_lower_bound(*v));
		if sum < 0 {
			return Err(Conflict);
		}
		for &v in &self.terms {
			let reaction = sum + actions.get_int_lower_bound(v);
			if reaction < actions.get_int_upper_bound(v) {
				actions.set_int_upper_bound(v, reaction)?;
			}
		}
		Ok(())
	}
}

impl IntLinearNotEqValue {
	/// Create a new [`IntLinearNotEqValue`] propagator for the constraint
	/// `sum(terms) != violation` and post it in the solver.
	pub(crate) fn new_in(
		slv: &mut (impl PropagatorInitActions + ?Sized),
		terms: impl IntoIterator<Item = IntView>,
		mut violation: IntVal,
	) {
		let terms: Vec<IntView> = terms
			.into_iter()
			.filter(|v| {
				if let IntViewInner::Const(c) = v.0 {
					violation -= c;
					false
				} else {
					true
				}
			})
			.collect();
		let subscribe: Vec<IntView> = terms.clone();

		let prop = slv.add_propagator(Box::new(Self { terms, violation }), PriorityLevel::Low);
		slv.enqueue_now(prop);
		for v in subscribe {
			slv.enqueue_on_int_change(prop, v, IntPropCond::Fixed);
		}
	}
}

impl Propagator<SolvingContext<'_>> for IntLinearNotEqValue {
	#[tracing::instrument(name = "int_lin_ne", level = "trace", skip(self, actions))]
	fn propagate(&mut self, actions: &mut SolvingContext<'_>) -> Result<(), Conflict> {
		let mut sum = 0;
		let mut unfixed = None;
		for &v in &self.terms {
			if let Some(val) = actions.get_int_val(v) {
				sum += val;
			} else if unfixed.is_some() {
				return Ok(());
			} else {
				unfixed = Some(v);
			}
		}
		if let Some(v) = unfixed {
			actions.set_int_not_eq(v, self.violation - sum)
		} else if sum == self.violation {
			Err(Conflict)
		} else {
			Ok(())
		}
	}
}

#[cfg(test)]
mod tests {
	use expect_test::expect;
	use tracing_test::traced_test;

	use crate::{reformulate::InitConfig, Model, Solver};

	#[test]
	#[traced_test]
	fn test_linear_eq_sat() {
		let mut prb = Model::default();
		let vars = prb.new_int_vars(2, (1..=4).into());
		prb += (vars[0] + vars[1]).eq(4);
		let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
		let vars: Vec<_> = vars.iter().map(|v| map.get(&(*v).into())).collect();
		slv.expect_solutions(
			&vars,
			expect![[r#"
			1, 3
			2, 2
			3, 1"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_linear_eq_unsat() {
		let mut prb = Model::default();
		let vars = prb.new_int_vars(2, (1..=4).into());
		prb += (vars[0] + vars[1]).eq(9);
		prb.assert_unsatisfiable();
	}

	#[test]
	#[traced_test]
	fn test_linear_ge_sat() {
		let mut prb = Model::default();
		let vars = prb.new_int_vars(2, (1..=4).into());
		prb += (vars[0] + vars[1]).geq(7);
		let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
		let vars: Vec<_> = vars.iter().map(|v| map.get(&(*v).into())).collect();
		slv.expect_solutions(
			&vars,
			expect![[r#"
			3, 4
			4, 3
			4, 4"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_linear_le_sat() {
		let mut prb = Model::default();
		let vars = prb.new_int_vars(2, (1..=4).into());
		prb += (vars[0] + vars[1]).leq(3);
		let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
		let vars: Vec<_> = vars.iter().map(|v| map.get(&(*v).into())).collect();
		slv.expect_solutions(
			&vars,
			expect![[r#"
			1, 1
			1, 2
			2, 1"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_linear_le_unsat() {
		let mut prb = Model::default();
		let vars = prb.new_int_vars(2, (1..=4).into());
		prb += (vars[0] + vars[1]).leq(1);
		prb.assert_unsatisfiable();
	}

	#[test]
	#[traced_test]
	fn test_linear_ne_sat() {
		let mut prb = Model::default();
		let vars = prb.new_int_vars(2, (1..=2).into());
		prb += (vars[0] + vars[1]).ne(3);
		let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
		let vars: Vec<_> = vars.iter().map(|v| map.get(&(*v).into())).collect();
		slv.expect_solutions(
			&vars,
			expect![[r#"
			1, 1
			2, 2"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_linear_scaled_terms() {
		let mut prb = Model::default();
		let vars = prb.new_int_vars(2, (1..=4).into());
		prb += (vars[0] * 2 + vars[1]).eq(6);
		let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
		let vars: Vec<_> = vars.iter().map(|v| map.get(&(*v).into())).collect();
		slv.expect_solutions(
			&vars,
			expect![[r#"
			1, 4
			2, 2"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_linear_sum_split() {
		let mut prb = Model::default();
		let vars = prb.new_int_vars(3, (1..=2).into());
		prb += vars.iter().copied().sum::<crate::IntLinExpr>().eq(4);
		let (mut slv, map): (Solver, _) = prb
			.to_solver(&InitConfig::default().with_sum_split_limit(2))
			.unwrap();
		let vars: Vec<_> = vars.iter().map(|v| map.get(&(*v).into())).collect();
		slv.expect_solutions(
			&vars,
			expect![[r#"
			1, 1, 2
			1, 2, 1
			2, 1, 1"#]],
		);
	}
}
