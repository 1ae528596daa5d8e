//! Structures and algorithms for logic constraints over Boolean decision
//! variables.
//!
//! Boolean decisions are zero-one integer decisions, which allows the logic
//! constraints to be decomposed into linear constraints over their integer
//! representations. Parity reasoning, used by [`BoolXor`] and the reified form
//! of [`BoolEquiv`], uses the dedicated [`BoolXorValue`] propagator.
//!
//! Every constraint carries a `result` decision that is constrained to be
//! equivalent to the connective. The plain constraint builders pass the
//! constant `true` as the result, which selects a cheaper decomposition that
//! simply asserts the connective.

use crate::{
	actions::{InspectionActions, PropagationActions, PropagatorInitActions, ReformulationActions},
	constraints::{int_linear::IntLinearLessEqBounds, Conflict, Constraint, Propagator},
	reformulate::{InitConfig, ReformulationError},
	solver::{
		activation_list::IntPropCond,
		queue::PriorityLevel,
		solving_context::SolvingContext,
		view::{BoolView, IntView, IntViewInner},
	},
	BoolDecision, IntVal,
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Representation of the `bool_and` constraint, which enforces that `result`
/// holds exactly when all the given Boolean decisions hold.
pub struct BoolAnd {
	/// The decision that reflects whether the conjunction holds.
	pub(crate) result: BoolDecision,
	/// The decisions over which the conjunction ranges.
	pub(crate) terms: Vec<BoolDecision>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Representation of the `bool_equiv` constraint, which enforces that `result`
/// holds exactly when the two Boolean decisions take the same value.
pub struct BoolEquiv {
	/// The left hand side of the equivalence.
	pub(crate) lhs: BoolDecision,
	/// The decision that reflects whether the equivalence holds.
	pub(crate) result: BoolDecision,
	/// The right hand side of the equivalence.
	pub(crate) rhs: BoolDecision,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Representation of the `bool_implies` constraint, which enforces that
/// `result` holds exactly when the antecedent holding implies that the
/// consequent holds.
pub struct BoolImplies {
	/// The antecedent of the implication.
	pub(crate) antecedent: BoolDecision,
	/// The consequent of the implication.
	pub(crate) consequent: BoolDecision,
	/// The decision that reflects whether the implication holds.
	pub(crate) result: BoolDecision,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Representation of the `bool_or` constraint, which enforces that `result`
/// holds exactly when at least one of the given Boolean decisions holds.
pub struct BoolOr {
	/// The decision that reflects whether the disjunction holds.
	pub(crate) result: BoolDecision,
	/// The decisions over which the disjunction ranges.
	pub(crate) terms: Vec<BoolDecision>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Representation of the `bool_xor` constraint, which enforces that `result`
/// holds exactly when an odd number of the given Boolean decisions holds.
pub struct BoolXor {
	/// The decision that reflects whether the parity holds.
	pub(crate) result: BoolDecision,
	/// The decisions over which the parity ranges.
	pub(crate) terms: Vec<BoolDecision>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Parity propagator backing the `bool_xor` constraint.
///
/// The propagator waits until at most one term is unfixed, and then fixes the
/// remaining term so that an odd number of terms holds.
pub(crate) struct BoolXorValue {
	/// The zero-one views of which an odd number must be one.
	terms: Vec<IntView>,
}

/// Check whether a Boolean view is the constant `true`.
fn is_const_true(view: BoolView) -> bool {
	matches!(view.0, IntView(IntViewInner::Const(1)))
}

impl Constraint for BoolAnd {
	fn to_solver(
		&self,
		slv: &mut dyn ReformulationActions,
		_config: &InitConfig,
	) -> Result<(), ReformulationError> {
		let result = slv.get_solver_bool(self.result);
		let terms: Vec<IntView> = self
			.terms
			.iter()
			.map(|&t| slv.get_solver_bool(t).0)
			.collect();
		if is_const_true(result) {
			for &t in &terms {
				IntLinearLessEqBounds::new_in(slv, [-t], -1);
			}
		} else {
			// result -> t, for every term t
			for &t in &terms {
				IntLinearLessEqBounds::new_in(slv, [result.0, -t], 0);
			}
			// all terms -> result
			let max = terms.len() as IntVal - 1;
			let mut sum = terms;
			sum.push(-result.0);
			IntLinearLessEqBounds::new_in(slv, sum, max);
		}
		Ok(())
	}
}

impl Constraint for BoolEquiv {
	fn to_solver(
		&self,
		slv: &mut dyn ReformulationActions,
		_config: &InitConfig,
	) -> Result<(), ReformulationError> {
		let lhs = slv.get_solver_bool(self.lhs);
		let rhs = slv.get_solver_bool(self.rhs);
		let result = slv.get_solver_bool(self.result);
		if is_const_true(result) {
			IntLinearLessEqBounds::new_in(slv, [lhs.0, -rhs.0], 0);
			IntLinearLessEqBounds::new_in(slv, [rhs.0, -lhs.0], 0);
		} else {
			// result = lhs <-> rhs, i.e. an odd number of {lhs, rhs, result}
			// holds
			BoolXorValue::new_in(slv, vec![lhs.0, rhs.0, result.0]);
		}
		Ok(())
	}
}

impl Constraint for BoolImplies {
	fn to_solver(
		&self,
		slv: &mut dyn ReformulationActions,
		_config: &InitConfig,
	) -> Result<(), ReformulationError> {
		let antecedent = slv.get_solver_bool(self.antecedent);
		let consequent = slv.get_solver_bool(self.consequent);
		let result = slv.get_solver_bool(self.result);
		if is_const_true(result) {
			IntLinearLessEqBounds::new_in(slv, [antecedent.0, -consequent.0], 0);
		} else {
			// !antecedent -> result
			IntLinearLessEqBounds::new_in(slv, [-antecedent.0, -result.0], -1);
			// consequent -> result
			IntLinearLessEqBounds::new_in(slv, [consequent.0, -result.0], 0);
			// result -> (!antecedent \/ consequent)
			IntLinearLessEqBounds::new_in(slv, [result.0, antecedent.0, -consequent.0], 1);
		}
		Ok(())
	}
}

impl Constraint for BoolOr {
	fn to_solver(
		&self,
		slv: &mut dyn ReformulationActions,
		_config: &InitConfig,
	) -> Result<(), ReformulationError> {
		let result = slv.get_solver_bool(self.result);
		let terms: Vec<IntView> = self
			.terms
			.iter()
			.map(|&t| slv.get_solver_bool(t).0)
			.collect();
		if is_const_true(result) {
			let negated: Vec<IntView> = terms.iter().map(|&t| -t).collect();
			IntLinearLessEqBounds::new_in(slv, negated, -1);
		} else {
			// t -> result, for every term t
			for &t in &terms {
				IntLinearLessEqBounds::new_in(slv, [t, -result.0], 0);
			}
			// result -> at least one term
			let mut sum: Vec<IntView> = terms.iter().map(|&t| -t).collect();
			sum.push(result.0);
			IntLinearLessEqBounds::new_in(slv, sum, 0);
		}
		Ok(())
	}
}

impl Constraint for BoolXor {
	fn to_solver(
		&self,
		slv: &mut dyn ReformulationActions,
		_config: &InitConfig,
	) -> Result<(), ReformulationError> {
		// result = t1 xor ... xor tn, i.e. an odd number of
		// {t1, ..., tn, !result} holds
		let mut terms: Vec<IntView> = self
			.terms
			.iter()
			.map(|&t| slv.get_solver_bool(t).0)
			.collect();
		terms.push(slv.get_solver_bool(!self.result).0);
		BoolXorValue::new_in(slv, terms);
		Ok(())
	}
}

impl BoolXorValue {
	/// Create a new [`BoolXorValue`] propagator and post it in the solver.
	pub(crate) fn new_in(slv: &mut (impl PropagatorInitActions + ?Sized), terms: Vec<IntView>) {
		let subscribe = terms.clone();
		let prop = slv.add_propagator(Box::new(Self { terms }), PriorityLevel::Highest);
		slv.enqueue_now(prop);
		for v in subscribe {
			slv.enqueue_on_int_change(prop, v, IntPropCond::Fixed);
		}
	}
}

impl Propagator<SolvingContext<'_>> for BoolXorValue {
	#[tracing::instrument(name = "bool_xor", level = "trace", skip(self, actions))]
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
			actions.set_int_val(v, 1 - (sum % 2))
		} else if sum % 2 == 0 {
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

	use crate::{
		bool_and, bool_and_reif, bool_equiv, bool_equiv_reif, bool_implies, bool_implies_reif,
		bool_or, bool_or_reif, bool_xor, bool_xor_reif, reformulate::InitConfig, Model, Solver,
	};

	#[test]
	#[traced_test]
	fn test_bool_and() {
		let mut prb = Model::default();
		let vars = prb.new_bool_vars(2);
		prb += bool_and(vars.clone());
		let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
		let vars: Vec<_> = vars.iter().map(|v| map.get(&(*v).into())).collect();
		slv.expect_solutions(
			&vars,
			expect![[r#"
			true, true"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_bool_and_reif() {
		let mut prb = Model::default();
		let a = prb.new_bool_var();
		let b = prb.new_bool_var();
		let r = prb.new_bool_var();
		prb += bool_and_reif(vec![a, b], r);
		let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
		let vars: Vec<_> = [a, b, r].iter().map(|v| map.get(&(*v).into())).collect();
		slv.expect_solutions(
			&vars,
			expect![[r#"
			false, false, false
			false, true, false
			true, false, false
			true, true, true"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_bool_equiv() {
		let mut prb = Model::default();
		let a = prb.new_bool_var();
		let b = prb.new_bool_var();
		prb += bool_equiv(a, b);
		let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
		let vars: Vec<_> = [a, b].iter().map(|v| map.get(&(*v).into())).collect();
		slv.expect_solutions(
			&vars,
			expect![[r#"
			false, false
			true, true"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_bool_equiv_reif() {
		let mut prb = Model::default();
		let a = prb.new_bool_var();
		let b = prb.new_bool_var();
		let r = prb.new_bool_var();
		prb += bool_equiv_reif(a, b, r);
		let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
		let vars: Vec<_> = [a, b, r].iter().map(|v| map.get(&(*v).into())).collect();
		slv.expect_solutions(
			&vars,
			expect![[r#"
			false, false, true
			false, true, false
			true, false, false
			true, true, true"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_bool_implies() {
		let mut prb = Model::default();
		let a = prb.new_bool_var();
		let b = prb.new_bool_var();
		prb += bool_implies(a, b);
		let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
		let vars: Vec<_> = [a, b].iter().map(|v| map.get(&(*v).into())).collect();
		slv.expect_solutions(
			&vars,
			expect![[r#"
			false, false
			false, true
			true, true"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_bool_implies_reif() {
		let mut prb = Model::default();
		let a = prb.new_bool_var();
		let b = prb.new_bool_var();
		let r = prb.new_bool_var();
		prb += bool_implies_reif(a, b, r);
		let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
		let vars: Vec<_> = [a, b, r].iter().map(|v| map.get(&(*v).into())).collect();
		slv.expect_solutions(
			&vars,
			expect![[r#"
			false, false, true
			false, true, true
			true, false, false
			true, true, true"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_bool_or_negations() {
		let mut prb = Model::default();
		let a = prb.new_bool_var();
		let b = prb.new_bool_var();
		prb += bool_or(vec![!a, !b]);
		let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
		let vars: Vec<_> = [a, b].iter().map(|v| map.get(&(*v).into())).collect();
		slv.expect_solutions(
			&vars,
			expect![[r#"
			false, false
			false, true
			true, false"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_bool_or_reif() {
		let mut prb = Model::default();
		let a = prb.new_bool_var();
		let b = prb.new_bool_var();
		let r = prb.new_bool_var();
		prb += bool_or_reif(vec![a, b], r);
		let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
		let vars: Vec<_> = [a, b, r].iter().map(|v| map.get(&(*v).into())).collect();
		slv.expect_solutions(
			&vars,
			expect![[r#"
			false, false, false
			false, true, true
			true, false, true
			true, true, true"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_bool_xor() {
		let mut prb = Model::default();
		let vars = prb.new_bool_vars(3);
		prb += bool_xor(vars.clone());
		let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
		let vars: Vec<_> = vars.iter().map(|v| map.get(&(*v).into())).collect();
		slv.expect_solutions(
			&vars,
			expect![[r#"
			false, false, true
			false, true, false
			true, false, false
			true, true, true"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_bool_xor_reif() {
		let mut prb = Model::default();
		let a = prb.new_bool_var();
		let b = prb.new_bool_var();
		let r = prb.new_bool_var();
		prb += bool_xor_reif(vec![a, b], r);
		let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
		let vars: Vec<_> = [a, b, r].iter().map(|v| map.get(&(*v).into())).collect();
		slv.expect_solutions(
			&vars,
			expect![[r#"
			false, false, false
			false, true, true
			true, false, true
			true, true, false"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_bool_xor_unsat() {
		let mut prb = Model::default();
		let a = prb.new_bool_var();
		prb += bool_xor(vec![a, a]);
		prb.assert_unsatisfiable();
	}
}
