//! `mees` is a finite-domain constraint programming solver.
//!
//! Problems are described declaratively using a [`Model`] object, as a
//! collection of decision variables and constraints placed upon them. The
//! model is then reformulated into a [`Solver`] object, which searches for
//! solutions using constraint propagation and chronological backtracking.

pub mod actions;
pub mod branchers;
pub mod constraints;
pub(crate) mod helpers;
pub mod reformulate;
pub mod solver;
#[cfg(test)]
mod tests;

use std::{
	iter::Sum,
	ops::{Add, AddAssign, Mul, Neg, Not, Sub},
};

use index_vec::IndexVec;

use crate::{
	branchers::{BoolBrancher, IntBrancher},
	constraints::{
		all_different_int::{IntAllDifferent, IntAllDifferentExcept0},
		all_equal_int::{IntAllEqual, IntNotAllEqual},
		among_int::IntAmong,
		bool_logic::{BoolAnd, BoolEquiv, BoolImplies, BoolOr, BoolXor},
		global_cardinality_int::IntGlobalCardinality,
		int_linear::{IntLinear, LinOperator},
	},
	helpers::linear_transform::LinearTransform,
	reformulate::{
		check_non_empty_domains, ConstraintStore, IntDecisionDef, IntDecisionIndex,
		ReformulationContext,
	},
	solver::int_var::IntVar,
};
pub use crate::{
	reformulate::{InitConfig, ModelBuildError, ReformulationError, ReformulationMap},
	solver::{
		Goal, InitStatistics, IntSetVal, IntVal, NonZeroIntVal, SearchStatistics, SolveResult,
		Solver, Valuation, Value, View,
	},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// A Boolean decision variable (or its negation), stored as a zero-one
/// integer decision.
pub struct BoolDecision(pub(crate) IntDecision);

#[derive(Clone, Debug, PartialEq, Eq)]
/// A search strategy to be followed by the solver, branching on a list of
/// decision variables in a given order.
pub enum Branching {
	/// Branch on the given Boolean decisions in order, fixing them to the value
	/// chosen by the [`ValueSelection`] strategy.
	Bool(Vec<BoolDecision>, ValueSelection),
	/// Branch on the given integer decisions, selecting the variable using the
	/// [`VariableSelection`] strategy and restricting it according to the
	/// [`ValueSelection`] strategy.
	Int(Vec<IntDecision>, VariableSelection, ValueSelection),
	/// Perform the given branchings in sequence, only continuing to the next
	/// when a branching has fixed all its variables.
	Seq(Vec<Branching>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// A decision variable in a [`Model`].
pub enum Decision {
	/// A Boolean decision variable.
	Bool(BoolDecision),
	/// An integer decision variable.
	Int(IntDecision),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// An integer decision variable in a [`Model`], or an integer linear
/// transformation of one.
pub struct IntDecision(pub(crate) IntDecisionInner);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// The internal representation of an [`IntDecision`].
pub(crate) enum IntDecisionInner {
	/// A constant integer value.
	Const(IntVal),
	/// A linear transformation of an integer decision variable.
	Linear(LinearTransform, IntDecisionIndex),
	/// A direct reference to an integer decision variable.
	Var(IntDecisionIndex),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// A linear expression, i.e. a sum of integer decisions, which can be compared
/// to a constant to form an [`IntLinear`] constraint.
pub struct IntLinExpr {
	/// The integer decisions being summed.
	terms: Vec<IntDecision>,
}

#[derive(Clone, Debug, Default)]
/// A formulation of a problem instance in terms of decision variables and
/// constraints, which can be reformulated into a [`Solver`] object to search
/// for solutions.
pub struct Model {
	/// The search strategies to be followed by the solver.
	branchings: Vec<Branching>,
	/// The constraints of the problem.
	constraints: Vec<ConstraintStore>,
	/// The definitions of the integer decision variables.
	pub(crate) int_vars: IndexVec<IntDecisionIndex, IntDecisionDef>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Strategies for restricting the domain of a selected decision variable when
/// branching.
pub enum ValueSelection {
	/// Fix the variable to the largest value in its domain.
	IndomainMax,
	/// Fix the variable to the smallest value in its domain.
	IndomainMin,
	/// Remove the largest value in the domain of the variable.
	OutdomainMax,
	/// Remove the smallest value in the domain of the variable.
	OutdomainMin,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Strategies for selecting the next decision variable to branch on.
pub enum VariableSelection {
	/// Select the unfixed variable with the largest domain.
	AntiFirstFail,
	/// Select the unfixed variable with the smallest domain.
	FirstFail,
	/// Select the first unfixed variable in the order given.
	InputOrder,
	/// Select the unfixed variable with the largest upper bound.
	Largest,
	/// Select the unfixed variable with the smallest lower bound.
	Smallest,
}

/// Create an `all_different_int` constraint that enforces that the given
/// integer decisions take different values.
///
/// The constraint performs value consistent propagation unless changed using
/// [`IntAllDifferent::with_consistency`].
pub fn all_different_int(vars: impl IntoIterator<Item = IntDecision>) -> IntAllDifferent {
	IntAllDifferent {
		vars: vars.into_iter().collect(),
		consistency: Default::default(),
	}
}

/// Create an `all_different_except_0` constraint that enforces that the given
/// integer decisions that take non-zero values are pairwise different.
pub fn all_different_except_0_int(
	vars: impl IntoIterator<Item = IntDecision>,
) -> IntAllDifferentExcept0 {
	IntAllDifferentExcept0 {
		vars: vars.into_iter().collect(),
	}
}

/// Create an `all_equal_int` constraint that enforces that the given integer
/// decisions take the same value.
pub fn all_equal_int(vars: impl IntoIterator<Item = IntDecision>) -> IntAllEqual {
	IntAllEqual {
		vars: vars.into_iter().collect(),
	}
}

/// Create an `among_int` constraint that enforces that `count` equals the
/// number of the given integer decisions that take a value in `values`.
pub fn among_int(
	count: IntDecision,
	vars: impl IntoIterator<Item = IntDecision>,
	values: IntSetVal,
) -> IntAmong {
	IntAmong {
		count,
		vars: vars.into_iter().collect(),
		values,
	}
}

/// Create a `bool_and` constraint that enforces that all the given Boolean
/// decisions are `true`.
pub fn bool_and(terms: impl IntoIterator<Item = BoolDecision>) -> BoolAnd {
	bool_and_reif(terms, true.into())
}

/// Create a `bool_and` constraint that enforces that `result` is `true`
/// exactly when all the given Boolean decisions are `true`.
pub fn bool_and_reif(
	terms: impl IntoIterator<Item = BoolDecision>,
	result: BoolDecision,
) -> BoolAnd {
	BoolAnd {
		result,
		terms: terms.into_iter().collect(),
	}
}

/// Create a `bool_equiv` constraint that enforces that two Boolean decisions
/// take the same value.
pub fn bool_equiv(lhs: BoolDecision, rhs: BoolDecision) -> BoolEquiv {
	bool_equiv_reif(lhs, rhs, true.into())
}

/// Create a `bool_equiv` constraint that enforces that `result` is `true`
/// exactly when the two Boolean decisions take the same value.
pub fn bool_equiv_reif(lhs: BoolDecision, rhs: BoolDecision, result: BoolDecision) -> BoolEquiv {
	BoolEquiv { lhs, result, rhs }
}

/// Create a `bool_implies` constraint that enforces that if `antecedent`
/// holds, then `consequent` holds as well.
pub fn bool_implies(antecedent: BoolDecision, consequent: BoolDecision) -> BoolImplies {
	bool_implies_reif(antecedent, consequent, true.into())
}

/// Create a `bool_implies` constraint that enforces that `result` is `true`
/// exactly when `antecedent` holding implies that `consequent` holds.
pub fn bool_implies_reif(
	antecedent: BoolDecision,
	consequent: BoolDecision,
	result: BoolDecision,
) -> BoolImplies {
	BoolImplies {
		antecedent,
		consequent,
		result,
	}
}

/// Create a `bool_or` constraint that enforces that at least one of the given
/// Boolean decisions is `true`.
pub fn bool_or(terms: impl IntoIterator<Item = BoolDecision>) -> BoolOr {
	bool_or_reif(terms, true.into())
}

/// Create a `bool_or` constraint that enforces that `result` is `true` exactly
/// when at least one of the given Boolean decisions is `true`.
pub fn bool_or_reif(
	terms: impl IntoIterator<Item = BoolDecision>,
	result: BoolDecision,
) -> BoolOr {
	BoolOr {
		result,
		terms: terms.into_iter().collect(),
	}
}

/// Create a `bool_xor` constraint that enforces that an odd number of the
/// given Boolean decisions is `true`.
pub fn bool_xor(terms: impl IntoIterator<Item = BoolDecision>) -> BoolXor {
	bool_xor_reif(terms, true.into())
}

/// Create a `bool_xor` constraint that enforces that `result` is `true`
/// exactly when an odd number of the given Boolean decisions is `true`.
pub fn bool_xor_reif(
	terms: impl IntoIterator<Item = BoolDecision>,
	result: BoolDecision,
) -> BoolXor {
	BoolXor {
		result,
		terms: terms.into_iter().collect(),
	}
}

/// Create a `global_cardinality_int` constraint that enforces that for every
/// index `i`, the decision `counts[i]` equals the number of the given integer
/// decisions fixed to `values[i]`.
///
/// When `closed` is `true`, the variables are additionally restricted to only
/// take values from `values`.
pub fn global_cardinality_int(
	vars: impl IntoIterator<Item = IntDecision>,
	values: Vec<IntVal>,
	counts: Vec<IntDecision>,
	closed: bool,
) -> Result<IntGlobalCardinality, ModelBuildError> {
	if values.len() != counts.len() {
		return Err(ModelBuildError::MismatchedCounts);
	}
	let mut sorted = values.clone();
	sorted.sort_unstable();
	sorted.dedup();
	if sorted.len() != values.len() {
		return Err(ModelBuildError::DuplicateCountedValues);
	}
	Ok(IntGlobalCardinality {
		closed,
		counts,
		values,
		vars: vars.into_iter().collect(),
	})
}

/// Create a `not_all_equal_int` constraint that enforces that at least two of
/// the given integer decisions take different values.
pub fn not_all_equal_int(vars: impl IntoIterator<Item = IntDecision>) -> IntNotAllEqual {
	IntNotAllEqual {
		vars: vars.into_iter().collect(),
	}
}

impl Branching {
	/// Create the solver brancher objects that perform this search strategy.
	pub(crate) fn to_solver(&self, ctx: &mut ReformulationContext<'_>) {
		match self {
			Branching::Bool(vars, val_sel) => {
				let vars = vars.iter().map(|b| ctx.map.get_bool(b)).collect();
				BoolBrancher::new_in(ctx, vars, *val_sel);
			}
			Branching::Int(vars, var_sel, val_sel) => {
				let vars = vars.iter().map(|v| ctx.map.get_int(v)).collect();
				IntBrancher::new_in(ctx, vars, *var_sel, *val_sel);
			}
			Branching::Seq(branchings) => {
				for b in branchings {
					b.to_solver(ctx);
				}
			}
		}
	}
}

impl From<bool> for BoolDecision {
	fn from(value: bool) -> Self {
		BoolDecision(IntDecision::from(IntVal::from(value)))
	}
}

impl From<BoolDecision> for Decision {
	fn from(value: BoolDecision) -> Self {
		Decision::Bool(value)
	}
}

impl From<BoolDecision> for IntDecision {
	fn from(value: BoolDecision) -> Self {
		value.0
	}
}

impl Not for BoolDecision {
	type Output = BoolDecision;

	fn not(self) -> Self::Output {
		BoolDecision(-self.0 + 1)
	}
}

impl Add<IntDecision> for IntDecision {
	type Output = IntLinExpr;

	fn add(self, rhs: IntDecision) -> Self::Output {
		IntLinExpr {
			terms: vec![self, rhs],
		}
	}
}

impl Add<IntVal> for IntDecision {
	type Output = IntDecision;

	fn add(self, rhs: IntVal) -> Self::Output {
		if rhs == 0 {
			return self;
		}
		IntDecision(match self.0 {
			IntDecisionInner::Const(c) => IntDecisionInner::Const(c + rhs),
			IntDecisionInner::Linear(t, v) => {
				let t = t + rhs;
				if t.is_identity() {
					IntDecisionInner::Var(v)
				} else {
					IntDecisionInner::Linear(t, v)
				}
			}
			IntDecisionInner::Var(v) => {
				IntDecisionInner::Linear(LinearTransform::offset(rhs), v)
			}
		})
	}
}

impl From<IntVal> for IntDecision {
	fn from(value: IntVal) -> Self {
		IntDecision(IntDecisionInner::Const(value))
	}
}

impl From<IntDecision> for Decision {
	fn from(value: IntDecision) -> Self {
		Decision::Int(value)
	}
}

impl Mul<IntVal> for IntDecision {
	type Output = IntDecision;

	fn mul(self, rhs: IntVal) -> Self::Output {
		let Some(scale) = NonZeroIntVal::new(rhs) else {
			return IntDecision(IntDecisionInner::Const(0));
		};
		IntDecision(match self.0 {
			IntDecisionInner::Const(c) => IntDecisionInner::Const(c * rhs),
			IntDecisionInner::Linear(t, v) => {
				let t = t * scale;
				if t.is_identity() {
					IntDecisionInner::Var(v)
				} else {
					IntDecisionInner::Linear(t, v)
				}
			}
			IntDecisionInner::Var(v) => {
				IntDecisionInner::Linear(LinearTransform::scaled(scale), v)
			}
		})
	}
}

impl Neg for IntDecision {
	type Output = IntDecision;

	fn neg(self) -> Self::Output {
		self * -1
	}
}

impl Sub<IntDecision> for IntDecision {
	type Output = IntLinExpr;

	fn sub(self, rhs: IntDecision) -> Self::Output {
		self + -rhs
	}
}

impl IntLinExpr {
	/// Create an [`IntLinear`] constraint that enforces that the sum of the
	/// expression is equal to the given value.
	pub fn eq(self, rhs: IntVal) -> IntLinear {
		IntLinear {
			terms: self.terms,
			operator: LinOperator::Equal,
			rhs,
		}
	}

	/// Create an [`IntLinear`] constraint that enforces that the sum of the
	/// expression is greater than or equal to the given value.
	pub fn geq(self, rhs: IntVal) -> IntLinear {
		IntLinear {
			terms: self.terms.iter().map(|&t| -t).collect(),
			operator: LinOperator::LessEq,
			rhs: -rhs,
		}
	}

	/// Create an [`IntLinear`] constraint that enforces that the sum of the
	/// expression is greater than the given value.
	pub fn gt(self, rhs: IntVal) -> IntLinear {
		self.geq(rhs + 1)
	}

	/// Create an [`IntLinear`] constraint that enforces that the sum of the
	/// expression is less than or equal to the given value.
	pub fn leq(self, rhs: IntVal) -> IntLinear {
		IntLinear {
			terms: self.terms,
			operator: LinOperator::LessEq,
			rhs,
		}
	}

	/// Create an [`IntLinear`] constraint that enforces that the sum of the
	/// expression is less than the given value.
	pub fn lt(self, rhs: IntVal) -> IntLinear {
		self.leq(rhs - 1)
	}

	/// Create an [`IntLinear`] constraint that enforces that the sum of the
	/// expression is not equal to the given value.
	pub fn ne(self, rhs: IntVal) -> IntLinear {
		IntLinear {
			terms: self.terms,
			operator: LinOperator::NotEqual,
			rhs,
		}
	}
}

impl Add<IntDecision> for IntLinExpr {
	type Output = IntLinExpr;

	fn add(mut self, rhs: IntDecision) -> Self::Output {
		self.terms.push(rhs);
		self
	}
}

impl Add<IntLinExpr> for IntLinExpr {
	type Output = IntLinExpr;

	fn add(mut self, rhs: IntLinExpr) -> Self::Output {
		self.terms.extend(rhs.terms);
		self
	}
}

impl Sub<IntDecision> for IntLinExpr {
	type Output = IntLinExpr;

	fn sub(self, rhs: IntDecision) -> Self::Output {
		self + -rhs
	}
}

impl Sum<IntDecision> for IntLinExpr {
	fn sum<I: Iterator<Item = IntDecision>>(iter: I) -> Self {
		IntLinExpr {
			terms: iter.collect(),
		}
	}
}

impl Model {
	/// Create a new Boolean decision variable.
	pub fn new_bool_var(&mut self) -> BoolDecision {
		BoolDecision(self.new_int_var((0..=1).into()))
	}

	/// Create `len` new Boolean decision variables.
	pub fn new_bool_vars(&mut self, len: usize) -> Vec<BoolDecision> {
		(0..len).map(|_| self.new_bool_var()).collect()
	}

	/// Create a new integer decision variable with the given bounds, whose
	/// solver variable only maintains its bounds.
	///
	/// Propagators cannot remove values from the interior of the domain of a
	/// bounds-only variable; such removals are deferred to search. This trades
	/// pruning strength for a cheaper domain representation.
	pub fn new_bounded_int_var(&mut self, lb: IntVal, ub: IntVal) -> IntDecision {
		let mut def = IntDecisionDef::with_domain((lb..=ub).into());
		def.bounded = true;
		let index = self.int_vars.push(def);
		IntDecision(IntDecisionInner::Var(index))
	}

	/// Create a new integer decision variable with the given domain.
	pub fn new_int_var(&mut self, domain: IntSetVal) -> IntDecision {
		let index = self.int_vars.push(IntDecisionDef::with_domain(domain));
		IntDecision(IntDecisionInner::Var(index))
	}

	/// Create a new integer decision variable with the given domain and name.
	pub fn new_int_var_named(
		&mut self,
		domain: IntSetVal,
		name: impl Into<String>,
	) -> IntDecision {
		let mut def = IntDecisionDef::with_domain(domain);
		def.name = Some(name.into());
		let index = self.int_vars.push(def);
		IntDecision(IntDecisionInner::Var(index))
	}

	/// Get the name that was given to an integer decision variable, if any.
	pub fn int_decision_name(&self, iv: IntDecision) -> Option<&str> {
		match iv.0 {
			IntDecisionInner::Var(i) => self.int_vars[i].name.as_deref(),
			IntDecisionInner::Linear(_, i) => self.int_vars[i].name.as_deref(),
			IntDecisionInner::Const(_) => None,
		}
	}

	/// Create `len` new integer decision variables with the given domain.
	pub fn new_int_vars(&mut self, len: usize, domain: IntSetVal) -> Vec<IntDecision> {
		(0..len)
			.map(|_| self.new_int_var(domain.clone()))
			.collect()
	}

	/// Reformulate the model into a [`Solver`] object that can search for its
	/// solutions, and a [`ReformulationMap`] that links the decision variables
	/// of the model to the views of the solver.
	pub fn to_solver(
		&self,
		config: &InitConfig,
	) -> Result<(Solver, ReformulationMap), ReformulationError> {
		check_non_empty_domains(self)?;

		let mut slv = Solver::default();
		let int_map = self
			.int_vars
			.iter()
			.map(|def| IntVar::new_in(&mut slv, def.domain.clone(), def.bounded))
			.collect();
		let map = ReformulationMap { int_map };

		let mut ctx = ReformulationContext {
			slv: &mut slv,
			map: &map,
		};
		for c in &self.constraints {
			c.to_solver(&mut ctx, config)?;
		}
		for b in &self.branchings {
			b.to_solver(&mut ctx);
		}
		// Fallback strategy for any variable the branchings leave unfixed.
		let all_vars: Vec<_> = map.int_map.iter().copied().collect();
		IntBrancher::new_in(
			&mut ctx,
			all_vars,
			VariableSelection::InputOrder,
			ValueSelection::IndomainMin,
		);

		Ok((slv, map))
	}
}

#[cfg(test)]
impl Model {
	/// Assert that the problem has no solutions.
	pub(crate) fn assert_unsatisfiable(&self) {
		match self.to_solver(&InitConfig::default()) {
			Err(ReformulationError::TrivialUnsatisfiable) => {}
			Ok((mut slv, _)) => {
				let result = slv.solve(|_| {});
				assert_eq!(
					result,
					SolveResult::Unsatisfiable,
					"problem unexpectedly has a solution"
				);
			}
		}
	}
}

impl AddAssign<Branching> for Model {
	fn add_assign(&mut self, rhs: Branching) {
		self.branchings.push(rhs);
	}
}

impl AddAssign<BoolAnd> for Model {
	fn add_assign(&mut self, rhs: BoolAnd) {
		self.constraints.push(ConstraintStore::BoolAnd(rhs));
	}
}

impl AddAssign<BoolEquiv> for Model {
	fn add_assign(&mut self, rhs: BoolEquiv) {
		self.constraints.push(ConstraintStore::BoolEquiv(rhs));
	}
}

impl AddAssign<BoolImplies> for Model {
	fn add_assign(&mut self, rhs: BoolImplies) {
		self.constraints.push(ConstraintStore::BoolImplies(rhs));
	}
}

impl AddAssign<BoolOr> for Model {
	fn add_assign(&mut self, rhs: BoolOr) {
		self.constraints.push(ConstraintStore::BoolOr(rhs));
	}
}

impl AddAssign<BoolXor> for Model {
	fn add_assign(&mut self, rhs: BoolXor) {
		self.constraints.push(ConstraintStore::BoolXor(rhs));
	}
}

impl AddAssign<IntAllDifferent> for Model {
	fn add_assign(&mut self, rhs: IntAllDifferent) {
		self.constraints.push(ConstraintStore::AllDifferentInt(rhs));
	}
}

impl AddAssign<IntAllDifferentExcept0> for Model {
	fn add_assign(&mut self, rhs: IntAllDifferentExcept0) {
		self.constraints
			.push(ConstraintStore::AllDifferentExcept0Int(rhs));
	}
}

impl AddAssign<IntAllEqual> for Model {
	fn add_assign(&mut self, rhs: IntAllEqual) {
		self.constraints.push(ConstraintStore::AllEqualInt(rhs));
	}
}

impl AddAssign<IntAmong> for Model {
	fn add_assign(&mut self, rhs: IntAmong) {
		self.constraints.push(ConstraintStore::AmongInt(rhs));
	}
}

impl AddAssign<IntGlobalCardinality> for Model {
	fn add_assign(&mut self, rhs: IntGlobalCardinality) {
		self.constraints
			.push(ConstraintStore::GlobalCardinalityInt(rhs));
	}
}

impl AddAssign<IntLinear> for Model {
	fn add_assign(&mut self, rhs: IntLinear) {
		self.constraints.push(ConstraintStore::LinearInt(rhs));
	}
}

impl AddAssign<IntNotAllEqual> for Model {
	fn add_assign(&mut self, rhs: IntNotAllEqual) {
		self.constraints.push(ConstraintStore::NotAllEqualInt(rhs));
	}
}
