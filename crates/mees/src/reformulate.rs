//! Types used during the reformulation of a [`Model`] object into a
//! [`crate::Solver`] object.

use delegate::delegate;
use index_vec::IndexVec;
use thiserror::Error;

use crate::{
	actions::{
		BrancherInitActions, DecisionActions, InspectionActions, PropagatorInitActions,
		ReformulationActions, TrailingActions,
	},
	branchers::BoxedBrancher,
	constraints::{
		all_different_int::{IntAllDifferent, IntAllDifferentExcept0},
		all_equal_int::{IntAllEqual, IntNotAllEqual},
		among_int::IntAmong,
		bool_logic::{BoolAnd, BoolEquiv, BoolImplies, BoolOr, BoolXor},
		global_cardinality_int::IntGlobalCardinality,
		int_linear::IntLinear,
		BoxedPropagator, Constraint,
	},
	solver::{
		activation_list::IntPropCond,
		engine::PropRef,
		int_var::IntVar,
		queue::PriorityLevel,
		trail::TrailedInt,
		view::{IntViewInner, View},
		BoolView, IntView,
	},
	BoolDecision, Decision, IntDecision, IntDecisionInner, IntSetVal, IntVal, Model, Solver,
};

index_vec::define_index_type! {
	/// Reference type for integer decision variables in a [`Model`].
	pub(crate) struct IntDecisionIndex = u32;
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The stored constraints of a [`Model`] object.
///
/// Constraints are stored using their original types to allow the model to be
/// inspected and extended before it is reformulated.
pub(crate) enum ConstraintStore {
	/// All (non-zero) variables must take different values.
	AllDifferentExcept0Int(IntAllDifferentExcept0),
	/// All variables must take different values.
	AllDifferentInt(IntAllDifferent),
	/// All variables must take the same value.
	AllEqualInt(IntAllEqual),
	/// A count of how many variables take a value from a set.
	AmongInt(IntAmong),
	/// A conjunction of Boolean decisions.
	BoolAnd(BoolAnd),
	/// An equivalence of two Boolean decisions.
	BoolEquiv(BoolEquiv),
	/// An implication between two Boolean decisions.
	BoolImplies(BoolImplies),
	/// A disjunction of Boolean decisions.
	BoolOr(BoolOr),
	/// An odd parity constraint over Boolean decisions.
	BoolXor(BoolXor),
	/// Counts of the occurrences of values among variables.
	GlobalCardinalityInt(IntGlobalCardinality),
	/// A linear (in)equality over integer decisions.
	LinearInt(IntLinear),
	/// The variables must not all take the same value.
	NotAllEqualInt(IntNotAllEqual),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
/// Configuration object for the reformulation process of a [`Model`] into a
/// [`Solver`], started by [`Model::to_solver`].
pub struct InitConfig {
	/// The maximum number of terms in a linear constraint before it is split
	/// using intermediate sum variables.
	sum_split_limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Definition of an integer decision variable in a [`Model`].
pub(crate) struct IntDecisionDef {
	/// Whether the solver variable should only maintain its bounds.
	pub(crate) bounded: bool,
	/// The set of values the variable can take.
	pub(crate) domain: IntSetVal,
	/// Optional name of the variable, used for debugging.
	pub(crate) name: Option<String>,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Errors that can occur when constructing constraints for a [`Model`].
pub enum ModelBuildError {
	/// The list of counted values contains the same value twice.
	#[error("the counted values must be unique")]
	DuplicateCountedValues,
	/// Two related argument lists have different lengths.
	#[error("the number of values must be equal to the number of counts")]
	MismatchedCounts,
}

/// Context object used during the reformulation of a [`Model`] into a
/// [`Solver`].
pub(crate) struct ReformulationContext<'a> {
	/// The resulting solver object.
	pub(crate) slv: &'a mut Solver,
	/// The mapping from model decision variables to solver views.
	pub(crate) map: &'a ReformulationMap,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Errors that can occur during the reformulation of a [`Model`] into a
/// [`Solver`].
pub enum ReformulationError {
	/// The model was found to contain a contradiction during reformulation.
	#[error("the problem is trivially unsatisfiable")]
	TrivialUnsatisfiable,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Mapping from [`Model`] decision variables to [`Solver`] views, resulting
/// from the reformulation process.
pub struct ReformulationMap {
	/// The solver views for the integer decision variables of the model.
	pub(crate) int_map: IndexVec<IntDecisionIndex, IntView>,
}

impl ConstraintStore {
	/// Encode the constraint in the solver object of the given reformulation
	/// context.
	pub(crate) fn to_solver(
		&self,
		ctx: &mut ReformulationContext<'_>,
		config: &InitConfig,
	) -> Result<(), ReformulationError> {
		match self {
			ConstraintStore::AllDifferentExcept0Int(c) => c.to_solver(ctx, config),
			ConstraintStore::AllDifferentInt(c) => c.to_solver(ctx, config),
			ConstraintStore::AllEqualInt(c) => c.to_solver(ctx, config),
			ConstraintStore::AmongInt(c) => c.to_solver(ctx, config),
			ConstraintStore::BoolAnd(c) => c.to_solver(ctx, config),
			ConstraintStore::BoolEquiv(c) => c.to_solver(ctx, config),
			ConstraintStore::BoolImplies(c) => c.to_solver(ctx, config),
			ConstraintStore::BoolOr(c) => c.to_solver(ctx, config),
			ConstraintStore::BoolXor(c) => c.to_solver(ctx, config),
			ConstraintStore::GlobalCardinalityInt(c) => c.to_solver(ctx, config),
			ConstraintStore::LinearInt(c) => c.to_solver(ctx, config),
			ConstraintStore::NotAllEqualInt(c) => c.to_solver(ctx, config),
		}
	}
}

impl InitConfig {
	/// The default maximum number of terms in a linear constraint before
	/// intermediate sum variables are introduced.
	pub const DEFAULT_SUM_SPLIT_LIMIT: usize = 100;

	/// Get the maximum number of terms in a linear constraint before it is
	/// split using intermediate sum variables.
	pub fn sum_split_limit(&self) -> usize {
		self.sum_split_limit
			.unwrap_or(Self::DEFAULT_SUM_SPLIT_LIMIT)
	}

	/// Change the maximum number of terms in a linear constraint before it is
	/// split using intermediate sum variables.
	pub fn with_sum_split_limit(mut self, limit: usize) -> Self {
		self.sum_split_limit = Some(limit.max(2));
		self
	}
}

impl IntDecisionDef {
	/// Create a new integer decision variable definition with the given domain.
	pub(crate) fn with_domain(domain: IntSetVal) -> Self {
		Self {
			bounded: false,
			domain,
			name: None,
		}
	}
}

impl ReformulationMap {
	/// Lookup the solver [`View`] to which the given model [`Decision`] maps.
	pub fn get(&self, decision: &Decision) -> View {
		match decision {
			Decision::Bool(b) => View::Bool(self.get_bool(b)),
			Decision::Int(i) => View::Int(self.get_int(i)),
		}
	}

	/// Lookup the solver [`BoolView`] to which the given model [`BoolDecision`]
	/// maps.
	pub fn get_bool(&self, bv: &BoolDecision) -> BoolView {
		BoolView(self.get_int(&bv.0))
	}

	/// Lookup the solver [`IntView`] to which the given model [`IntDecision`]
	/// maps.
	pub fn get_int(&self, iv: &IntDecision) -> IntView {
		match iv.0 {
			IntDecisionInner::Var(i) => self.int_map[i],
			IntDecisionInner::Const(c) => IntView(IntViewInner::Const(c)),
			IntDecisionInner::Linear(t, i) => (self.int_map[i] * t.scale) + t.offset,
		}
	}
}

impl BrancherInitActions for ReformulationContext<'_> {
	delegate! {
		to self.slv {
			fn new_trailed_int(&mut self, init: IntVal) -> TrailedInt;
			fn push_brancher(&mut self, brancher: BoxedBrancher);
		}
	}
}

impl DecisionActions for ReformulationContext<'_> {
	delegate! {
		to self.slv {
			fn get_num_conflicts(&self) -> u64;
		}
	}
}

impl InspectionActions for ReformulationContext<'_> {
	delegate! {
		to self.slv {
			fn check_int_in_domain(&self, var: IntView, val: IntVal) -> bool;
			fn get_int_domain_size(&self, var: IntView) -> IntVal;
			fn get_int_lower_bound(&self, var: IntView) -> IntVal;
			fn get_int_upper_bound(&self, var: IntView) -> IntVal;
		}
	}
}

impl PropagatorInitActions for ReformulationContext<'_> {
	delegate! {
		to self.slv {
			fn add_propagator(&mut self, propagator: BoxedPropagator, priority: PriorityLevel) -> PropRef;
			fn enqueue_now(&mut self, prop: PropRef);
			fn enqueue_on_int_change(&mut self, prop: PropRef, var: IntView, condition: IntPropCond);
		}
	}
}

impl ReformulationActions for ReformulationContext<'_> {
	fn get_solver_bool(&mut self, bv: BoolDecision) -> BoolView {
		self.map.get_bool(&bv)
	}

	fn get_solver_int(&mut self, iv: IntDecision) -> IntView {
		self.map.get_int(&iv)
	}

	fn new_int_var(&mut self, domain: IntSetVal) -> IntView {
		IntVar::new_in(self.slv, domain, false)
	}
}

impl TrailingActions for ReformulationContext<'_> {
	delegate! {
		to self.slv {
			fn get_trailed_int(&self, i: TrailedInt) -> IntVal;
			fn set_trailed_int(&mut self, i: TrailedInt, v: IntVal) -> IntVal;
		}
	}
}

/// Check that the given iterator of domains yields at least one value for
/// every decision variable of the model, and return the reformulation error if
/// not.
pub(crate) fn check_non_empty_domains(model: &Model) -> Result<(), ReformulationError> {
	if model
		.int_vars
		.iter()
		.any(|def| def.domain.lower_bound().is_none())
	{
		Err(ReformulationError::TrivialUnsatisfiable)
	} else {
		Ok(())
	}
}
