//! Module containing the definitions for constraints and the propagators that
//! enforce them.

pub mod all_different_int;
pub mod all_equal_int;
pub mod among_int;
pub mod bool_logic;
pub mod global_cardinality_int;
pub mod int_linear;

use std::{
	error::Error,
	fmt::{self, Debug},
};

use crate::{
	actions::{PropagationActions, ReformulationActions},
	reformulate::{InitConfig, ReformulationError},
	solver::{int_var::EmptyDomain, solving_context::SolvingContext},
};

/// Type alias to represent [`Propagator`] contained in a [`Box`], that is used
/// by [`crate::solver::engine::Engine`].
pub(crate) type BoxedPropagator = Box<dyn for<'a> Propagator<SolvingContext<'a>>>;

/// Conflict is an error type returned when the current set of search decisions
/// has been found to be inconsistent with a constraint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Conflict;

/// A trait for constraints that can be placed in a [`crate::Model`] object.
///
/// Constraints specified in the library implement this trait, but are using
/// their explicit type in an enumerated type to allow for global model
/// analysis.
pub trait Constraint: Debug {
	/// Encode the constraint using [`Propagator`] objects for a
	/// [`crate::Solver`] object.
	///
	/// This method should place all required propagators in a
	/// [`crate::Solver`] object to ensure the constraint will not be violated.
	fn to_solver(
		&self,
		slv: &mut dyn ReformulationActions,
		config: &InitConfig,
	) -> Result<(), ReformulationError>;
}

/// A trait to allow the cloning of boxed propagators.
///
/// This trait allows us to implement [`Clone`] for [`BoxedPropagator`].
pub trait DynPropagatorClone {
	/// Clone the object and store it as a boxed trait object.
	fn clone_dyn_propagator(&self) -> BoxedPropagator;
}

/// A trait for a propagator that is called during the search process to filter
/// the domains of decision variables, and detect inconsistencies.
pub trait Propagator<P: PropagationActions>: Debug + DynPropagatorClone {
	/// The propagate method is called during the search process to allow the
	/// propagator to narrow the domains of the decision variables it was
	/// subscribed to, or to detect that the current state is inconsistent.
	fn propagate(&mut self, actions: &mut P) -> Result<(), Conflict> {
		let _ = actions;
		Ok(())
	}
}

impl Clone for BoxedPropagator {
	fn clone(&self) -> BoxedPropagator {
		self.clone_dyn_propagator()
	}
}

impl Error for Conflict {}

impl fmt::Display for Conflict {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "conflict detected during propagation")
	}
}

impl From<EmptyDomain> for Conflict {
	fn from(_: EmptyDomain) -> Self {
		Conflict
	}
}

impl<P: for<'a> Propagator<SolvingContext<'a>> + Clone + 'static> DynPropagatorClone for P {
	fn clone_dyn_propagator(&self) -> BoxedPropagator {
		Box::new(self.clone())
	}
}
