//! Structures to keep track of which propagators to enqueue when the domain
//! of an integer decision variable changes.

use crate::solver::engine::PropRef;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// The list of propagators to enqueue for the different types of domain
/// changes of a single integer decision variable.
pub(crate) struct ActivationList {
	/// Subscriptions of propagators to domain change events.
	subscriptions: Vec<(PropRef, IntPropCond)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// A change to the domain of an integer decision variable.
pub(crate) enum IntEvent {
	/// The variable has been fixed to a single value.
	Fixed,
	/// The lower bound of the variable has been raised.
	LowerBound,
	/// The upper bound of the variable has been lowered.
	UpperBound,
	/// Both bounds of the variable have changed.
	Bounds,
	/// A value has been removed from the interior of the domain.
	Domain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// The conditions under which a propagator should be enqueued when the domain
/// of an integer decision variable changes.
pub enum IntPropCond {
	/// Enqueue when the variable is fixed to a single value.
	Fixed,
	/// Enqueue when the lower bound of the variable is raised.
	LowerBound,
	/// Enqueue when the upper bound of the variable is lowered.
	UpperBound,
	/// Enqueue when either bound of the variable changes.
	Bounds,
	/// Enqueue on any change to the domain of the variable.
	Domain,
}

impl ActivationList {
	/// Iterate over the propagators that are activated by the given event.
	pub(crate) fn activated_by(&self, event: IntEvent) -> impl Iterator<Item = PropRef> + '_ {
		self.subscriptions
			.iter()
			.filter(move |(_, cond)| cond.activated_by(event))
			.map(|(prop, _)| *prop)
	}

	/// Add a subscription of a propagator to the given condition.
	pub(crate) fn add(&mut self, prop: PropRef, condition: IntPropCond) {
		self.subscriptions.push((prop, condition));
	}
}

impl IntPropCond {
	/// Check whether the condition is triggered by the given event.
	fn activated_by(self, event: IntEvent) -> bool {
		match self {
			IntPropCond::Fixed => event == IntEvent::Fixed,
			IntPropCond::LowerBound => matches!(
				event,
				IntEvent::Fixed | IntEvent::LowerBound | IntEvent::Bounds
			),
			IntPropCond::UpperBound => matches!(
				event,
				IntEvent::Fixed | IntEvent::UpperBound | IntEvent::Bounds
			),
			IntPropCond::Bounds => !matches!(event, IntEvent::Domain),
			IntPropCond::Domain => true,
		}
	}
}
