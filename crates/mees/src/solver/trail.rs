//! The trail infrastructure used to restore the state of the solver engine
//! when the search backtracks.

use index_vec::IndexVec;

use crate::{
	solver::int_var::{Domain, IntVarRef},
	IntVal,
};

index_vec::define_index_type! {
	/// Reference type for trailed integer values in the solver engine.
	pub struct TrailedInt = u32;
}

#[derive(Debug, Clone)]
/// Structure that stores the changes made to the search state of the solver
/// engine, so that they can be undone when the search backtracks.
///
/// Changes made before the first decision level are considered permanent and
/// are not recorded.
pub(crate) struct Trail {
	/// The stack of changes that have been made since the first decision.
	events: Vec<TrailEvent>,
	/// Length of `events` at the start of each decision level.
	level_marks: Vec<usize>,
	/// The current assignment of the trailed integers.
	int_value: IndexVec<TrailedInt, IntVal>,
}

#[derive(Debug, Clone)]
/// A recorded change that can be undone by restoring the previous value.
pub(crate) enum TrailEvent {
	/// The domain of an integer decision variable was narrowed.
	IntDomain(IntVarRef, Domain),
	/// The value of a trailed integer was changed.
	TrailedInt(TrailedInt, IntVal),
}

impl Trail {
	/// Reference to the trailed integer that tracks which brancher is currently
	/// used to make search decisions.
	pub(crate) const CURRENT_BRANCHER: TrailedInt = TrailedInt { _raw: 0 };

	/// Get the current number of decisions that have been made.
	pub(crate) fn decision_level(&self) -> usize {
		self.level_marks.len()
	}

	/// Get the current value of a trailed integer.
	pub(crate) fn get_trailed_int(&self, i: TrailedInt) -> IntVal {
		self.int_value[i]
	}

	/// Create a new trailed integer with the given initial value.
	pub(crate) fn new_trailed_int(&mut self, init: IntVal) -> TrailedInt {
		self.int_value.push(init)
	}

	/// Undo all changes made since the given decision level.
	///
	/// Domain changes are undone through the `undo_domain` callback, which is
	/// given the variable and the domain to be restored.
	pub(crate) fn notify_backtrack(
		&mut self,
		level: usize,
		mut undo_domain: impl FnMut(IntVarRef, Domain),
	) {
		debug_assert!(level <= self.level_marks.len());
		let mark = self.level_marks[level];
		self.level_marks.truncate(level);
		while self.events.len() > mark {
			match self.events.pop().unwrap() {
				TrailEvent::IntDomain(var, domain) => undo_domain(var, domain),
				TrailEvent::TrailedInt(i, v) => self.int_value[i] = v,
			}
		}
	}

	/// Mark the start of a new decision level.
	pub(crate) fn notify_new_decision_level(&mut self) {
		self.level_marks.push(self.events.len());
	}

	/// Record the previous domain of an integer decision variable that is about
	/// to be narrowed.
	pub(crate) fn push_int_domain(&mut self, var: IntVarRef, prev: Domain) {
		if !self.level_marks.is_empty() {
			self.events.push(TrailEvent::IntDomain(var, prev));
		}
	}

	/// Set the value of a trailed integer, returning the previous value.
	pub(crate) fn set_trailed_int(&mut self, i: TrailedInt, v: IntVal) -> IntVal {
		let prev = self.int_value[i];
		if prev != v {
			if !self.level_marks.is_empty() {
				self.events.push(TrailEvent::TrailedInt(i, prev));
			}
			self.int_value[i] = v;
		}
		prev
	}
}

impl Default for Trail {
	fn default() -> Self {
		Self {
			events: Vec::new(),
			level_marks: Vec::new(),
			// Seeded with the slot for `CURRENT_BRANCHER`.
			int_value: IndexVec::from_vec(vec![0]),
		}
	}
}

#[cfg(test)]
mod tests {
	use crate::solver::trail::Trail;

	#[test]
	fn test_trailed_int_restore() {
		let mut trail = Trail::default();
		let i = trail.new_trailed_int(5);

		// Changes before the first decision are permanent.
		let _ = trail.set_trailed_int(i, 7);

		trail.notify_new_decision_level();
		let _ = trail.set_trailed_int(i, 9);
		trail.notify_new_decision_level();
		let _ = trail.set_trailed_int(i, 11);
		assert_eq!(trail.get_trailed_int(i), 11);

		trail.notify_backtrack(1, |_, _| unreachable!());
		assert_eq!(trail.get_trailed_int(i), 9);
		trail.notify_backtrack(0, |_, _| unreachable!());
		assert_eq!(trail.get_trailed_int(i), 7);
		assert_eq!(trail.decision_level(), 0);
	}
}
