//! The [`Engine`] of the solver: it stores the propagators and branchers, the
//! domains of the decision variables, and performs the propagation-driven
//! depth-first search.

use index_vec::IndexVec;
use tracing::{debug, trace};

use crate::{
	actions::{DecisionActions, InspectionActions, TrailingActions},
	branchers::{BoxedBrancher, Decision},
	constraints::{BoxedPropagator, Conflict},
	solver::{
		activation_list::{ActivationList, IntEvent},
		int_var::{IntVarRef, IntVarStore},
		queue::{PriorityLevel, PriorityQueue},
		solving_context::SolvingContext,
		trail::{Trail, TrailedInt},
		view::IntViewInner,
		IntLitMeaning, IntView,
	},
	IntSetVal, IntVal,
};

index_vec::define_index_type! {
	/// Reference type for propagators in the solver engine.
	pub struct PropRef = u32;
}

#[derive(Debug, Clone, Default)]
/// The search and propagation engine of the solver.
pub(crate) struct Engine {
	/// The branchers that make the search decisions.
	pub(crate) branchers: Vec<BoxedBrancher>,
	/// The stack of search decisions that are currently in effect, one per
	/// decision level.
	decisions: Vec<(IntView, IntLitMeaning)>,
	/// The propagators used to enforce the constraints.
	pub(crate) propagators: IndexVec<PropRef, BoxedPropagator>,
	/// The data structures representing the current state of the solver.
	pub(crate) state: State,
	/// The position of the search in the search tree.
	status: SearchStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The result of (resumable) search process of [`Engine`].
pub(crate) enum SearchResult {
	/// All decision variables have been fixed without violating any constraint.
	Solution,
	/// The remainder of the search space contains no (new) solution.
	Exhausted,
	/// Search was interrupted by the stop condition.
	Stopped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Tracks where in the search tree a (resumable) [`Engine`] currently is.
enum SearchStatus {
	#[default]
	/// Search can be started or resumed from the current set of decisions.
	Ready,
	/// Search is positioned at a solution, which has to be left before search
	/// can continue.
	AtSolution,
	/// The search space has been exhausted.
	Exhausted,
}

#[derive(Debug, Clone, Copy, Default)]
/// Statistics of the search process.
pub struct SearchStatistics {
	/// Number of times a conflict was found during the search.
	conflicts: u64,
	/// Number of search decisions that were made.
	decisions: u64,
	/// The highest number of simultaneous search decisions during the search.
	peak_depth: usize,
	/// Number of times a propagator was run.
	propagations: u64,
}

#[derive(Debug, Clone, Default)]
/// The mutable state of the solver engine that is changed during search and
/// propagation.
pub(crate) struct State {
	/// Whether each propagator is currently present in the propagation queue.
	enqueued: IndexVec<PropRef, bool>,
	/// For each integer decision variable, the list of propagators to enqueue
	/// when its domain changes.
	pub(crate) int_activation: IndexVec<IntVarRef, ActivationList>,
	/// The integer decision variables.
	pub(crate) int_vars: IntVarStore,
	/// The queue of propagators that are awaiting execution.
	propagator_queue: PriorityQueue<PropRef>,
	/// The priority level at which each propagator is enqueued.
	pub(crate) propagator_priority: IndexVec<PropRef, PriorityLevel>,
	/// Statistics of the search process.
	pub(crate) statistics: SearchStatistics,
	/// The trail used to undo changes when backtracking.
	pub(crate) trail: Trail,
}

impl Engine {
	/// Undo the most recent search decision and assert its negation, repeating
	/// when the negation immediately fails.
	///
	/// Returns `false` when no decision is left to undo, meaning that the
	/// search space has been exhausted.
	fn backtrack_and_flip(&mut self) -> bool {
		loop {
			let Some((view, lit)) = self.decisions.pop() else {
				return false;
			};
			let level = self.decisions.len();
			self.state.clear_propagation_queue();
			self.state.backtrack_to(level);
			trace!(level, "backtrack");
			match self.state.apply_lit(view, !lit, None) {
				Ok(()) => return true,
				Err(Conflict) => {
					self.state.statistics.conflicts += 1;
				}
			}
		}
	}

	/// Ask the branchers for the next search decision.
	///
	/// Returns `None` when no brancher has any decision left, i.e. when all
	/// decision variables have been fixed.
	fn decide(&mut self) -> Option<(IntView, IntLitMeaning)> {
		let mut current = self.state.trail.get_trailed_int(Trail::CURRENT_BRANCHER);
		while (current as usize) < self.branchers.len() {
			match self.branchers[current as usize].decide(&mut self.state) {
				Decision::Select(view, lit) => return Some((view, lit)),
				Decision::Exhausted => {
					current += 1;
					let _ = self
						.state
						.trail
						.set_trailed_int(Trail::CURRENT_BRANCHER, current);
				}
			}
		}
		None
	}

	/// Run all propagators in the queue until fixpoint, or until a conflict is
	/// found.
	fn propagate(&mut self) -> Result<(), Conflict> {
		while let Some(p) = self.state.propagator_queue.pop() {
			self.state.enqueued[p] = false;
			self.state.statistics.propagations += 1;
			let mut ctx = SolvingContext::new(&mut self.state, p);
			self.propagators[p].propagate(&mut ctx)?;
		}
		Ok(())
	}

	/// Return the search to the root of the search tree, forgetting any
	/// position at which a previous search stopped.
	pub(crate) fn reset_to_root(&mut self) {
		if !self.decisions.is_empty() {
			self.state.backtrack_to(0);
			self.decisions.clear();
		}
		self.state.clear_propagation_queue();
		self.status = SearchStatus::Ready;
	}

	/// Continue the depth-first search from the current position until the next
	/// solution is found, the search space is exhausted, or the stop condition
	/// signals that the search should be interrupted.
	///
	/// When the engine is positioned at a solution of a previous call, the
	/// solution is first escaped by negating its final search decision.
	pub(crate) fn search(&mut self, stop: &mut dyn FnMut() -> bool) -> SearchResult {
		match self.status {
			SearchStatus::Exhausted => return SearchResult::Exhausted,
			SearchStatus::AtSolution => {
				// Leave the previous solution like a conflict: flip the last
				// decision that led to it.
				self.state.statistics.conflicts += 1;
				if !self.backtrack_and_flip() {
					self.status = SearchStatus::Exhausted;
					return SearchResult::Exhausted;
				}
				self.status = SearchStatus::Ready;
			}
			SearchStatus::Ready => {}
		}

		loop {
			if self.propagate().is_err() {
				self.state.statistics.conflicts += 1;
				self.state.clear_propagation_queue();
				if !self.backtrack_and_flip() {
					self.status = SearchStatus::Exhausted;
					return SearchResult::Exhausted;
				}
				continue;
			}
			if stop() {
				return SearchResult::Stopped;
			}
			let Some((view, lit)) = self.decide() else {
				debug!(
					depth = self.decisions.len(),
					"all decision variables fixed, solution found"
				);
				self.status = SearchStatus::AtSolution;
				return SearchResult::Solution;
			};
			self.state.trail.notify_new_decision_level();
			self.decisions.push((view, lit));
			self.state.statistics.decisions += 1;
			self.state.statistics.peak_depth =
				self.state.statistics.peak_depth.max(self.decisions.len());
			debug!(?lit, depth = self.decisions.len(), "search decision");
			let res = self.state.apply_lit(view, lit, None);
			// Branchers only select values within the current domain.
			debug_assert!(res.is_ok());
		}
	}
}

impl SearchStatistics {
	/// Number of times a conflict was found during the search.
	pub fn conflicts(&self) -> u64 {
		self.conflicts
	}

	/// Number of search decisions that were made.
	pub fn decisions(&self) -> u64 {
		self.decisions
	}

	/// The highest number of simultaneous search decisions during the search.
	pub fn peak_depth(&self) -> usize {
		self.peak_depth
	}

	/// Number of times a propagator was run.
	pub fn propagations(&self) -> u64 {
		self.propagations
	}
}

impl State {
	/// Register a new propagator with the given priority level, without any
	/// subscriptions.
	pub(crate) fn add_propagator_state(&mut self, priority: PriorityLevel) -> PropRef {
		let prop = self.propagator_priority.push(priority);
		let _ = self.enqueued.push(false);
		prop
	}

	/// Enforce the given restriction on an integer view.
	pub(crate) fn apply_lit(
		&mut self,
		view: IntView,
		lit: IntLitMeaning,
		skip: Option<PropRef>,
	) -> Result<(), Conflict> {
		match view.0 {
			IntViewInner::VarRef(var) => self.narrow(var, lit, skip),
			IntViewInner::Const(c) => {
				let holds = match lit {
					IntLitMeaning::Eq(v) => c == v,
					IntLitMeaning::NotEq(v) => c != v,
					IntLitMeaning::GreaterEq(v) => c >= v,
					IntLitMeaning::Less(v) => c < v,
				};
				if holds {
					Ok(())
				} else {
					Err(Conflict)
				}
			}
			IntViewInner::Linear { transformer, var } => match transformer.rev_transform_lit(lit) {
				Ok(lit) => self.narrow(var, lit, skip),
				Err(true) => Ok(()),
				Err(false) => Err(Conflict),
			},
		}
	}

	/// Restrict an integer view to take a value inside (or, when `retain` is
	/// `false`, outside) the given set of values.
	pub(crate) fn apply_set(
		&mut self,
		view: IntView,
		set: &IntSetVal,
		retain: bool,
		skip: Option<PropRef>,
	) -> Result<(), Conflict> {
		match view.0 {
			IntViewInner::VarRef(var) => self.narrow_set(var, set, retain, skip),
			IntViewInner::Const(c) => {
				if set.contains(&c) == retain {
					Ok(())
				} else {
					Err(Conflict)
				}
			}
			IntViewInner::Linear { transformer, var } => {
				// The preimage of the set under the transformation is exact:
				// `scale * x + offset` lies in a range if and only if `x` lies in
				// the rounded preimage of that range.
				let mut ranges: Vec<_> = set
					.iter()
					.filter_map(|r| {
						let (lo, hi) = (
							*r.start() - transformer.offset,
							*r.end() - transformer.offset,
						);
						let (a, b) = if transformer.positive_scale() {
							(
								crate::helpers::div_ceil(lo, transformer.scale),
								crate::helpers::div_floor(hi, transformer.scale),
							)
						} else {
							(
								crate::helpers::div_ceil(hi, transformer.scale),
								crate::helpers::div_floor(lo, transformer.scale),
							)
						};
						if a <= b {
							Some(a..=b)
						} else {
							None
						}
					})
					.collect();
				if !transformer.positive_scale() {
					ranges.reverse();
				}
				if ranges.is_empty() {
					return if retain { Err(Conflict) } else { Ok(()) };
				}
				let preimage: IntSetVal = ranges.into_iter().collect();
				self.narrow_set(var, &preimage, retain, skip)
			}
		}
	}

	/// Undo all changes up to the given decision level.
	pub(crate) fn backtrack_to(&mut self, level: usize) {
		let State {
			trail, int_vars, ..
		} = self;
		trail.notify_backtrack(level, |var, domain| int_vars[var].domain = domain);
	}

	/// Remove all propagators from the propagation queue.
	pub(crate) fn clear_propagation_queue(&mut self) {
		self.propagator_queue.clear();
		for e in self.enqueued.iter_mut() {
			*e = false;
		}
	}

	/// Place the given propagator in the propagation queue if it is not yet
	/// present.
	pub(crate) fn enqueue_propagator(&mut self, prop: PropRef) {
		if !self.enqueued[prop] {
			self.propagator_queue
				.insert(self.propagator_priority[prop], prop);
			self.enqueued[prop] = true;
		}
	}

	/// Enqueue the propagators that subscribed to the given event on the given
	/// variable, except the propagator that caused the event.
	fn enqueue_activated(&mut self, var: IntVarRef, event: IntEvent, skip: Option<PropRef>) {
		let State {
			int_activation,
			propagator_queue,
			propagator_priority,
			enqueued,
			..
		} = self;
		for p in int_activation[var].activated_by(event) {
			if Some(p) == skip || enqueued[p] {
				continue;
			}
			propagator_queue.insert(propagator_priority[p], p);
			enqueued[p] = true;
		}
	}

	/// Apply the given restriction to the domain of an integer decision
	/// variable, record the change on the trail, and wake up the subscribed
	/// propagators.
	fn narrow(
		&mut self,
		var: IntVarRef,
		lit: IntLitMeaning,
		skip: Option<PropRef>,
	) -> Result<(), Conflict> {
		let change = self.int_vars[var].domain.apply(lit)?;
		let Some((domain, event)) = self.int_vars[var].relax(change) else {
			return Ok(());
		};
		trace!(var = usize::from(var), ?lit, ?event, "narrow domain");
		let prev = std::mem::replace(&mut self.int_vars[var].domain, domain);
		self.trail.push_int_domain(var, prev);
		self.enqueue_activated(var, event, skip);
		Ok(())
	}

	/// Intersect or subtract the given set of values from the domain of an
	/// integer decision variable.
	fn narrow_set(
		&mut self,
		var: IntVarRef,
		set: &IntSetVal,
		retain: bool,
		skip: Option<PropRef>,
	) -> Result<(), Conflict> {
		let change = if retain {
			self.int_vars[var].domain.retain(set)?
		} else {
			self.int_vars[var].domain.exclude(set)?
		};
		let Some((domain, event)) = self.int_vars[var].relax(change) else {
			return Ok(());
		};
		trace!(var = usize::from(var), ?event, "narrow domain with set");
		let prev = std::mem::replace(&mut self.int_vars[var].domain, domain);
		self.trail.push_int_domain(var, prev);
		self.enqueue_activated(var, event, skip);
		Ok(())
	}
}

impl DecisionActions for State {
	fn get_num_conflicts(&self) -> u64 {
		self.statistics.conflicts
	}
}

impl InspectionActions for State {
	fn check_int_in_domain(&self, var: IntView, val: IntVal) -> bool {
		match var.0 {
			IntViewInner::VarRef(var) => self.int_vars[var].domain.contains(val),
			IntViewInner::Const(c) => c == val,
			IntViewInner::Linear { transformer, var } => {
				transformer.rev_remains_integer(val)
					&& self.int_vars[var]
						.domain
						.contains(transformer.rev_transform(val))
			}
		}
	}

	fn get_int_domain_size(&self, var: IntView) -> IntVal {
		match var.0 {
			IntViewInner::VarRef(var) | IntViewInner::Linear { var, .. } => {
				self.int_vars[var].domain.size()
			}
			IntViewInner::Const(_) => 1,
		}
	}

	fn get_int_lower_bound(&self, var: IntView) -> IntVal {
		match var.0 {
			IntViewInner::VarRef(var) => self.int_vars[var].domain.lower_bound(),
			IntViewInner::Const(c) => c,
			IntViewInner::Linear { transformer, var } => {
				let dom = &self.int_vars[var].domain;
				if transformer.positive_scale() {
					transformer.transform(dom.lower_bound())
				} else {
					transformer.transform(dom.upper_bound())
				}
			}
		}
	}

	fn get_int_upper_bound(&self, var: IntView) -> IntVal {
		match var.0 {
			IntViewInner::VarRef(var) => self.int_vars[var].domain.upper_bound(),
			IntViewInner::Const(c) => c,
			IntViewInner::Linear { transformer, var } => {
				let dom = &self.int_vars[var].domain;
				if transformer.positive_scale() {
					transformer.transform(dom.upper_bound())
				} else {
					transformer.transform(dom.lower_bound())
				}
			}
		}
	}
}

impl TrailingActions for State {
	fn get_trailed_int(&self, i: TrailedInt) -> IntVal {
		self.trail.get_trailed_int(i)
	}

	fn set_trailed_int(&mut self, i: TrailedInt, v: IntVal) -> IntVal {
		self.trail.set_trailed_int(i, v)
	}
}
