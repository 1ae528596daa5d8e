//! Storage of the domains of integer decision variables within the solver
//! engine.

use std::ops::Not;

use index_vec::IndexVec;
use itertools::Either;

use crate::{
	solver::{activation_list::IntEvent, view::IntViewInner, IntView},
	IntSetVal, IntVal, Solver,
};

index_vec::define_index_type! {
	/// Reference type for integer decision variables within the solver engine.
	pub struct IntVarRef = u32;
}

/// Type alias for the index vector that stores the integer decision variables.
pub(crate) type IntVarStore = IndexVec<IntVarRef, IntVar>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// The set of values that an integer decision variable can still take.
///
/// The representation switches from a simple pair of bounds to an explicit set
/// of ranges once a value is removed from the interior of the domain.
pub(crate) enum Domain {
	/// Contiguous range of values, from lower to upper bound.
	Bounded {
		/// Smallest value in the domain.
		lb: IntVal,
		/// Largest value in the domain.
		ub: IntVal,
	},
	/// Explicit set of values with at least one hole between the bounds.
	Enumerated(IntSetVal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Error to signal that a domain of a variable has become empty.
pub(crate) struct EmptyDomain;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// An integer decision variable in the solver engine.
pub(crate) struct IntVar {
	/// Whether the variable only maintains its bounds.
	///
	/// Bounds-only variables never record interior holes in their domain;
	/// narrowings that leave both bounds in place are dropped.
	pub(crate) bounded: bool,
	/// The set of values the variable can still take.
	pub(crate) domain: Domain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// The meaning of a (possible) restriction on an integer decision variable.
pub enum IntLitMeaning {
	/// The variable equals the value.
	Eq(IntVal),
	/// The variable does not equal the value.
	NotEq(IntVal),
	/// The variable is greater than or equal to the value.
	GreaterEq(IntVal),
	/// The variable is (strictly) less than the value.
	Less(IntVal),
}

impl Domain {
	/// Restrict the domain according to the given literal meaning.
	///
	/// Returns `Ok(None)` if the domain is unaffected, `Ok(Some(_))` with the
	/// new domain and the change event if the domain shrunk, and
	/// `Err(EmptyDomain)` if no value remains.
	pub(crate) fn apply(&self, lit: IntLitMeaning) -> Result<Option<(Domain, IntEvent)>, EmptyDomain> {
		let ranges = match lit {
			IntLitMeaning::Eq(v) => {
				if self.contains(v) {
					vec![(v, v)]
				} else {
					Vec::new()
				}
			}
			IntLitMeaning::NotEq(v) => self
				.ranges()
				.flat_map(|(lo, hi)| {
					if lo <= v && v <= hi {
						Either::Left(
							[(lo, v - 1), (v + 1, hi)]
								.into_iter()
								.filter(|(lo, hi)| lo <= hi),
						)
					} else {
						Either::Right(std::iter::once((lo, hi)))
					}
				})
				.collect(),
			IntLitMeaning::GreaterEq(v) => self
				.ranges()
				.filter_map(|(lo, hi)| if hi >= v { Some((lo.max(v), hi)) } else { None })
				.collect(),
			IntLitMeaning::Less(v) => self
				.ranges()
				.filter_map(|(lo, hi)| if lo < v { Some((lo, hi.min(v - 1))) } else { None })
				.collect(),
		};
		self.replace(ranges)
	}

	/// Check whether the value is contained in the domain.
	pub(crate) fn contains(&self, val: IntVal) -> bool {
		match self {
			Domain::Bounded { lb, ub } => *lb <= val && val <= *ub,
			Domain::Enumerated(set) => set.contains(&val),
		}
	}

	/// Remove all values contained in the given set from the domain.
	pub(crate) fn exclude(&self, set: &IntSetVal) -> Result<Option<(Domain, IntEvent)>, EmptyDomain> {
		let mut ranges = Vec::new();
		for (mut lo, hi) in self.ranges() {
			for r in set.iter() {
				let (rlo, rhi) = (*r.start(), *r.end());
				if rhi < lo || rlo > hi {
					continue;
				}
				if rlo > lo {
					ranges.push((lo, rlo - 1));
				}
				lo = rhi + 1;
				if lo > hi {
					break;
				}
			}
			if lo <= hi {
				ranges.push((lo, hi));
			}
		}
		self.replace(ranges)
	}

	/// Create a domain from a non-empty set of integer values.
	pub(crate) fn from_set(set: &IntSetVal) -> Domain {
		let lb = *set.lower_bound().unwrap();
		let ub = *set.upper_bound().unwrap();
		if set.iter().nth(1).is_none() {
			Domain::Bounded { lb, ub }
		} else {
			Domain::Enumerated(set.clone())
		}
	}

	/// Check whether only a single value remains in the domain.
	pub(crate) fn is_fixed(&self) -> bool {
		self.lower_bound() == self.upper_bound()
	}

	/// Get the smallest value in the domain.
	pub(crate) fn lower_bound(&self) -> IntVal {
		match self {
			Domain::Bounded { lb, .. } => *lb,
			Domain::Enumerated(set) => *set.lower_bound().unwrap(),
		}
	}

	/// Iterate over the maximal contiguous ranges of the domain.
	pub(crate) fn ranges(&self) -> impl Iterator<Item = (IntVal, IntVal)> + '_ {
		match self {
			Domain::Bounded { lb, ub } => Either::Left(std::iter::once((*lb, *ub))),
			Domain::Enumerated(set) => Either::Right(set.iter().map(|r| (*r.start(), *r.end()))),
		}
	}

	/// Build the replacement domain from the given ranges and classify the
	/// change with respect to the current domain.
	fn replace(&self, ranges: Vec<(IntVal, IntVal)>) -> Result<Option<(Domain, IntEvent)>, EmptyDomain> {
		let Some(&(new_lb, _)) = ranges.first() else {
			return Err(EmptyDomain);
		};
		let new_ub = ranges.last().unwrap().1;
		let new_size: IntVal = ranges
			.iter()
			.map(|(lo, hi)| (hi - lo).saturating_add(1))
			.fold(0, IntVal::saturating_add);
		if new_size == self.size() {
			return Ok(None);
		}

		let domain = if ranges.len() == 1 {
			Domain::Bounded {
				lb: new_lb,
				ub: new_ub,
			}
		} else {
			Domain::Enumerated(ranges.into_iter().map(|(lo, hi)| lo..=hi).collect())
		};
		let event = if new_lb == new_ub {
			IntEvent::Fixed
		} else {
			match (new_lb != self.lower_bound(), new_ub != self.upper_bound()) {
				(true, true) => IntEvent::Bounds,
				(true, false) => IntEvent::LowerBound,
				(false, true) => IntEvent::UpperBound,
				(false, false) => IntEvent::Domain,
			}
		};
		Ok(Some((domain, event)))
	}

	/// Remove all values that are not contained in the given set from the
	/// domain.
	pub(crate) fn retain(&self, set: &IntSetVal) -> Result<Option<(Domain, IntEvent)>, EmptyDomain> {
		let mut ranges = Vec::new();
		for (lo, hi) in self.ranges() {
			for r in set.iter() {
				let (rlo, rhi) = (*r.start(), *r.end());
				if rhi < lo || rlo > hi {
					continue;
				}
				ranges.push((lo.max(rlo), hi.min(rhi)));
			}
		}
		self.replace(ranges)
	}

	/// Get the number of values in the domain.
	pub(crate) fn size(&self) -> IntVal {
		self.ranges()
			.map(|(lo, hi)| (hi - lo).saturating_add(1))
			.fold(0, IntVal::saturating_add)
	}

	/// Get the largest value in the domain.
	pub(crate) fn upper_bound(&self) -> IntVal {
		match self {
			Domain::Bounded { ub, .. } => *ub,
			Domain::Enumerated(set) => *set.upper_bound().unwrap(),
		}
	}

	/// Iterate over the values in the domain in increasing order.
	pub(crate) fn values(&self) -> impl Iterator<Item = IntVal> + '_ {
		self.ranges().flat_map(|(lo, hi)| lo..=hi)
	}
}

impl IntVar {
	/// Create a new integer decision variable in the solver with the given
	/// (non-empty) domain, and return a view on it.
	///
	/// If the domain contains a single value, then no variable is created and a
	/// constant view is returned instead. When `bounded` is `true`, the
	/// variable only maintains its bounds, and its initial domain is the hull
	/// of the given set.
	pub fn new_in(slv: &mut Solver, domain: IntSetVal, bounded: bool) -> IntView {
		let lb = *domain
			.lower_bound()
			.unwrap_or_else(|| panic!("unable to create integer variable with empty domain"));
		let ub = *domain.upper_bound().unwrap();
		if lb == ub {
			return IntView(IntViewInner::Const(lb));
		}

		let domain = if bounded {
			Domain::Bounded { lb, ub }
		} else {
			Domain::from_set(&domain)
		};
		let state = &mut slv.engine.state;
		let var = state.int_vars.push(IntVar { bounded, domain });
		let _ = state.int_activation.push(Default::default());
		IntView(IntViewInner::VarRef(var))
	}

	/// Adjust the result of a narrowing operation to the representation of the
	/// variable.
	///
	/// For bounds-only variables, a narrowing that would introduce interior
	/// holes is relaxed to the hull of the remaining values, and dropped
	/// entirely when both bounds stay in place.
	pub(crate) fn relax(
		&self,
		change: Option<(Domain, IntEvent)>,
	) -> Option<(Domain, IntEvent)> {
		let (domain, event) = change?;
		if !self.bounded || matches!(domain, Domain::Bounded { .. }) {
			return Some((domain, event));
		}
		let (lb, ub) = (domain.lower_bound(), domain.upper_bound());
		if (lb, ub) == (self.domain.lower_bound(), self.domain.upper_bound()) {
			return None;
		}
		let event = if lb == ub {
			IntEvent::Fixed
		} else if lb != self.domain.lower_bound() && ub != self.domain.upper_bound() {
			IntEvent::Bounds
		} else if lb != self.domain.lower_bound() {
			IntEvent::LowerBound
		} else {
			IntEvent::UpperBound
		};
		Some((Domain::Bounded { lb, ub }, event))
	}
}

impl Not for IntLitMeaning {
	type Output = IntLitMeaning;

	fn not(self) -> Self::Output {
		match self {
			IntLitMeaning::Eq(v) => IntLitMeaning::NotEq(v),
			IntLitMeaning::NotEq(v) => IntLitMeaning::Eq(v),
			IntLitMeaning::GreaterEq(v) => IntLitMeaning::Less(v),
			IntLitMeaning::Less(v) => IntLitMeaning::GreaterEq(v),
		}
	}
}

#[cfg(test)]
mod tests {
	use crate::{
		solver::{
			activation_list::IntEvent,
			int_var::{Domain, IntVar},
			IntLitMeaning,
		},
		IntSetVal,
	};

	#[test]
	fn test_domain_narrowing() {
		let dom = Domain::Bounded { lb: 1, ub: 8 };
		assert_eq!(dom.size(), 8);

		// Bound updates keep the simple representation.
		let (dom, event) = dom.apply(IntLitMeaning::GreaterEq(3)).unwrap().unwrap();
		assert_eq!(event, IntEvent::LowerBound);
		assert_eq!(dom, Domain::Bounded { lb: 3, ub: 8 });
		assert_eq!(dom.apply(IntLitMeaning::GreaterEq(2)).unwrap(), None);

		// Removing an interior value introduces a hole.
		let (dom, event) = dom.apply(IntLitMeaning::NotEq(5)).unwrap().unwrap();
		assert_eq!(event, IntEvent::Domain);
		assert_eq!(dom.size(), 5);
		assert!(!dom.contains(5));
		assert_eq!((dom.lower_bound(), dom.upper_bound()), (3, 8));

		// Upper bound update respects the hole.
		let (dom, event) = dom.apply(IntLitMeaning::Less(6)).unwrap().unwrap();
		assert_eq!(event, IntEvent::UpperBound);
		assert_eq!(dom.upper_bound(), 4);

		// Narrowing down to a single value.
		let (dom, event) = dom.apply(IntLitMeaning::Eq(4)).unwrap().unwrap();
		assert_eq!(event, IntEvent::Fixed);
		assert!(dom.is_fixed());
		assert!(dom.apply(IntLitMeaning::NotEq(4)).is_err());
	}

	#[test]
	fn test_bounded_representation() {
		let var = IntVar {
			bounded: true,
			domain: Domain::Bounded { lb: 1, ub: 8 },
		};

		// Interior removals are not representable and are dropped.
		let change = var.domain.apply(IntLitMeaning::NotEq(5)).unwrap();
		assert_eq!(var.relax(change), None);

		// Bound updates pass through unchanged.
		let change = var.domain.apply(IntLitMeaning::GreaterEq(3)).unwrap();
		let (dom, event) = var.relax(change).unwrap();
		assert_eq!(event, IntEvent::LowerBound);
		assert_eq!(dom, Domain::Bounded { lb: 3, ub: 8 });

		// Set operations are relaxed to the hull of the remaining values.
		let set: IntSetVal = [2..=3, 6..=7].into_iter().collect();
		let change = var.domain.retain(&set).unwrap();
		let (dom, event) = var.relax(change).unwrap();
		assert_eq!(event, IntEvent::Bounds);
		assert_eq!(dom, Domain::Bounded { lb: 2, ub: 7 });
	}

	#[test]
	fn test_domain_set_ops() {
		let dom = Domain::Bounded { lb: 0, ub: 9 };
		let set: IntSetVal = [2..=3, 6..=7].into_iter().collect();

		let (inside, event) = dom.retain(&set).unwrap().unwrap();
		assert_eq!(event, IntEvent::Bounds);
		assert_eq!(inside.values().collect::<Vec<_>>(), vec![2, 3, 6, 7]);

		let (outside, event) = dom.exclude(&set).unwrap().unwrap();
		assert_eq!(event, IntEvent::Domain);
		assert_eq!(outside.values().collect::<Vec<_>>(), vec![0, 1, 4, 5, 8, 9]);

		assert!(inside.exclude(&set).is_err());
		assert_eq!(outside.exclude(&set).unwrap(), None);
	}
}
