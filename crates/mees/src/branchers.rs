//! Module containing methods for making search decisions in the solver.

use std::fmt::Debug;

use crate::{
	actions::{BrancherInitActions, DecisionActions},
	solver::{
		engine::State,
		trail::TrailedInt,
		view::IntViewInner,
		BoolView, IntLitMeaning, IntView,
	},
	ValueSelection, VariableSelection,
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// General brancher for Boolean variables that makes search decision by
/// following a given [`VariableSelection`] and [`ValueSelection`] strategy.
///
/// Since Boolean decision variables are stored as 0/1 integers, this brancher
/// is a thin wrapper that decides on the underlying integer views.
pub struct BoolBrancher {
	/// Boolean variables to be branched on.
	vars: Vec<IntView>,
	/// [`ValueSelection`] strategy used to select the way in which to branch on
	/// the selected decision variable.
	val_sel: ValueSelection,
	/// The start of the unfixed variables in `vars`.
	next: TrailedInt,
}

/// Type alias to represent [`Brancher`] contained in a [`Box`], that is used by
/// [`crate::solver::engine::Engine`].
pub(crate) type BoxedBrancher = Box<dyn Brancher<State>>;

/// A trait for making search decisions in the solver
pub trait Brancher<D: DecisionActions>: DynBrancherClone + Debug {
	/// Make a next search decision using the given decision actions.
	fn decide(&mut self, actions: &mut D) -> Decision;
}

/// An search decision made by a [`Brancher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
	/// Make the decision to enforce the given restriction on the given integer
	/// view.
	Select(IntView, IntLitMeaning),
	/// The brancher has exhausted all possible decisions, but can be backtracked
	/// to a previous state.
	Exhausted,
}

/// A trait to allow the cloning of boxed branchers.
///
/// This trait allows us to implement [`Clone`] for [`BoxedBrancher`].
pub trait DynBrancherClone {
	/// Clone the object and store it as a boxed trait object.
	fn clone_dyn_brancher(&self) -> BoxedBrancher;
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// General brancher for integer variables that makes search decision by
/// following a given [`VariableSelection`] and [`ValueSelection`] strategy.
pub struct IntBrancher {
	/// Integer variables to be branched on.
	vars: Vec<IntView>,
	/// [`VariableSelection`] strategy used to select the next decision variable
	/// to branch on.
	var_sel: VariableSelection,
	/// [`ValueSelection`] strategy used to select the way in which to branch on
	/// the selected decision variable.
	val_sel: ValueSelection,
	/// The start of the unfixed variables in `vars`.
	next: TrailedInt,
}

impl<B: Brancher<State> + Clone + 'static> DynBrancherClone for B {
	fn clone_dyn_brancher(&self) -> BoxedBrancher {
		Box::new(self.clone())
	}
}

impl BoolBrancher {
	/// Create a new [`BoolBrancher`] brancher and add to the end of the
	/// branching queue in the solver.
	pub fn new_in(
		solver: &mut impl BrancherInitActions,
		vars: Vec<BoolView>,
		val_sel: ValueSelection,
	) {
		let vars: Vec<_> = vars
			.into_iter()
			.filter_map(|b| match b.0 .0 {
				IntViewInner::Const(_) => None,
				_ => Some(b.0),
			})
			.collect();

		let next = solver.new_trailed_int(0);
		solver.push_brancher(Box::new(BoolBrancher {
			vars,
			val_sel,
			next,
		}));
	}
}

impl<D: DecisionActions> Brancher<D> for BoolBrancher {
	fn decide(&mut self, actions: &mut D) -> Decision {
		let begin = actions.get_trailed_int(self.next) as usize;

		// Find the first unfixed variable in the array.
		let mut loc = None;
		for (i, &var) in self.vars.iter().enumerate().skip(begin) {
			if actions.get_int_val(var).is_none() {
				loc = Some(i);
				break;
			}
		}
		let var = if let Some(i) = loc {
			// Update position for next iteration
			let _ = actions.set_trailed_int(self.next, i as i64);
			self.vars[i]
		} else {
			// Return if everything has already been assigned
			let _ = actions.set_trailed_int(self.next, self.vars.len() as i64);
			return Decision::Exhausted;
		};

		// select the next value to branch on based on the value selection strategy
		let truthy = matches!(
			self.val_sel,
			ValueSelection::IndomainMax | ValueSelection::OutdomainMin
		);
		Decision::Select(var, IntLitMeaning::Eq(truthy as i64))
	}
}

impl Clone for BoxedBrancher {
	fn clone(&self) -> BoxedBrancher {
		self.clone_dyn_brancher()
	}
}

impl IntBrancher {
	/// Create a new [`IntBrancher`] brancher and add to the end of the branching
	/// queue in the solver.
	pub fn new_in(
		solver: &mut impl BrancherInitActions,
		vars: Vec<IntView>,
		var_sel: VariableSelection,
		val_sel: ValueSelection,
	) {
		let vars: Vec<_> = vars
			.into_iter()
			.filter(|i| !matches!(i.0, IntViewInner::Const(_)))
			.collect();

		let next = solver.new_trailed_int(0);
		solver.push_brancher(Box::new(IntBrancher {
			vars,
			var_sel,
			val_sel,
			next,
		}));
	}
}

impl<D: DecisionActions> Brancher<D> for IntBrancher {
	fn decide(&mut self, actions: &mut D) -> Decision {
		let begin = actions.get_trailed_int(self.next) as usize;

		// return if all variables have been assigned
		if begin == self.vars.len() {
			return Decision::Exhausted;
		}

		let score = |var| match self.var_sel {
			VariableSelection::AntiFirstFail | VariableSelection::FirstFail => {
				actions.get_int_domain_size(var)
			}
			VariableSelection::InputOrder => 0,
			VariableSelection::Largest => actions.get_int_upper_bound(var),
			VariableSelection::Smallest => actions.get_int_lower_bound(var),
		};

		let is_better = |incumbent_score, new_score| match self.var_sel {
			VariableSelection::AntiFirstFail | VariableSelection::Largest => {
				incumbent_score < new_score
			}
			VariableSelection::FirstFail | VariableSelection::Smallest => {
				incumbent_score > new_score
			}
			VariableSelection::InputOrder => unreachable!(),
		};

		let mut first_unfixed = begin;
		let mut selection = None;
		for i in begin..self.vars.len() {
			if actions.get_int_lower_bound(self.vars[i]) == actions.get_int_upper_bound(self.vars[i])
			{
				// move the unfixed variable to the front
				let unfixed_var = self.vars[first_unfixed];
				let fixed_var = self.vars[i];
				self.vars[first_unfixed] = fixed_var;
				self.vars[i] = unfixed_var;
				first_unfixed += 1;
			} else if let Some((_, sel_score)) = selection {
				let new_score = score(self.vars[i]);
				if is_better(sel_score, new_score) {
					selection = Some((self.vars[i], new_score));
				}
			} else {
				selection = Some((self.vars[i], score(self.vars[i])));
				if self.var_sel == VariableSelection::InputOrder {
					break;
				}
			}
		}
		// update the next variable to the index of the first unfixed variable
		let _ = actions.set_trailed_int(self.next, first_unfixed as i64);

		// return if all variables have been assigned
		let Some((next_var, _)) = selection else {
			return Decision::Exhausted;
		};
		// select the next value to branch on based on the value selection strategy
		let lit = match self.val_sel {
			ValueSelection::IndomainMin => {
				IntLitMeaning::Less(actions.get_int_lower_bound(next_var) + 1)
			}
			ValueSelection::IndomainMax => {
				IntLitMeaning::GreaterEq(actions.get_int_upper_bound(next_var))
			}
			ValueSelection::OutdomainMin => {
				IntLitMeaning::GreaterEq(actions.get_int_lower_bound(next_var) + 1)
			}
			ValueSelection::OutdomainMax => {
				IntLitMeaning::Less(actions.get_int_upper_bound(next_var))
			}
		};

		Decision::Select(next_var, lit)
	}
}
