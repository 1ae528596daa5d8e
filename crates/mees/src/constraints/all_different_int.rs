//! Structures and algorithms for the `all_different_int` constraint, which
//! enforces that a list of integer decision variables take different values.

use itertools::Itertools;

use crate::{
	actions::{InspectionActions, PropagationActions, PropagatorInitActions, ReformulationActions},
	constraints::{int_linear::IntLinearNotEqValue, Conflict, Constraint, Propagator},
	reformulate::{InitConfig, ReformulationError},
	solver::{
		activation_list::IntPropCond, queue::PriorityLevel, solving_context::SolvingContext,
		view::IntView,
	},
	IntDecision, IntVal,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// The level of domain filtering performed for an [`IntAllDifferent`]
/// constraint.
pub enum AllDifferentConsistency {
	/// Decompose the constraint into pairwise not-equal constraints.
	Decompose,
	/// Remove the values of fixed variables from the domains of the other
	/// variables.
	#[default]
	Value,
	/// Shrink the bounds of the variables based on Hall intervals, in addition
	/// to the filtering performed by [`AllDifferentConsistency::Value`].
	Bounds,
	/// Remove all values that cannot be part of any assignment in which all
	/// variables take different values.
	Domain,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Representation of the `all_different_int` constraint.
///
/// This constraint enforces that all the given integer decisions take
/// different values.
pub struct IntAllDifferent {
	/// The variables that must be pairwise different.
	pub(crate) vars: Vec<IntDecision>,
	/// The level of domain filtering used to enforce the constraint.
	pub(crate) consistency: AllDifferentConsistency,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Representation of the `all_different_except_0` constraint.
///
/// This constraint enforces that the given integer decisions that take
/// non-zero values are pairwise different.
pub struct IntAllDifferentExcept0 {
	/// The variables whose non-zero values must be pairwise different.
	pub(crate) vars: Vec<IntDecision>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Bounds consistent propagator for the `all_different_int` constraint, based
/// on the detection of Hall intervals.
///
/// An interval of values is a Hall interval when the number of variables whose
/// domain is contained in the interval equals its size. Those variables use up
/// all values of the interval, so its values can be pruned from the bounds of
/// the remaining variables.
pub(crate) struct IntAllDifferentBounds {
	/// The variables that must be pairwise different.
	vars: Vec<IntView>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Domain consistent propagator for the `all_different_int` constraint, based
/// on maximum bipartite matching between variables and values.
///
/// A variable-value pair can only be part of a solution when its edge is part
/// of some maximum matching. Following Régin, these are the edges in the
/// current matching, on an alternating cycle, or on an alternating path
/// starting from an unmatched value.
pub(crate) struct IntAllDifferentDomain {
	/// The variables that must be pairwise different.
	vars: Vec<IntView>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Value propagator for the `all_different_int` constraint, which removes the
/// values of fixed variables from the domains of the remaining variables.
pub(crate) struct IntAllDifferentValue {
	/// The variables that must be pairwise different.
	vars: Vec<IntView>,
	/// Value that is allowed to be taken by multiple variables, if any.
	ignored: Option<IntVal>,
}

/// Collect the values in the current domain of the given integer view.
fn domain_values(actions: &impl InspectionActions, var: IntView) -> Vec<IntVal> {
	let (lb, ub) = actions.get_int_bounds(var);
	(lb..=ub)
		.filter(|&v| actions.check_int_in_domain(var, v))
		.collect()
}

/// Search for an augmenting path for variable `x` in the bipartite graph of
/// variables and values, following Kuhn's algorithm, and apply it to the
/// matching if one is found.
fn try_augment(
	x: usize,
	domains: &[Vec<usize>],
	visited: &mut [bool],
	var_match: &mut [Option<usize>],
	val_match: &mut [Option<usize>],
) -> bool {
	for &v in &domains[x] {
		if !visited[v] {
			visited[v] = true;
			if val_match[v].is_none_or(|y| try_augment(y, domains, visited, var_match, val_match))
			{
				val_match[v] = Some(x);
				var_match[x] = Some(v);
				return true;
			}
		}
	}
	false
}

/// State of Tarjan's algorithm for finding the strongly connected components
/// of the variable-value graph used by [`IntAllDifferentDomain`].
struct TarjanScc<'a> {
	/// Adjacency list of the graph.
	adj: &'a [Vec<usize>],
	/// Visit index assigned to each node, if visited.
	index: Vec<Option<usize>>,
	/// Lowest visit index reachable from each node.
	low: Vec<usize>,
	/// Stack of nodes in the current search path.
	stack: Vec<usize>,
	/// Whether each node is currently on the stack.
	on_stack: Vec<bool>,
	/// Component identifier assigned to each node.
	comp: Vec<usize>,
	/// Next visit index to be assigned.
	next_index: usize,
	/// Next component identifier to be assigned.
	next_comp: usize,
}

impl TarjanScc<'_> {
	/// Compute the strongly connected components of the graph with the given
	/// adjacency list, returning a component identifier for every node.
	fn components(adj: &[Vec<usize>]) -> Vec<usize> {
		let n = adj.len();
		let mut state = TarjanScc {
			adj,
			index: vec![None; n],
			low: vec![0; n],
			stack: Vec::new(),
			on_stack: vec![false; n],
			comp: vec![0; n],
			next_index: 0,
			next_comp: 0,
		};
		for u in 0..n {
			if state.index[u].is_none() {
				state.visit(u);
			}
		}
		state.comp
	}

	/// Visit node `u` and the nodes reachable from it.
	fn visit(&mut self, u: usize) {
		self.index[u] = Some(self.next_index);
		self.low[u] = self.next_index;
		self.next_index += 1;
		self.stack.push(u);
		self.on_stack[u] = true;
		for i in 0..self.adj[u].len() {
			let w = self.adj[u][i];
			if let Some(w_index) = self.index[w] {
				if self.on_stack[w] {
					self.low[u] = self.low[u].min(w_index);
				}
			} else {
				self.visit(w);
				self.low[u] = self.low[u].min(self.low[w]);
			}
		}
		if self.index[u] == Some(self.low[u]) {
			while let Some(w) = self.stack.pop() {
				self.on_stack[w] = false;
				self.comp[w] = self.next_comp;
				if w == u {
					break;
				}
			}
			self.next_comp += 1;
		}
	}
}

impl Constraint for IntAllDifferent {
	fn to_solver(
		&self,
		slv: &mut dyn ReformulationActions,
		_config: &InitConfig,
	) -> Result<(), ReformulationError> {
		let vars: Vec<IntView> = self.vars.iter().map(|&v| slv.get_solver_int(v)).collect();
		match self.consistency {
			AllDifferentConsistency::Decompose => {
				for (&a, &b) in vars.iter().tuple_combinations() {
					IntLinearNotEqValue::new_in(slv, [a, -b], 0);
				}
			}
			AllDifferentConsistency::Value => {
				IntAllDifferentValue::new_in(slv, vars, None);
			}
			AllDifferentConsistency::Bounds => {
				IntAllDifferentValue::new_in(slv, vars.clone(), None);
				IntAllDifferentBounds::new_in(slv, vars);
			}
			AllDifferentConsistency::Domain => {
				IntAllDifferentDomain::new_in(slv, vars);
			}
		}
		Ok(())
	}
}

impl IntAllDifferent {
	/// Change the level of domain filtering used to enforce the constraint.
	pub fn with_consistency(mut self, consistency: AllDifferentConsistency) -> Self {
		self.consistency = consistency;
		self
	}
}

impl Constraint for IntAllDifferentExcept0 {
	fn to_solver(
		&self,
		slv: &mut dyn ReformulationActions,
		_config: &InitConfig,
	) -> Result<(), ReformulationError> {
		let vars: Vec<IntView> = self.vars.iter().map(|&v| slv.get_solver_int(v)).collect();
		IntAllDifferentValue::new_in(slv, vars, Some(0));
		Ok(())
	}
}

impl IntAllDifferentBounds {
	/// Create a new [`IntAllDifferentBounds`] propagator and post it in the
	/// solver.
	pub(crate) fn new_in(slv: &mut (impl PropagatorInitActions + ?Sized), vars: Vec<IntView>) {
		let subscribe = vars.clone();
		let prop = slv.add_propagator(Box::new(Self { vars }), PriorityLevel::Low);
		slv.enqueue_now(prop);
		for v in subscribe {
			slv.enqueue_on_int_change(prop, v, IntPropCond::Bounds);
		}
	}
}

impl Propagator<SolvingContext<'_>> for IntAllDifferentBounds {
	#[tracing::instrument(name = "all_different_bounds", level = "trace", skip(self, actions))]
	fn propagate(&mut self, actions: &mut SolvingContext<'_>) -> Result<(), Conflict> {
		'fixpoint: loop {
			let bounds: Vec<(IntVal, IntVal)> = self
				.vars
				.iter()
				.map(|&v| actions.get_int_bounds(v))
				.collect();
			let lbs: Vec<IntVal> = bounds.iter().map(|b| b.0).collect();
			let ubs: Vec<IntVal> = bounds.iter().map(|b| b.1).collect();
			for &a in &lbs {
				for &b in &ubs {
					if b < a || b - a + 1 > self.vars.len() as IntVal {
						continue;
					}
					let size = b - a + 1;
					let inside = |&(lb, ub): &(IntVal, IntVal)| a <= lb && ub <= b;
					let count = bounds.iter().filter(|bs| inside(bs)).count() as IntVal;
					if count > size {
						return Err(Conflict);
					}
					if count < size {
						continue;
					}
					// Hall interval found, prune it from the outside variables.
					let mut changed = false;
					for (i, bs) in bounds.iter().enumerate() {
						if inside(bs) {
							continue;
						}
						let &(lb, ub) = bs;
						if a <= lb && lb <= b {
							actions.set_int_lower_bound(self.vars[i], b + 1)?;
							changed = true;
						}
						if a <= ub && ub <= b {
							actions.set_int_upper_bound(self.vars[i], a - 1)?;
							changed = true;
						}
					}
					if changed {
						continue 'fixpoint;
					}
				}
			}
			return Ok(());
		}
	}
}

impl IntAllDifferentDomain {
	/// Create a new [`IntAllDifferentDomain`] propagator and post it in the
	/// solver.
	pub(crate) fn new_in(slv: &mut (impl PropagatorInitActions + ?Sized), vars: Vec<IntView>) {
		let subscribe = vars.clone();
		let prop = slv.add_propagator(Box::new(Self { vars }), PriorityLevel::Lowest);
		slv.enqueue_now(prop);
		for v in subscribe {
			slv.enqueue_on_int_change(prop, v, IntPropCond::Domain);
		}
	}
}

impl Propagator<SolvingContext<'_>> for IntAllDifferentDomain {
	#[tracing::instrument(name = "all_different_domain", level = "trace", skip(self, actions))]
	fn propagate(&mut self, actions: &mut SolvingContext<'_>) -> Result<(), Conflict> {
		let n = self.vars.len();
		let mut vals: Vec<IntVal> = Vec::new();
		let value_lists: Vec<Vec<IntVal>> = self
			.vars
			.iter()
			.map(|&v| domain_values(actions, v))
			.collect();
		for list in &value_lists {
			vals.extend(list.iter().copied());
		}
		vals.sort_unstable();
		vals.dedup();
		let m = vals.len();
		if m < n {
			return Err(Conflict);
		}
		let domains: Vec<Vec<usize>> = value_lists
			.iter()
			.map(|list| {
				list.iter()
					.map(|v| {
						// The value was inserted into the sorted list above.
						vals.binary_search(v).unwrap_or_else(|_| unreachable!())
					})
					.collect()
			})
			.collect();

		// Find a maximum matching between variables and values.
		let mut var_match: Vec<Option<usize>> = vec![None; n];
		let mut val_match: Vec<Option<usize>> = vec![None; m];
		for x in 0..n {
			let mut visited = vec![false; m];
			if !try_augment(x, &domains, &mut visited, &mut var_match, &mut val_match) {
				return Err(Conflict);
			}
		}

		// Mark values on alternating paths starting from unmatched values.
		let mut val_seen = vec![false; m];
		let mut queue: Vec<usize> = (0..m).filter(|&v| val_match[v].is_none()).collect();
		for &v in &queue {
			val_seen[v] = true;
		}
		while let Some(v) = queue.pop() {
			for (x, dom) in domains.iter().enumerate() {
				if var_match[x] != Some(v) && dom.contains(&v) {
					let w = var_match[x].unwrap_or_else(|| unreachable!());
					if !val_seen[w] {
						val_seen[w] = true;
						queue.push(w);
					}
				}
			}
		}

		// Build the residual graph, with variable nodes `0..n` and value nodes
		// `n..n + m`, and compute its strongly connected components.
		let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n + m];
		for (x, dom) in domains.iter().enumerate() {
			for &v in dom {
				if var_match[x] == Some(v) {
					adj[x].push(n + v);
				} else {
					adj[n + v].push(x);
				}
			}
		}
		let comp = TarjanScc::components(&adj);

		// Remove all edges that cannot be part of any maximum matching.
		for (x, dom) in domains.iter().enumerate() {
			for &v in dom {
				if var_match[x] != Some(v) && comp[x] != comp[n + v] && !val_seen[v] {
					actions.set_int_not_eq(self.vars[x], vals[v])?;
				}
			}
		}
		Ok(())
	}
}

impl IntAllDifferentValue {
	/// Create a new [`IntAllDifferentValue`] propagator and post it in the
	/// solver.
	///
	/// If `ignored` is given, then multiple variables are allowed to be fixed
	/// to the ignored value.
	pub(crate) fn new_in(
		slv: &mut (impl PropagatorInitActions + ?Sized),
		vars: Vec<IntView>,
		ignored: Option<IntVal>,
	) {
		let subscribe = vars.clone();
		let prop = slv.add_propagator(Box::new(Self { vars, ignored }), PriorityLevel::Highest);
		slv.enqueue_now(prop);
		for v in subscribe {
			slv.enqueue_on_int_change(prop, v, IntPropCond::Fixed);
		}
	}
}

impl Propagator<SolvingContext<'_>> for IntAllDifferentValue {
	#[tracing::instrument(name = "all_different_value", level = "trace", skip(self, actions))]
	fn propagate(&mut self, actions: &mut SolvingContext<'_>) -> Result<(), Conflict> {
		for i in 0..self.vars.len() {
			if let Some(val) = actions.get_int_val(self.vars[i]) {
				if self.ignored == Some(val) {
					continue;
				}
				for (j, &other) in self.vars.iter().enumerate() {
					if j != i {
						actions.set_int_not_eq(other, val)?;
					}
				}
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use expect_test::expect;
	use tracing_test::traced_test;

	use crate::{
		all_different_except_0_int, all_different_int,
		constraints::all_different_int::AllDifferentConsistency, reformulate::InitConfig, Model,
		Solver,
	};

	/// Solve an `all_different_int` problem over three variables with domain
	/// `1..=3` using the given consistency level, and check that exactly the
	/// six permutations are found.
	fn permutations_test(consistency: AllDifferentConsistency) {
		let mut prb = Model::default();
		let vars = prb.new_int_vars(3, (1..=3).into());
		prb += all_different_int(vars.clone()).with_consistency(consistency);
		let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
		let vars: Vec<_> = vars.iter().map(|v| map.get(&(*v).into())).collect();
		slv.expect_solutions(
			&vars,
			expect![[r#"
			1, 2, 3
			1, 3, 2
			2, 1, 3
			2, 3, 1
			3, 1, 2
			3, 2, 1"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_all_different_bounds() {
		permutations_test(AllDifferentConsistency::Bounds);
	}

	#[test]
	#[traced_test]
	fn test_all_different_decompose() {
		permutations_test(AllDifferentConsistency::Decompose);
	}

	#[test]
	#[traced_test]
	fn test_all_different_domain() {
		permutations_test(AllDifferentConsistency::Domain);
	}

	#[test]
	#[traced_test]
	fn test_all_different_value() {
		permutations_test(AllDifferentConsistency::Value);
	}

	#[test]
	#[traced_test]
	fn test_all_different_unsat() {
		let mut prb = Model::default();
		let vars = prb.new_int_vars(3, (1..=2).into());
		prb += all_different_int(vars);
		prb.assert_unsatisfiable();
	}

	#[test]
	#[traced_test]
	fn test_all_different_except_0() {
		let mut prb = Model::default();
		let vars = prb.new_int_vars(3, (0..=2).into());
		prb += all_different_except_0_int(vars.clone());
		let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
		let vars: Vec<_> = vars.iter().map(|v| map.get(&(*v).into())).collect();
		slv.expect_solutions(
			&vars,
			expect![[r#"
			0, 0, 0
			0, 0, 1
			0, 0, 2
			0, 1, 0
			0, 1, 2
			0, 2, 0
			0, 2, 1
			1, 0, 0
			1, 0, 2
			1, 2, 0
			2, 0, 0
			2, 0, 1
			2, 1, 0"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_all_different_hall_interval() {
		let mut prb = Model::default();
		let vars = vec![
			prb.new_int_var((1..=2).into()),
			prb.new_int_var((1..=2).into()),
			prb.new_int_var((1..=3).into()),
		];
		prb += all_different_int(vars.clone())
			.with_consistency(AllDifferentConsistency::Bounds);
		let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
		let vars: Vec<_> = vars.iter().map(|v| map.get(&(*v).into())).collect();
		slv.expect_solutions(
			&vars,
			expect![[r#"
			1, 2, 3
			2, 1, 3"#]],
		);
	}
}
