//! Scenario tests that exercise the full pipeline from model construction,
//! through reformulation, to search and solution enumeration.

use std::time::Duration;

use expect_test::expect;
use itertools::Itertools;
use tracing_test::traced_test;

use crate::{
	all_different_int, constraints::all_different_int::AllDifferentConsistency,
	reformulate::InitConfig, Branching, Goal, IntDecision, IntLinExpr, IntVal, Model, SolveResult,
	Solver, ValueSelection, VariableSelection, View,
};

#[test]
#[traced_test]
fn test_bool_cardinality() {
	let mut prb = Model::default();
	let bools = prb.new_bool_vars(3);
	let sum: IntLinExpr = bools.iter().map(|&b| IntDecision::from(b)).sum();
	prb += sum.geq(2);
	let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
	let vars: Vec<_> = bools.iter().map(|v| map.get(&(*v).into())).collect();
	slv.expect_solutions(
		&vars,
		expect![[r#"
		false, true, true
		true, false, true
		true, true, false
		true, true, true"#]],
	);
}

#[test]
#[traced_test]
fn test_bool_sum_ne_constant() {
	let mut prb = Model::default();
	let v = prb.new_bool_var();
	let w = prb.new_bool_var();
	let sum: IntLinExpr = [v, w].iter().map(|&b| IntDecision::from(b)).sum();
	prb += sum.ne(20);
	let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
	let vars: Vec<_> = [v, w].iter().map(|b| map.get(&(*b).into())).collect();
	// The sum of two Booleans is at most 2, so the constraint never bites.
	slv.expect_solutions(
		&vars,
		expect![[r#"
		false, false
		false, true
		true, false
		true, true"#]],
	);
}

#[test]
#[traced_test]
fn test_bounded_int_var() {
	let mut prb = Model::default();
	let x = prb.new_bounded_int_var(1, 4);
	prb += [x].into_iter().sum::<IntLinExpr>().ne(2);
	let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
	let vars = [map.get(&x.into())];
	// The interior removal is deferred to search, but never reaches a
	// solution.
	slv.expect_solutions(
		&vars,
		expect![[r#"
		1
		3
		4"#]],
	);
}

#[test]
#[traced_test]
fn test_branch_and_bound_maximize() {
	let mut prb = Model::default();
	let x = prb.new_int_var((1..=4).into());
	let y = prb.new_int_var((1..=4).into());
	let obj = prb.new_int_var((2..=8).into());
	prb += (x + y - obj).eq(0);
	let (mut slv, map) = prb.to_solver(&InitConfig::default()).unwrap();
	let obj = map.get_int(&obj);
	let (result, value) = slv.branch_and_bound(obj, Goal::Maximize, |_| {});
	assert_eq!(result, SolveResult::Complete);
	assert_eq!(value, Some(8));
}

#[test]
#[traced_test]
fn test_branch_and_bound_minimize() {
	let mut prb = Model::default();
	let x = prb.new_int_var((1..=4).into());
	let y = prb.new_int_var((1..=4).into());
	let obj = prb.new_int_var((2..=8).into());
	prb += (x + y - obj).eq(0);
	prb += (x + y).geq(4);
	let (mut slv, map) = prb.to_solver(&InitConfig::default()).unwrap();
	let views = [map.get(&x.into()), map.get(&y.into())];
	let mut last = Vec::new();
	let (result, value) =
		slv.branch_and_bound(map.get_int(&obj), Goal::Minimize, |value| {
			last = views.iter().map(|&v| value(v)).collect();
		});
	assert_eq!(result, SolveResult::Complete);
	assert_eq!(value, Some(4));
	let sum: IntVal = last.iter().map(|v| v.as_int().unwrap()).sum();
	assert_eq!(sum, 4);
}

#[test]
#[traced_test]
fn test_enumeration_matches_brute_force() {
	let mut prb = Model::default();
	let x = prb.new_int_var((1..=4).into());
	let y = prb.new_int_var((1..=4).into());
	let z = prb.new_int_var((1..=4).into());
	prb += (x + y - z).gt(0);
	prb += (x - z).ne(0);
	let (mut slv, map) = prb.to_solver(&InitConfig::default()).unwrap();
	let views: Vec<View> = [x, y, z].iter().map(|v| map.get(&(*v).into())).collect();

	let (status, solutions) = slv.get_all_solutions(&views);
	assert_eq!(status, SolveResult::Complete);
	let mut found: Vec<Vec<IntVal>> = solutions
		.iter()
		.map(|sol| sol.iter().map(|v| v.as_int().unwrap()).collect())
		.collect();
	found.sort_unstable();
	found.dedup();

	let mut expected = Vec::new();
	for x in 1..=4 {
		for y in 1..=4 {
			for z in 1..=4 {
				if x + y > z && x != z {
					expected.push(vec![x, y, z]);
				}
			}
		}
	}
	assert_eq!(found, expected);
}

#[test]
#[traced_test]
fn test_magic_square() {
	let mut prb = Model::default();
	let cells = prb.new_int_vars(9, (1..=9).into());
	prb += all_different_int(cells.clone());
	let lines = [
		[0, 1, 2],
		[3, 4, 5],
		[6, 7, 8],
		[0, 3, 6],
		[1, 4, 7],
		[2, 5, 8],
		[0, 4, 8],
		[2, 4, 6],
	];
	for line in lines {
		let sum: IntLinExpr = line.iter().map(|&i| cells[i]).sum();
		prb += sum.eq(15);
	}
	prb += Branching::Int(
		cells.clone(),
		VariableSelection::FirstFail,
		ValueSelection::IndomainMin,
	);
	let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
	let vars: Vec<_> = cells.iter().map(|v| map.get(&(*v).into())).collect();
	slv.expect_solutions(
		&vars,
		expect![[r#"
		2, 7, 6, 9, 5, 1, 4, 3, 8
		2, 9, 4, 7, 5, 3, 6, 1, 8
		4, 3, 8, 9, 5, 1, 2, 7, 6
		4, 9, 2, 3, 5, 7, 8, 1, 6
		6, 1, 8, 7, 5, 3, 2, 9, 4
		6, 7, 2, 1, 5, 9, 8, 3, 4
		8, 1, 6, 3, 5, 7, 4, 9, 2
		8, 3, 4, 1, 5, 9, 6, 7, 2"#]],
	);
}

#[test]
#[traced_test]
fn test_resumable_enumeration() {
	let mut prb = Model::default();
	let vars = prb.new_int_vars(2, (1..=2).into());
	let (mut slv, map) = prb.to_solver(&InitConfig::default()).unwrap();
	let views: Vec<View> = vars.iter().map(|v| map.get(&(*v).into())).collect();

	let mut solutions = Vec::new();
	for _ in 0..4 {
		let result = slv.solve(|value| {
			solutions.push(views.iter().map(|&v| value(v)).collect::<Vec<_>>());
		});
		assert_eq!(result, SolveResult::Satisfied);
	}
	assert_eq!(slv.solve(|_| {}), SolveResult::Complete);
	solutions.sort_unstable();
	assert_eq!(
		solutions
			.iter()
			.map(|sol| sol.iter().map(ToString::to_string).join(", "))
			.join("\n"),
		"1, 1\n1, 2\n2, 1\n2, 2"
	);
	assert!(slv.search_statistics().decisions() > 0);
}

#[test]
#[traced_test]
fn test_resume_after_first_solution() {
	let mut prb = Model::default();
	let x = prb.new_int_var((1..=4).into());
	let y = prb.new_int_var((3..=6).into());
	prb += (x - y).geq(0);
	let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
	let views = [map.get(&x.into()), map.get(&y.into())];

	let mut first = Vec::new();
	let result = slv.solve(|value| {
		first = views.iter().map(|&v| value(v)).collect();
	});
	assert_eq!(result, SolveResult::Satisfied);
	assert_eq!(first.iter().join(", "), "3, 3");

	// Resuming the search yields only the solutions after the first one.
	let mut rest = Vec::new();
	let result = slv.all_solutions(|value| {
		rest.push(views.iter().map(|&v| value(v)).join(", "));
	});
	assert_eq!(result, SolveResult::Complete);
	rest.sort_unstable();
	assert_eq!(rest.join("\n"), "4, 3\n4, 4");
}

#[test]
#[traced_test]
fn test_send_more_money() {
	let mut prb = Model::default();
	let s = prb.new_int_var_named((1..=9).into(), "s");
	let e = prb.new_int_var_named((0..=9).into(), "e");
	let n = prb.new_int_var_named((0..=9).into(), "n");
	let d = prb.new_int_var_named((0..=9).into(), "d");
	let m = prb.new_int_var_named((1..=9).into(), "m");
	let o = prb.new_int_var_named((0..=9).into(), "o");
	let r = prb.new_int_var_named((0..=9).into(), "r");
	let y = prb.new_int_var_named((0..=9).into(), "y");
	let letters = vec![s, e, n, d, m, o, r, y];
	prb += all_different_int(letters.clone())
		.with_consistency(AllDifferentConsistency::Domain);
	// SEND + MORE = MONEY, with the place values folded into one sum.
	prb += (s * 1000 + e * 91 + n * -90 + d + m * -9000 + o * -900 + r * 10 + y * -1).eq(0);
	prb += Branching::Int(
		letters.clone(),
		VariableSelection::FirstFail,
		ValueSelection::IndomainMin,
	);
	assert_eq!(prb.int_decision_name(s), Some("s"));
	let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
	let vars: Vec<_> = letters.iter().map(|v| map.get(&(*v).into())).collect();
	slv.expect_solutions(
		&vars,
		expect![[r#"
		9, 5, 6, 7, 1, 0, 8, 2"#]],
	);
}

#[test]
#[traced_test]
fn test_solve_inequality() {
	let mut prb = Model::default();
	let x = prb.new_int_var((1..=4).into());
	let y = prb.new_int_var((3..=6).into());
	prb += (x - y).geq(0);
	let (mut slv, map): (Solver, _) = prb.to_solver(&InitConfig::default()).unwrap();
	let vars = [map.get(&x.into()), map.get(&y.into())];
	slv.expect_solutions(
		&vars,
		expect![[r#"
		3, 3
		4, 3
		4, 4"#]],
	);
}

#[test]
#[traced_test]
fn test_stop_conditions() {
	let mut prb = Model::default();
	let vars = prb.new_int_vars(9, (1..=9).into());
	prb += all_different_int(vars)
		.with_consistency(AllDifferentConsistency::Decompose);
	let (mut slv, _) = prb.to_solver(&InitConfig::default()).unwrap();

	slv.set_time_limit(Some(Duration::ZERO));
	assert_eq!(slv.solve(|_| {}), SolveResult::Unknown);

	slv.set_time_limit(None);
	assert_eq!(slv.solve(|_| {}), SolveResult::Satisfied);

	slv.set_terminate_callback(Some(|| true));
	assert_eq!(slv.solve(|_| {}), SolveResult::Unknown);
}

#[test]
#[traced_test]
fn test_statistics() {
	let mut prb = Model::default();
	let vars = prb.new_int_vars(3, (1..=3).into());
	prb += all_different_int(vars);
	let (mut slv, _) = prb.to_solver(&InitConfig::default()).unwrap();
	let init = slv.init_statistics();
	assert_eq!(init.int_vars(), 3);
	assert_eq!(init.propagators(), 1);

	assert_eq!(slv.all_solutions(|_| {}), SolveResult::Complete);
	let stats = slv.search_statistics();
	assert!(stats.decisions() > 0);
	assert!(stats.propagations() > 0);
	assert!(stats.peak_depth() > 0);
	assert!(stats.conflicts() > 0);
}

#[test]
#[traced_test]
fn test_value_selection_max() {
	let mut prb = Model::default();
	let vars = prb.new_int_vars(2, (1..=3).into());
	prb += Branching::Int(
		vars.clone(),
		VariableSelection::InputOrder,
		ValueSelection::IndomainMax,
	);
	let (mut slv, map) = prb.to_solver(&InitConfig::default()).unwrap();
	let views: Vec<View> = vars.iter().map(|v| map.get(&(*v).into())).collect();
	let mut first = Vec::new();
	let result = slv.solve(|value| {
		first = views.iter().map(|&v| value(v)).collect();
	});
	assert_eq!(result, SolveResult::Satisfied);
	assert_eq!(
		first.iter().map(|v| v.as_int().unwrap()).collect::<Vec<_>>(),
		vec![3, 3]
	);
}
