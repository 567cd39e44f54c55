//! Property-based tests for propagation, clause database maintenance and
//! subsumption.

mod common;

use common::{Engine, Lit, sorted_dimacs};
use proptest::prelude::*;
use sat_engine::sat::clause::{ClauseRef, SubsumeResult, subsumes};
use sat_engine::sat::clause_database::{ClauseDatabase, Strengthened};
use sat_engine::sat::configs::DatabaseConfig;
use sat_engine::sat::literal::Literal;
use std::collections::BTreeSet;

const NUM_VARS: u32 = 8;

// ============================================================================
// Strategies
// ============================================================================

/// A clause over distinct variables with two to four literals.
fn clause() -> impl Strategy<Value = Vec<i32>> {
    prop::collection::btree_map(1..=NUM_VARS as i32, any::<bool>(), 2..=4).prop_map(|vars| {
        vars.into_iter()
            .map(|(var, positive)| if positive { var } else { -var })
            .collect()
    })
}

fn formula() -> impl Strategy<Value = Vec<Vec<i32>>> {
    prop::collection::vec(clause(), 1..24)
}

fn decisions() -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(
        (1..=NUM_VARS as i32, any::<bool>()).prop_map(|(v, p)| if p { v } else { -v }),
        1..=NUM_VARS as usize,
    )
}

/// Makes each decision in turn and checks the outcome of every propagation against
/// all of `refs`.
fn check_search(
    engine: &mut Engine,
    refs: &[ClauseRef],
    decisions: &[i32],
) -> Result<(), TestCaseError> {
    for &decision in decisions {
        if engine.trail.value(common::lit(decision)).is_some() {
            continue;
        }
        let conflict = engine.decide(decision);

        if let Some(cref) = conflict {
            // every literal of the reported clause is false
            let clause = engine.db.clause(cref);
            prop_assert!(clause.literals().all(|l| engine.trail.value(l) == Some(false)));
            prop_assert_eq!(engine.trail.qhead, engine.trail.len());
            return Ok(());
        }

        for &cref in refs {
            let clause = engine.db.clause(cref);
            let satisfied = clause.literals().any(|l| engine.trail.value(l) == Some(true));
            let open = clause.literals().filter(|&l| engine.trail.value(l).is_none()).count();
            prop_assert!(satisfied || open >= 2, "clause {} is unit or false", clause);

            if let Some((w0, w1)) = engine.propagator.watches(cref) {
                let both_false = engine.trail.value(w0) == Some(false)
                    && engine.trail.value(w1) == Some(false);
                prop_assert!(!both_false, "both watches of {} are false", clause);
            }
        }
    }
    Ok(())
}

fn small_db() -> ClauseDatabase<Lit> {
    ClauseDatabase::new(
        NUM_VARS as usize,
        DatabaseConfig::default().with_page_words(64),
    )
}

// ============================================================================
// Propagation
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn propagation_is_sound_and_complete(formula in formula(), decisions in decisions()) {
        let mut engine = Engine::new(NUM_VARS as usize);
        let refs = formula.iter().map(|c| engine.add(c)).collect::<Vec<_>>();
        check_search(&mut engine, &refs, &decisions)?;
    }

    #[test]
    fn propagation_after_defrag_with_root_units(
        formula in formula(),
        units in prop::collection::vec(
            (1..=NUM_VARS as i32, any::<bool>()).prop_map(|(v, p)| if p { v } else { -v }),
            1..=3,
        ),
        decisions in decisions(),
    ) {
        let mut engine = Engine::new(NUM_VARS as usize);
        for c in &formula {
            engine.add(c);
        }
        for unit in units {
            if engine.trail.value(common::lit(unit)).is_some() {
                continue;
            }
            engine.trail.unchecked_enqueue(common::lit(unit), None);
            if engine.propagator.propagate(&mut engine.trail, &engine.db).is_some() {
                return Ok(());
            }
        }

        engine.trail.release_root_reasons();
        engine.db.defrag();
        engine.propagator.rebuild(&engine.db, &engine.trail);
        let refs = engine.db.clauses().to_vec();
        check_search(&mut engine, &refs, &decisions)?;
    }

    #[test]
    fn detach_attach_keeps_propagation_equal(
        formula in formula(),
        decisions in decisions(),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut engine = Engine::new(NUM_VARS as usize);
        let refs = formula.iter().map(|c| engine.add(c)).collect::<Vec<_>>();
        let cref = *pick.get(&refs);
        engine.propagator.detach_clause(&engine.db, cref);
        engine.propagator.attach_clause(&engine.db, cref);

        let mut fresh = Engine::new(NUM_VARS as usize);
        for c in &formula {
            fresh.add(c);
        }

        for decision in decisions {
            if engine.trail.value(common::lit(decision)).is_some() {
                continue;
            }
            let a = engine.decide(decision).is_some();
            let b = fresh.decide(decision).is_some();
            prop_assert_eq!(a, b);
            if a {
                break;
            }
            let mut left = engine.trail.iter().map(|l| l.to_i32()).collect::<Vec<_>>();
            let mut right = fresh.trail.iter().map(|l| l.to_i32()).collect::<Vec<_>>();
            left.sort_unstable();
            right.sort_unstable();
            prop_assert_eq!(left, right);
        }
    }
}

// ============================================================================
// Clause database
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn rescale_preserves_activity_order(
        bumps in prop::collection::vec(any::<bool>(), 1..60),
        growth in 1..8usize,
    ) {
        let mut db = ClauseDatabase::<Lit>::new(
            6,
            DatabaseConfig::default().with_page_words(64).with_clause_decay(1e-3),
        );
        let a = db.add_learnt(&common::lits(&[1, 2, 3]), 3);
        let b = db.add_learnt(&common::lits(&[4, 5, 6]), 3);
        let mut trail = sat_engine::sat::trail::Trail::new(6);
        // push the bump unit towards the rescale limit
        for _ in 0..growth * 3 {
            db.reestimate_clause_weights(&mut trail, &[]);
        }

        let (mut count_a, mut count_b) = (0u32, 0u32);
        for bump_a in bumps {
            if bump_a {
                db.bump_activity(a);
                count_a += 1;
            } else {
                db.bump_activity(b);
                count_b += 1;
            }
        }

        let (act_a, act_b) = (db.clause(a).activity(), db.clause(b).activity());
        prop_assert!(act_a.is_finite() && act_b.is_finite());
        let tolerance = 1e-4 * act_a.max(act_b);
        if count_a < count_b {
            prop_assert!(act_a <= act_b + tolerance);
        } else if count_b < count_a {
            prop_assert!(act_b <= act_a + tolerance);
        }
    }

    #[test]
    fn reduce_spares_protected_clauses(
        clauses in prop::collection::vec((3..12u32, 0..100u32, any::<bool>()), 0..30),
    ) {
        let mut db = ClauseDatabase::<Lit>::new(4, DatabaseConfig::default().with_page_words(1024));
        let refs = clauses
            .iter()
            .map(|&(lbd, activity, frozen)| {
                let cref = db.add_learnt(&common::lits(&[1, 2, 3]), lbd);
                db.clause_mut(cref).set_activity(activity as f32);
                db.clause_mut(cref).set_frozen(frozen);
                cref
            })
            .collect::<Vec<_>>();

        // rank worst first, exactly as the reduction does
        let mut ranked = (0..refs.len()).collect::<Vec<_>>();
        ranked.sort_by_key(|&i| (std::cmp::Reverse(clauses[i].0), clauses[i].1));
        let quota = refs.len() / 2;
        let worse_half = ranked[..quota].iter().copied().collect::<BTreeSet<_>>();

        let removed = db.reduce();
        prop_assert!(removed.len() <= quota);
        let aborted = db.stats().aborted_reductions == 1;
        if aborted {
            prop_assert!(removed.is_empty());
        } else {
            let unfrozen = clauses.iter().filter(|c| !c.2).count();
            prop_assert_eq!(removed.len(), quota.min(unfrozen));
        }

        for (i, &cref) in refs.iter().enumerate() {
            let clause = db.clause(cref);
            if clause.is_deleted() {
                // only unfrozen clauses are removed
                prop_assert!(!clauses[i].2);
                continue;
            }
            if !aborted {
                let (lbd, _, frozen) = clauses[i];
                prop_assert!(lbd <= db.config().persistent_lbd || !worse_half.contains(&i) || frozen);
            }
        }
    }
}

// ============================================================================
// Subsumption and relocation
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn subset_subsumes_and_one_flip_strengthens(
        b in prop::collection::btree_map(1..=NUM_VARS as i32, any::<bool>(), 2..=6),
        keep in prop::collection::vec(any::<bool>(), 6),
        flip in any::<prop::sample::Index>(),
    ) {
        let b_lits = b.iter().map(|(&v, &p)| if p { v } else { -v }).collect::<Vec<_>>();
        let mut a_lits = b_lits
            .iter()
            .zip(&keep)
            .filter(|&(_, &k)| k)
            .map(|(&l, _)| l)
            .collect::<Vec<_>>();
        if a_lits.is_empty() {
            a_lits.push(b_lits[0]);
        }

        let mut db = small_db();
        let b_ref = db.add_clause(&common::lits(&b_lits), false);
        let a = common::lits(&a_lits);
        let abs = sat_engine::sat::clause::abstraction(a.iter().copied());
        prop_assert_eq!(subsumes(&a, abs, &db.clause(b_ref)), SubsumeResult::Subsumes);

        // negate one literal of A: B now contains its complement
        let i = flip.index(a.len());
        let p = a[i].negated();
        let mut flipped = a.clone();
        flipped[i] = p;
        let abs = sat_engine::sat::clause::abstraction(flipped.iter().copied());
        prop_assert_eq!(subsumes(&flipped, abs, &db.clause(b_ref)), SubsumeResult::Strengthens(p));

        let expected = sorted_dimacs(b_lits.iter().map(|&l| common::lit(l)).filter(|&l| l != p.negated()));
        match db.strengthen(b_ref, p.negated()) {
            Strengthened::Clause(new) => {
                prop_assert_eq!(sorted_dimacs(db.clause(new).literals()), expected);
            }
            Strengthened::Unit(unit) => prop_assert_eq!(vec![unit.to_i32()], expected),
        }
    }

    #[test]
    fn defrag_preserves_clauses(
        formula in formula(),
        delete in prop::collection::vec(any::<bool>(), 24),
    ) {
        let mut db = small_db();
        let refs = formula
            .iter()
            .map(|c| db.add_clause(&common::lits(c), false))
            .collect::<Vec<_>>();
        for (&cref, &gone) in refs.iter().zip(&delete) {
            if gone {
                db.remove_clause(cref);
            }
        }

        let mut before = db
            .live_clauses()
            .map(|cref| sorted_dimacs(db.clause(cref).literals()))
            .collect::<Vec<_>>();
        before.sort();

        db.defrag();

        let mut after = db
            .clauses()
            .iter()
            .map(|&cref| sorted_dimacs(db.clause(cref).literals()))
            .collect::<Vec<_>>();
        after.sort();
        prop_assert_eq!(before, after);

        let distinct = db.clauses().iter().collect::<BTreeSet<_>>();
        prop_assert_eq!(distinct.len(), db.clauses().len());
        for &cref in &refs {
            prop_assert!(db.arena().try_clause(cref).is_err());
        }
        for &cref in db.clauses() {
            prop_assert!(db.arena().try_clause(cref).is_ok());
        }
    }
}
