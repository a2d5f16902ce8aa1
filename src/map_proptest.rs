#![cfg(test)]

// Property tests for HashMap kept inside the crate so the structural
// invariant checker on RawTable can run after every operation.

use crate::map::HashMap;
use crate::test_hasher::{ConstState, IdentityState};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap as StdHashMap};
use std::hash::BuildHasher;

// Keys are pool indices scaled by 64 so that with the identity hasher they
// all start in slot 0 and split across slots as the table doubles.
#[derive(Clone, Debug)]
enum Op {
    Insert(u32, i32),
    InsertIfAbsent(u32, i32),
    Remove(u32),
    RemoveIfCurrent(u32),
    Merge(u32, i32),
    HalveIfEven(u32),
    Get(u32),
    CursorRemoveMultiples(u32),
    Retain(u32),
    Reserve(u8),
    Clear,
    Iterate,
}

fn arb_key() -> impl Strategy<Value = u32> {
    (0u32..48).prop_map(|i| i * 64)
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        8 => (arb_key(), any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        3 => (arb_key(), any::<i32>()).prop_map(|(k, v)| Op::InsertIfAbsent(k, v)),
        4 => arb_key().prop_map(Op::Remove),
        2 => arb_key().prop_map(Op::RemoveIfCurrent),
        2 => (arb_key(), -50i32..50).prop_map(|(k, v)| Op::Merge(k, v)),
        2 => arb_key().prop_map(Op::HalveIfEven),
        3 => arb_key().prop_map(Op::Get),
        1 => (2u32..5).prop_map(Op::CursorRemoveMultiples),
        1 => (2u32..5).prop_map(Op::Retain),
        1 => any::<u8>().prop_map(Op::Reserve),
        1 => Just(Op::Clear),
        2 => Just(Op::Iterate),
    ];
    proptest::collection::vec(op, 1..200)
}

fn merge_fn(a: &i32, b: i32) -> Option<i32> {
    let s = a.wrapping_add(b);
    (s % 3 != 0).then_some(s)
}

fn halve_fn(v: &i32) -> Option<i32> {
    (v % 2 == 0).then_some(v / 2)
}

// Property: state-machine equivalence against std::collections::HashMap.
// Invariants exercised after every op:
// - every entry sits in the slot its hash selects, counts agree, trees are
//   valid red-black trees whose node set equals their slot list;
// - len/is_empty and lookups match the model;
// - cursor and retain removals leave exactly the expected survivors.
fn run<S: BuildHasher>(mut sut: HashMap<u32, i32, S>, ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut model: StdHashMap<u32, i32> = StdHashMap::new();
    for op in ops {
        match op {
            Op::Insert(k, v) => {
                prop_assert_eq!(sut.insert(k, v), model.insert(k, v));
            }
            Op::InsertIfAbsent(k, v) => {
                let existing = model.get(&k).copied();
                prop_assert_eq!(sut.insert_if_absent(k, v).copied(), existing);
                model.entry(k).or_insert(v);
            }
            Op::Remove(k) => {
                prop_assert_eq!(sut.remove(&k), model.remove(&k));
            }
            Op::RemoveIfCurrent(k) => match model.get(&k).copied() {
                Some(v) => {
                    prop_assert!(!sut.remove_if_eq(&k, &v.wrapping_add(1)));
                    prop_assert!(sut.remove_if_eq(&k, &v));
                    model.remove(&k);
                }
                None => prop_assert!(!sut.remove_if_eq(&k, &0)),
            },
            Op::Merge(k, v) => {
                let expected = match model.get(&k).copied() {
                    Some(a) => merge_fn(&a, v),
                    None => Some(v),
                };
                match expected {
                    Some(n) => model.insert(k, n),
                    None => model.remove(&k),
                };
                prop_assert_eq!(sut.merge(k, v, merge_fn).copied(), expected);
            }
            Op::HalveIfEven(k) => {
                let expected = model.get(&k).and_then(halve_fn);
                if model.contains_key(&k) {
                    match expected {
                        Some(n) => model.insert(k, n),
                        None => model.remove(&k),
                    };
                }
                prop_assert_eq!(sut.compute_if_present(&k, |_, v| halve_fn(v)).copied(), expected);
            }
            Op::Get(k) => {
                prop_assert_eq!(sut.get(&k), model.get(&k));
                prop_assert_eq!(sut.contains_key(&k), model.contains_key(&k));
            }
            Op::CursorRemoveMultiples(m) => {
                let mut c = sut.cursor();
                while c.has_next() {
                    let k = *c.next(&sut).unwrap().0;
                    if (k / 64) % m == 0 {
                        let (rk, _) = c.remove(&mut sut).unwrap();
                        prop_assert_eq!(rk, k);
                    }
                }
                model.retain(|k, _| (k / 64) % m != 0);
            }
            Op::Retain(m) => {
                sut.retain(|_, v| v.rem_euclid(m as i32) != 0);
                model.retain(|_, v| v.rem_euclid(m as i32) != 0);
            }
            Op::Reserve(n) => {
                let cap = sut.capacity();
                sut.reserve(n as usize);
                prop_assert!(sut.capacity() >= cap);
            }
            Op::Clear => {
                sut.clear();
                model.clear();
            }
            Op::Iterate => {
                let seen: BTreeMap<u32, i32> = sut.iter().map(|(k, v)| (*k, *v)).collect();
                let want: BTreeMap<u32, i32> = model.iter().map(|(k, v)| (*k, *v)).collect();
                prop_assert_eq!(seen, want);
                prop_assert_eq!(sut.iter().count(), sut.len());
            }
        }

        if let Err(msg) = sut.table.check_invariants() {
            prop_assert!(false, "structural invariant broken: {}", msg);
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_state_machine_default_hasher(ops in arb_ops()) {
        run(HashMap::new(), ops)?;
    }

    // Identity hashing piles keys into few slots, driving treeify, tree
    // splits on resize and untreeify on removal.
    #[test]
    fn prop_state_machine_identity_hasher(ops in arb_ops()) {
        run(HashMap::with_hasher(IdentityState), ops)?;
    }

    #[test]
    fn prop_state_machine_identity_hasher_presized(ops in arb_ops()) {
        run(HashMap::with_capacity_and_hasher(64, IdentityState), ops)?;
    }

    // Every key shares one hash, so tree order rests entirely on identity.
    #[test]
    fn prop_state_machine_const_hasher(ops in arb_ops()) {
        run(HashMap::with_hasher(ConstState), ops)?;
    }
}
