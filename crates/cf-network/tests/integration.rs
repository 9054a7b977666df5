//! Integration tests for cf-network.

use cf_core::LinkId;
use cf_network::{EvPathPolicy, Network, NetworkBuilder, Path, PathEnumerator, StationIndex};
use proptest::prelude::*;

/// Diamond network: O -> {A, B} -> D with a charging link on O->A and B->D.
fn diamond() -> (Network, Vec<LinkId>) {
    let mut b = NetworkBuilder::new();
    let o = b.add_node("O", [0.0, 0.0]);
    let a = b.add_node("A", [1.0, 1.0]);
    let bn = b.add_node("B", [1.0, -1.0]);
    let d = b.add_node("D", [2.0, 0.0]);

    let links = vec![
        b.add_origin(o, "O1"),     // 0
        b.add_mixed(o, a),         // 1
        b.add_ev_only(o, a, "S1"), // 2
        b.add_mixed(o, bn),        // 3
        b.add_mixed(a, bn),        // 4
        b.add_mixed(bn, d),        // 5
        b.add_mixed(a, d),         // 6
        b.add_ev_only(bn, d, "S2"), // 7
        b.add_destination(d, "D1"), // 8
    ];
    (b.build().unwrap(), links)
}

fn path(l: &[LinkId], idx: &[usize]) -> Path {
    Path::new(idx.iter().map(|&i| l[i]).collect())
}

#[test]
fn diamond_shared_paths_in_discovery_order() {
    let (net, l) = diamond();
    let set = PathEnumerator::new(&net).enumerate_all().unwrap();
    assert_eq!(set.len(), 1);

    let od = &set.pairs()[0];
    assert_eq!(od.od.origin, l[0]);
    assert_eq!(od.od.destination, l[8]);
    assert_eq!(
        od.nev,
        vec![
            path(&l, &[0, 1, 4, 5, 8]),
            path(&l, &[0, 1, 6, 8]),
            path(&l, &[0, 3, 5, 8]),
        ]
    );
}

#[test]
fn diamond_charging_paths_exclude_double_charging() {
    let (net, l) = diamond();
    let set = PathEnumerator::new(&net).enumerate_all().unwrap();
    let od = &set.pairs()[0];
    assert_eq!(
        od.ev,
        vec![
            path(&l, &[0, 1, 4, 7, 8]),
            path(&l, &[0, 2, 4, 5, 8]),
            path(&l, &[0, 2, 6, 8]),
            path(&l, &[0, 3, 7, 8]),
        ]
    );
    assert!(!od.ev.contains(&path(&l, &[0, 2, 4, 7, 8])));
}

#[test]
fn diamond_shared_plus_charging() {
    let (net, _) = diamond();
    let set = PathEnumerator::new(&net)
        .with_policy(EvPathPolicy::SharedPlusCharging)
        .enumerate_all()
        .unwrap();
    let od = &set.pairs()[0];
    assert_eq!(od.ev.len(), 7);
    assert_eq!(&od.ev[..3], od.nev.as_slice());
}

#[test]
fn unreachable_destination_is_inactive() {
    let mut b = NetworkBuilder::new();
    let o = b.add_node("O", [0.0, 0.0]);
    let d1 = b.add_node("D1", [1.0, 0.0]);
    let d2 = b.add_node("D2", [2.0, 0.0]);
    b.add_origin(o, "O1");
    b.add_mixed(o, d1);
    b.add_destination(d1, "D1");
    b.add_destination(d2, "D2");
    let net = b.build().unwrap();

    let set = PathEnumerator::new(&net).enumerate_all().unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(net.destination_name(set.pairs()[0].od.destination), Some("D1"));
}

#[test]
fn od_pairs_ordered_origin_major() {
    let mut b = NetworkBuilder::new();
    let o1 = b.add_node("O1", [0.0, 0.0]);
    let o2 = b.add_node("O2", [0.0, 1.0]);
    let d1 = b.add_node("D1", [1.0, 0.0]);
    let d2 = b.add_node("D2", [1.0, 1.0]);
    let lo1 = b.add_origin(o1, "O1");
    let lo2 = b.add_origin(o2, "O2");
    for &from in &[o1, o2] {
        for &to in &[d1, d2] {
            b.add_mixed(from, to);
        }
    }
    let ld1 = b.add_destination(d1, "D1");
    let ld2 = b.add_destination(d2, "D2");
    let net = b.build().unwrap();

    let set = PathEnumerator::new(&net).enumerate_all().unwrap();
    let order: Vec<_> = set
        .pairs()
        .iter()
        .map(|p| (p.od.origin, p.od.destination))
        .collect();
    assert_eq!(order, vec![(lo1, ld1), (lo1, ld2), (lo2, ld1), (lo2, ld2)]);
}

#[test]
fn station_index_follows_station_ids() {
    let (net, l) = diamond();
    let idx = StationIndex::from_network(&net);
    let pairs: Vec<_> = idx.iter().map(|(s, link)| (s.as_str().to_string(), link)).collect();
    assert_eq!(pairs, vec![("S1".to_string(), l[2]), ("S2".to_string(), l[7])]);
}

proptest! {
    /// On a layered random network every enumerated path is well formed:
    /// consecutive links connect, nodes never repeat, and at most one EV-only link.
    #[test]
    fn enumerated_paths_are_well_formed(
        edges in prop::collection::vec((0usize..4, 0usize..4, any::<bool>()), 1..14)
    ) {
        let mut b = NetworkBuilder::new();
        let nodes: Vec<_> = (0..5).map(|i| b.add_node(format!("N{i}"), [i as f64, 0.0])).collect();
        b.add_origin(nodes[0], "O");
        let mut station = 0;
        for (from, to, ev) in edges {
            // from < to keeps the graph acyclic apart from the terminal loops
            let (lo, hi) = (from.min(to), from.max(to) + 1);
            if ev {
                station += 1;
                b.add_ev_only(nodes[lo], nodes[hi], format!("S{station}"));
            } else {
                b.add_mixed(nodes[lo], nodes[hi]);
            }
        }
        b.add_destination(nodes[4], "D");
        let net = b.build().unwrap();

        let set = PathEnumerator::new(&net)
            .with_policy(EvPathPolicy::SharedPlusCharging)
            .enumerate_all()
            .unwrap();

        for od in set.pairs() {
            for p in od.nev.iter().chain(od.ev.iter()) {
                let links: Vec<_> = p.links().iter().map(|&id| net.link(id).unwrap()).collect();
                prop_assert!(links.first().unwrap().is_origin());
                prop_assert!(links.last().unwrap().is_destination());
                let inner = &links[1..links.len() - 1];
                prop_assert!(inner.windows(2).all(|w| w[0].to == w[1].from));
                prop_assert!(inner.iter().filter(|l| l.is_ev_only()).count() <= 1);
                let mut seen: Vec<_> = inner.iter().map(|l| l.from).collect();
                seen.sort();
                seen.dedup();
                prop_assert_eq!(seen.len(), inner.len());
            }
            for p in &od.nev {
                prop_assert!(p.links().iter().all(|&id| !net.link(id).unwrap().is_ev_only()));
            }
        }
    }
}
