use travel_quote_core::{
    allocate_rooms, AdultsOnlyPolicy, AllocationPolicy, MixedPolicy, PartyComposition,
    RoomAllocation, RoomAllocationStrategy, RoomLimits,
};

fn parties() -> impl Iterator<Item = PartyComposition> {
    (1..=8u32).flat_map(|adults| (0..=6u32).map(move |children| PartyComposition::new(adults, children)))
}

fn check_invariants(party: &PartyComposition, allocation: &RoomAllocation, limits: &RoomLimits) {
    let label = format!(
        "{:?} with {} adults, {} children",
        allocation.policy, party.adults, party.children
    );

    assert!(allocation.respects_limits(limits), "limits broken for {label}: {:?}", allocation.rooms);
    assert!(!allocation.is_over_allocated(), "over-allocated for {label}");
    assert!(allocation.rooms.iter().all(|r| r.adults >= 1), "room without adult for {label}");
    assert!(
        allocation.rooms.iter().all(|r| r.children <= limits.max_children_per_room),
        "too many children in a room for {label}"
    );
    assert!(
        allocation.rooms.iter().all(|r| r.child_ages.len() == r.children as usize),
        "ages do not match children for {label}"
    );

    match allocation.shortfall() {
        Some(shortfall) => {
            assert_eq!(allocation.placed_adults() + shortfall.adults, party.adults);
            assert_eq!(allocation.placed_children() + shortfall.children, party.children);
            assert!(!allocation.is_complete());
        }
        None => {
            assert_eq!(allocation.placed_adults(), party.adults, "{label}");
            assert_eq!(allocation.placed_children(), party.children, "{label}");
            assert!(allocation.is_complete());
        }
    }
}

#[test]
fn adults_only_policy_holds_limits() {
    let limits = RoomLimits::default();
    for party in parties() {
        let allocation = AdultsOnlyPolicy.allocate(&party, &limits);
        assert_eq!(allocation.policy, AllocationPolicy::AdultsOnly);
        check_invariants(&party, &allocation, &limits);
    }
}

#[test]
fn mixed_policy_holds_limits() {
    let limits = RoomLimits::default();
    for party in parties() {
        let allocation = MixedPolicy.allocate(&party, &limits);
        assert_eq!(allocation.policy, AllocationPolicy::Mixed);
        check_invariants(&party, &allocation, &limits);
    }
}

#[test]
fn policy_follows_child_count() {
    let limits = RoomLimits::default();
    for party in parties() {
        let allocation = allocate_rooms(&party, &limits);
        let expected = if party.children < 2 {
            AllocationPolicy::AdultsOnly
        } else {
            AllocationPolicy::Mixed
        };
        assert_eq!(allocation.policy, expected);
        check_invariants(&party, &allocation, &limits);
    }
}

#[test]
fn small_families_are_placed_in_full() {
    let limits = RoomLimits::default();
    for (adults, children) in [(1, 0), (2, 0), (2, 1), (2, 2), (1, 3), (3, 0), (4, 2)] {
        let party = PartyComposition::new(adults, children);
        let allocation = allocate_rooms(&party, &limits);
        assert!(allocation.is_complete(), "{adults}+{children}: {:?}", allocation.rooms);
    }
}

#[test]
fn oversized_party_reports_shortfall() {
    let limits = RoomLimits::default();
    let party = PartyComposition::new(1, 6);
    let allocation = allocate_rooms(&party, &limits);

    let shortfall = allocation.shortfall().expect("six children cannot share one adult");
    assert_eq!(shortfall.adults, 0);
    assert_eq!(allocation.placed_children() + shortfall.children, 6);
}

#[test]
fn ages_are_handed_out_in_order() {
    let limits = RoomLimits::default();
    let party = PartyComposition::new(2, 3)
        .with_child_ages(vec![9, 7])
        .with_infant_ages(vec![1]);
    let allocation = allocate_rooms(&party, &limits);

    let ages: Vec<u8> = allocation
        .rooms
        .iter()
        .flat_map(|r| r.child_ages.iter().copied())
        .collect();
    assert_eq!(ages, vec![9, 7, 1]);

    let missing = allocate_rooms(&PartyComposition::new(2, 2), &limits);
    let ages: Vec<u8> = missing
        .rooms
        .iter()
        .flat_map(|r| r.child_ages.iter().copied())
        .collect();
    assert_eq!(ages, vec![limits.default_child_age; 2]);
}
