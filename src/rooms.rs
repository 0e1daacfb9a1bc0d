// Room allocation: splits a party of adults and children into hotel rooms
// under the per-room capacity and the room-count ceiling.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RoomLimits;

/// Parties with fewer children than this are distributed adults-first.
pub const MIXED_POLICY_CHILD_THRESHOLD: u32 = 2;

// Party as entered by the user. `child_ages` may be shorter than `children`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyComposition {
    pub adults: u32,
    pub children: u32,
    #[serde(default)]
    pub child_ages: Vec<u8>,
    #[serde(default)]
    pub infant_ages: Vec<u8>,
}

impl PartyComposition {
    pub fn new(adults: u32, children: u32) -> Self {
        Self {
            adults,
            children,
            ..Default::default()
        }
    }

    /// Builds a party from the ages entered per child. Anyone older than
    /// `max_child_age` travels as an adult and leaves the age list.
    pub fn from_ages(
        adults: u32,
        child_ages: Vec<u8>,
        infant_ages: Vec<u8>,
        max_child_age: u8,
    ) -> Self {
        let (child_ages, promoted): (Vec<u8>, Vec<u8>) =
            child_ages.into_iter().partition(|age| *age <= max_child_age);
        Self {
            adults: adults + promoted.len() as u32,
            children: child_ages.len() as u32,
            child_ages,
            infant_ages,
        }
    }

    pub fn with_child_ages(mut self, ages: Vec<u8>) -> Self {
        self.child_ages = ages;
        self
    }

    pub fn with_infant_ages(mut self, ages: Vec<u8>) -> Self {
        self.infant_ages = ages;
        self
    }

    pub fn has_children(&self) -> bool {
        self.children > 0
    }

    pub fn total_guests(&self) -> u32 {
        self.adults + self.children
    }

    // Children's ages first, then infants', in the order they were entered
    fn age_pool(&self) -> impl Iterator<Item = u8> + '_ {
        self.child_ages.iter().chain(self.infant_ages.iter()).copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomAssignment {
    pub adults: u32,
    pub children: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_ages: Vec<u8>,
}

impl RoomAssignment {
    pub fn new(adults: u32, children: u32) -> Self {
        Self {
            adults,
            children,
            child_ages: Vec::new(),
        }
    }

    pub fn occupants(&self) -> u32 {
        self.adults + self.children
    }

    fn spare(&self, capacity: u32) -> u32 {
        capacity.saturating_sub(self.occupants())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationPolicy {
    AdultsOnly,
    Mixed,
}

impl AllocationPolicy {
    /// Picks the policy the booking flow uses for this many children.
    pub fn for_children(children: u32) -> Self {
        if children < MIXED_POLICY_CHILD_THRESHOLD {
            AllocationPolicy::AdultsOnly
        } else {
            AllocationPolicy::Mixed
        }
    }

    pub fn allocate(&self, party: &PartyComposition, limits: &RoomLimits) -> RoomAllocation {
        match self {
            AllocationPolicy::AdultsOnly => AdultsOnlyPolicy.allocate(party, limits),
            AllocationPolicy::Mixed => MixedPolicy.allocate(party, limits),
        }
    }
}

/// Guests the policy could not fit into the available rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    pub adults: u32,
    pub children: u32,
}

/// Result of an allocation: the rooms, possibly partial, plus what was asked for.
///
/// Neither policy guarantees that every guest is placed. Callers must check
/// [`RoomAllocation::is_complete`] or [`RoomAllocation::shortfall`] before
/// booking the rooms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomAllocation {
    pub policy: AllocationPolicy,
    pub rooms: Vec<RoomAssignment>,
    pub requested_adults: u32,
    pub requested_children: u32,
}

impl RoomAllocation {
    pub fn placed_adults(&self) -> u32 {
        self.rooms.iter().map(|r| r.adults).sum()
    }

    pub fn placed_children(&self) -> u32 {
        self.rooms.iter().map(|r| r.children).sum()
    }

    pub fn shortfall(&self) -> Option<Shortfall> {
        let shortfall = Shortfall {
            adults: self.requested_adults.saturating_sub(self.placed_adults()),
            children: self.requested_children.saturating_sub(self.placed_children()),
        };
        if shortfall.adults == 0 && shortfall.children == 0 {
            None
        } else {
            Some(shortfall)
        }
    }

    pub fn is_over_allocated(&self) -> bool {
        self.placed_adults() > self.requested_adults
            || self.placed_children() > self.requested_children
    }

    pub fn is_complete(&self) -> bool {
        self.shortfall().is_none() && !self.is_over_allocated()
    }

    /// True when no room exceeds capacity and the room ceiling holds.
    pub fn respects_limits(&self, limits: &RoomLimits) -> bool {
        self.rooms.len() <= limits.max_rooms
            && self
                .rooms
                .iter()
                .all(|r| r.occupants() <= limits.room_capacity)
    }
}

pub trait RoomAllocationStrategy {
    fn policy(&self) -> AllocationPolicy;

    // Room counts only; ages are attached by `allocate`
    fn distribute(&self, adults: u32, children: u32, limits: &RoomLimits) -> Vec<RoomAssignment>;

    fn allocate(&self, party: &PartyComposition, limits: &RoomLimits) -> RoomAllocation {
        let mut rooms = self.distribute(party.adults, party.children, limits);
        assign_child_ages(&mut rooms, party, limits.default_child_age);

        let allocation = RoomAllocation {
            policy: self.policy(),
            rooms,
            requested_adults: party.adults,
            requested_children: party.children,
        };

        debug!(
            policy = ?allocation.policy,
            rooms = allocation.rooms.len(),
            adults = party.adults,
            children = party.children,
            "rooms allocated"
        );
        if let Some(shortfall) = allocation.shortfall() {
            warn!(
                unplaced_adults = shortfall.adults,
                unplaced_children = shortfall.children,
                "party does not fit in {} rooms",
                limits.max_rooms
            );
        }

        allocation
    }
}

/// Fills rooms with adults first, then spreads children over the spare beds.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdultsOnlyPolicy;

impl RoomAllocationStrategy for AdultsOnlyPolicy {
    fn policy(&self) -> AllocationPolicy {
        AllocationPolicy::AdultsOnly
    }

    fn distribute(
        &self,
        mut adults: u32,
        mut children: u32,
        limits: &RoomLimits,
    ) -> Vec<RoomAssignment> {
        let mut rooms = Vec::new();
        let cap = adult_cap(adults, limits);

        while adults > 0 && rooms.len() < limits.max_rooms {
            let room_adults = adults.min(cap);
            rooms.push(RoomAssignment::new(room_adults, 0));
            adults -= room_adults;
        }

        sweep_children(&mut rooms, &mut children, limits);
        open_escorted_rooms(&mut rooms, &mut adults, &mut children, limits);

        rooms
    }
}

/// Seeds the first room with children, escorting each further child room
/// with a single adult.
///
/// When children are present the first room gives up one of its two
/// adults to the pool before taking children. That can leave the first
/// room with a single adult and the second adult in a room of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct MixedPolicy;

impl RoomAllocationStrategy for MixedPolicy {
    fn policy(&self) -> AllocationPolicy {
        AllocationPolicy::Mixed
    }

    fn distribute(
        &self,
        mut adults: u32,
        mut children: u32,
        limits: &RoomLimits,
    ) -> Vec<RoomAssignment> {
        if adults == 0 {
            return Vec::new();
        }

        let capacity = limits.room_capacity;
        let max_children = limits.max_children_per_room;

        if children == 0 && adults > limits.max_adults_per_room {
            if adults == limits.max_adults_per_room + 1 {
                return vec![RoomAssignment::new(adults, 0)];
            }
            let half = adults / 2;
            if adults % 2 == 1 && half + 1 <= capacity {
                return vec![
                    RoomAssignment::new(half + 1, 0),
                    RoomAssignment::new(half, 0),
                ];
            }
        }

        let first_adults = adults.min(limits.max_adults_per_room);
        let mut rooms = vec![RoomAssignment::new(first_adults, 0)];
        adults -= first_adults;

        if children == 0 && adults == 0 {
            return rooms;
        }

        let cap = adult_cap(adults + first_adults, limits);

        if children > 0 {
            let first = &mut rooms[0];
            if first.adults > 1 {
                first.adults -= 1;
                adults += 1;
            }
            let placed = children
                .min(capacity.saturating_sub(first.adults))
                .min(max_children);
            first.children = placed;
            children -= placed;
        }

        while adults > 0 && rooms.len() < limits.max_rooms {
            let room_adults = if children > 0 { 1 } else { adults.min(cap) };
            let mut room_children = 0;
            if children > 0 {
                room_children = children
                    .min(capacity.saturating_sub(room_adults))
                    .min(max_children);
                children -= room_children;
            }
            rooms.push(RoomAssignment::new(room_adults, room_children));
            adults -= room_adults;
        }

        sweep_children(&mut rooms, &mut children, limits);
        open_escorted_rooms(&mut rooms, &mut adults, &mut children, limits);

        rooms
    }
}

/// Allocates with the policy chosen by [`AllocationPolicy::for_children`].
pub fn allocate_rooms(party: &PartyComposition, limits: &RoomLimits) -> RoomAllocation {
    AllocationPolicy::for_children(party.children).allocate(party, limits)
}

// Odd parties allow one extra adult per room
fn adult_cap(total_adults: u32, limits: &RoomLimits) -> u32 {
    if total_adults % 2 == 1 {
        limits.max_adults_per_room + 1
    } else {
        limits.max_adults_per_room
    }
}

// Left-to-right pass placing children into rooms that already hold an adult
fn sweep_children(rooms: &mut [RoomAssignment], children: &mut u32, limits: &RoomLimits) {
    for room in rooms.iter_mut() {
        if *children == 0 {
            break;
        }
        let spare = room.spare(limits.room_capacity);
        if spare > 0 && room.adults > 0 {
            let placed = (*children)
                .min(spare)
                .min(limits.max_children_per_room.saturating_sub(room.children));
            room.children += placed;
            *children -= placed;
        }
    }
}

fn open_escorted_rooms(
    rooms: &mut Vec<RoomAssignment>,
    adults: &mut u32,
    children: &mut u32,
    limits: &RoomLimits,
) {
    while *children > 0 && rooms.len() < limits.max_rooms && *adults > 0 {
        let room_adults = (*adults).min(1);
        let room_children = (*children)
            .min(limits.max_children_per_room)
            .min(limits.room_capacity.saturating_sub(room_adults));
        rooms.push(RoomAssignment::new(room_adults, room_children));
        *adults -= room_adults;
        *children -= room_children;
    }
}

fn assign_child_ages(rooms: &mut [RoomAssignment], party: &PartyComposition, default_age: u8) {
    let mut pool = party.age_pool();
    for room in rooms.iter_mut() {
        room.child_ages = (0..room.children)
            .map(|_| pool.next().unwrap_or(default_age))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(rooms: &[RoomAssignment]) -> Vec<(u32, u32)> {
        rooms.iter().map(|r| (r.adults, r.children)).collect()
    }

    fn mixed(adults: u32, children: u32) -> Vec<(u32, u32)> {
        counts(&MixedPolicy.distribute(adults, children, &RoomLimits::default()))
    }

    fn adults_only(adults: u32, children: u32) -> Vec<(u32, u32)> {
        counts(&AdultsOnlyPolicy.distribute(adults, children, &RoomLimits::default()))
    }

    #[test]
    fn test_policy_selection_threshold() {
        assert_eq!(AllocationPolicy::for_children(0), AllocationPolicy::AdultsOnly);
        assert_eq!(AllocationPolicy::for_children(1), AllocationPolicy::AdultsOnly);
        assert_eq!(AllocationPolicy::for_children(2), AllocationPolicy::Mixed);
        assert_eq!(AllocationPolicy::for_children(5), AllocationPolicy::Mixed);
    }

    #[test]
    fn test_adults_only_parity_cap() {
        assert_eq!(adults_only(4, 0), vec![(2, 0), (2, 0)]);
        assert_eq!(adults_only(5, 0), vec![(3, 0), (2, 0)]);
        assert_eq!(adults_only(9, 0), vec![(3, 0), (3, 0), (3, 0)]);
        assert_eq!(adults_only(1, 0), vec![(1, 0)]);
    }

    #[test]
    fn test_adults_only_sweeps_children_left_to_right() {
        assert_eq!(adults_only(2, 1), vec![(2, 1)]);
        assert_eq!(adults_only(3, 1), vec![(3, 1)]);
        assert_eq!(adults_only(4, 1), vec![(2, 1), (2, 0)]);
        assert_eq!(adults_only(5, 1), vec![(3, 1), (2, 0)]);
        // a full room is skipped
        assert_eq!(adults_only(2, 3), vec![(2, 2)]);
    }

    #[test]
    fn test_adults_only_without_adults_is_empty() {
        assert!(adults_only(0, 1).is_empty());
    }

    #[test]
    fn test_mixed_adults_only_special_cases() {
        assert_eq!(mixed(3, 0), vec![(3, 0)]);
        assert_eq!(mixed(4, 0), vec![(2, 0), (2, 0)]);
        assert_eq!(mixed(5, 0), vec![(3, 0), (2, 0)]);
        assert_eq!(mixed(7, 0), vec![(4, 0), (3, 0)]);
        assert_eq!(mixed(6, 0), vec![(2, 0), (2, 0), (2, 0)]);
        assert_eq!(mixed(2, 0), vec![(2, 0)]);
        assert_eq!(mixed(1, 0), vec![(1, 0)]);
    }

    #[test]
    fn test_mixed_large_odd_party_stays_within_capacity() {
        // halves of 9 would overflow a room, so the general path runs
        assert_eq!(mixed(9, 0), vec![(2, 0), (3, 0), (3, 0), (1, 0)]);
    }

    #[test]
    fn test_mixed_demotes_first_room_adult() {
        assert_eq!(mixed(2, 2), vec![(1, 2), (1, 0)]);
        assert_eq!(mixed(2, 3), vec![(1, 3), (1, 0)]);
        assert_eq!(mixed(2, 4), vec![(1, 3), (1, 1)]);
        assert_eq!(mixed(1, 2), vec![(1, 2)]);
    }

    #[test]
    fn test_mixed_escorts_children_with_single_adults() {
        assert_eq!(mixed(4, 6), vec![(1, 3), (1, 3), (2, 0)]);
        assert_eq!(mixed(3, 2), vec![(1, 2), (2, 0)]);
    }

    #[test]
    fn test_shortfall_reported_when_rooms_run_out() {
        let party = PartyComposition::new(1, 4);
        let allocation = MixedPolicy.allocate(&party, &RoomLimits::default());
        assert_eq!(counts(&allocation.rooms), vec![(1, 3)]);
        assert_eq!(
            allocation.shortfall(),
            Some(Shortfall {
                adults: 0,
                children: 1
            })
        );
        assert!(!allocation.is_complete());
    }

    #[test]
    fn test_child_ages_follow_room_order_with_default() {
        let party = PartyComposition::new(2, 4)
            .with_child_ages(vec![7, 9])
            .with_infant_ages(vec![1]);
        let allocation = allocate_rooms(&party, &RoomLimits::default());

        assert_eq!(allocation.policy, AllocationPolicy::Mixed);
        assert_eq!(allocation.rooms[0].child_ages, vec![7, 9, 1]);
        assert_eq!(allocation.rooms[1].child_ages, vec![5]);
        assert!(allocation.is_complete());
    }

    #[test]
    fn test_from_ages_promotes_older_children() {
        let limits = RoomLimits::default();
        let party = PartyComposition::from_ages(2, vec![14, 8, 11], vec![1], limits.max_child_age);
        assert_eq!(party.adults, 3);
        assert_eq!(party.children, 2);
        assert_eq!(party.child_ages, vec![8, 11]);
        assert_eq!(party.infant_ages, vec![1]);

        let nobody_promoted = PartyComposition::from_ages(1, vec![3, 5], vec![], 11);
        assert_eq!(nobody_promoted, PartyComposition::new(1, 2).with_child_ages(vec![3, 5]));
    }

    #[test]
    fn test_promotion_changes_policy() {
        let limits = RoomLimits::default();
        let as_entered = PartyComposition::new(2, 2).with_child_ages(vec![14, 8]);
        assert_eq!(allocate_rooms(&as_entered, &limits).policy, AllocationPolicy::Mixed);

        let party = PartyComposition::from_ages(2, vec![14, 8], vec![], limits.max_child_age);
        let allocation = allocate_rooms(&party, &limits);
        assert_eq!(allocation.policy, AllocationPolicy::AdultsOnly);
        assert_eq!(counts(&allocation.rooms), vec![(3, 1)]);
        assert_eq!(allocation.rooms[0].child_ages, vec![8]);
        assert!(allocation.is_complete());
    }

    #[test]
    fn test_allocation_serializes_without_empty_ages() {
        let allocation = allocate_rooms(&PartyComposition::new(2, 0), &RoomLimits::default());
        let json = serde_json::to_value(&allocation.rooms).unwrap();
        assert_eq!(json, serde_json::json!([{ "adults": 2, "children": 0 }]));
    }
}
