// Path: crates/consensus/src/events_by_peer.rs
//! The per-creator event index.

use parity_scale_codec::Encode;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use weft_types::app::{EventHash, ValidatorId, ValidatorSet};
use weft_types::codec;
use weft_types::error::IndexError;

/// Maps each validator to the set of DAG events it authored.
///
/// Sets are created lazily on first insertion and a missing validator reads as an
/// empty set. The index only grows: it is rebuilt for each round rather than pruned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventsByPeer {
    by_creator: BTreeMap<ValidatorId, BTreeSet<EventHash>>,
}

impl EventsByPeer {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Unions every set of `other` into `self`. Returns true if any set grew.
    pub fn add(&mut self, other: &EventsByPeer) -> bool {
        let mut changed = false;
        for (creator, events) in &other.by_creator {
            if events.is_empty() {
                continue;
            }
            let mine = self.by_creator.entry(*creator).or_default();
            for event in events {
                changed |= mine.insert(*event);
            }
        }
        changed
    }

    /// Records `event` as authored by `creator`. Returns true if it was not yet known.
    pub fn add_one(&mut self, event: EventHash, creator: ValidatorId) -> bool {
        self.by_creator.entry(creator).or_default().insert(event)
    }

    /// Returns true if `creator` is recorded as the author of `event`.
    pub fn contains(&self, creator: &ValidatorId, event: &EventHash) -> bool {
        self.by_creator
            .get(creator)
            .map_or(false, |events| events.contains(event))
    }

    /// Flattens the index into an event → creator lookup.
    ///
    /// Event hashes are content addresses and assumed globally unique; should two
    /// creators list the same hash, the greater creator id wins.
    pub fn each(&self) -> BTreeMap<EventHash, ValidatorId> {
        self.by_creator
            .iter()
            .flat_map(|(creator, events)| events.iter().map(move |e| (*e, *creator)))
            .collect()
    }

    /// The events authored by `creator`, empty if unknown.
    pub fn events_of(&self, creator: &ValidatorId) -> impl Iterator<Item = &EventHash> + '_ {
        self.by_creator.get(creator).into_iter().flatten()
    }

    /// The validators with at least one recorded event, in id order.
    pub fn creators(&self) -> impl Iterator<Item = &ValidatorId> + '_ {
        self.by_creator
            .iter()
            .filter(|(_, events)| !events.is_empty())
            .map(|(creator, _)| creator)
    }

    /// Total number of (creator, event) pairs.
    pub fn len(&self) -> usize {
        self.by_creator.values().map(BTreeSet::len).sum()
    }

    /// Returns true if no event is recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sums the weight in `set` of the validators present in the index.
    pub fn creators_weight(&self, set: &ValidatorSet) -> u128 {
        self.creators().map(|c| u128::from(set.weight_of(c))).sum()
    }

    /// Returns true if the recorded creators hold strictly more than two thirds of
    /// the weight of `set`.
    pub fn has_quorum(&self, set: &ValidatorSet) -> bool {
        if set.total_weight == 0 {
            return false;
        }
        self.creators_weight(set).saturating_mul(3) > set.total_weight.saturating_mul(2)
    }

    /// Encodes the index as its canonical sequence of (creator, event) pairs.
    pub fn to_bytes(&self) -> Vec<u8> {
        let pairs: Vec<(ValidatorId, EventHash)> = self
            .by_creator
            .iter()
            .flat_map(|(creator, events)| events.iter().map(move |e| (*creator, *e)))
            .collect();
        pairs.encode()
    }

    /// Rebuilds an index from its serialized pairs.
    ///
    /// A pair that appears twice means the encoder or the medium is corrupt; this is
    /// reported as [`IndexError::DuplicatePair`], which callers treat as fatal.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IndexError> {
        let pairs: Vec<(ValidatorId, EventHash)> =
            codec::from_bytes_canonical(bytes).map_err(IndexError::Decode)?;
        let mut index = Self::new();
        for (creator, event) in pairs {
            if !index.add_one(event, creator) {
                tracing::error!(
                    target: "consensus",
                    event = "index_duplicate_pair",
                    creator = %creator,
                    hash = %event,
                    "Duplicate pair in serialized event index"
                );
                return Err(IndexError::DuplicatePair {
                    validator: creator.to_string(),
                    event: event.to_string(),
                });
            }
        }
        Ok(index)
    }
}

impl fmt::Display for EventsByPeer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("byPeer{")?;
        let mut first = true;
        for (creator, events) in &self.by_creator {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{}:[", creator)?;
            for (i, event) in events.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", event)?;
            }
            f.write_str("]")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_types::app::ValidatorWeight;

    fn v(b: u8) -> ValidatorId {
        ValidatorId([b; 32])
    }
    fn e(b: u8) -> EventHash {
        EventHash([b; 32])
    }

    #[test]
    fn add_one_reports_change() {
        let mut idx = EventsByPeer::new();
        assert!(idx.add_one(e(1), v(1)));
        assert!(!idx.add_one(e(1), v(1)));
        assert!(idx.add_one(e(2), v(1)));
        assert!(idx.contains(&v(1), &e(2)));
        assert!(!idx.contains(&v(9), &e(2)));
        assert_eq!(idx.len(), 2);
        assert_eq!(idx.events_of(&v(7)).count(), 0);
    }

    #[test]
    fn add_unions_and_is_idempotent() {
        let mut a = EventsByPeer::new();
        a.add_one(e(1), v(1));
        let mut b = EventsByPeer::new();
        b.add_one(e(2), v(1));
        b.add_one(e(3), v(2));

        assert!(a.add(&b));
        assert!(!a.add(&b));
        assert!(!a.add(&EventsByPeer::new()));
        assert_eq!(a.len(), 3);
        assert_eq!(a.creators().count(), 2);
    }

    #[test]
    fn each_maps_event_to_creator() {
        let mut idx = EventsByPeer::new();
        idx.add_one(e(1), v(1));
        idx.add_one(e(2), v(2));
        let flat = idx.each();
        assert_eq!(flat.get(&e(1)), Some(&v(1)));
        assert_eq!(flat.get(&e(2)), Some(&v(2)));
    }

    #[test]
    fn duplicate_pair_is_rejected() {
        let pairs = vec![(v(1), e(1)), (v(2), e(2)), (v(1), e(1))];
        let err = EventsByPeer::from_bytes(&pairs.encode()).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, IndexError::DuplicatePair { .. }));

        let err = EventsByPeer::from_bytes(&[0xff]).unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn display_lists_creators_and_events() {
        let mut idx = EventsByPeer::new();
        assert_eq!(idx.to_string(), "byPeer{}");
        idx.add_one(e(0xab), v(0x01));
        let s = idx.to_string();
        assert!(s.starts_with("byPeer{0101"));
        assert!(s.contains(":[abab"));
        assert!(s.ends_with("]}"));
    }

    #[test]
    fn quorum_needs_more_than_two_thirds() {
        let set = ValidatorSet::new(vec![
            ValidatorWeight { id: v(1), weight: 1 },
            ValidatorWeight { id: v(2), weight: 1 },
            ValidatorWeight { id: v(3), weight: 1 },
        ]);
        let mut idx = EventsByPeer::new();
        idx.add_one(e(1), v(1));
        idx.add_one(e(2), v(2));
        assert_eq!(idx.creators_weight(&set), 2);
        assert!(!idx.has_quorum(&set));
        idx.add_one(e(3), v(3));
        assert!(idx.has_quorum(&set));
        idx.add_one(e(4), v(9));
        assert_eq!(idx.creators_weight(&set), 3);
        assert!(!EventsByPeer::new().has_quorum(&ValidatorSet::default()));
    }
}
