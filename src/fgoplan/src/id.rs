//! Typed identifiers
//!
//! Every game object is identified by a plain integer, but ids of different
//! kinds must never be mixed up. [`Id`] carries a zero-sized kind marker so
//! the compiler rejects comparing a servant id with an item id.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker trait for identifier kinds.
pub trait IdKind {
    /// Human-readable kind name, used in debug output.
    const NAME: &'static str;
}

/// Identifier kinds. These are uninhabited types used purely as tags.
pub mod kind {
    use super::IdKind;

    macro_rules! id_kind {
        ($($ty:ident => $name:literal),* $(,)?) => {
            $(
                #[derive(Debug)]
                pub enum $ty {}

                impl IdKind for $ty {
                    const NAME: &'static str = $name;
                }
            )*
        };
    }

    id_kind! {
        Servant => "servant",
        Item => "item",
        Skill => "skill",
        Event => "event",
        War => "war",
    }
}

/// A numeric identifier tagged with its kind.
pub struct Id<K: IdKind> {
    value: u32,
    _kind: PhantomData<fn() -> K>,
}

pub type ServantId = Id<kind::Servant>;
pub type ItemId = Id<kind::Item>;
pub type SkillId = Id<kind::Skill>;
pub type EventId = Id<kind::Event>;
pub type WarId = Id<kind::War>;

impl<K: IdKind> Id<K> {
    /// Tag a raw value as an id of kind `K`.
    pub const fn tag(value: u32) -> Self {
        Self {
            value,
            _kind: PhantomData,
        }
    }

    /// The underlying integer.
    pub const fn value(self) -> u32 {
        self.value
    }
}

impl<K: IdKind> Clone for Id<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: IdKind> Copy for Id<K> {}

impl<K: IdKind> PartialEq for Id<K> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<K: IdKind> Eq for Id<K> {}

impl<K: IdKind> PartialOrd for Id<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: IdKind> Ord for Id<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl<K: IdKind> Hash for Id<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<K: IdKind> fmt::Debug for Id<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", K::NAME, self.value)
    }
}

impl<K: IdKind> fmt::Display for Id<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<K: IdKind> Serialize for Id<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.value)
    }
}

impl<'de, K: IdKind> Deserialize<'de> for Id<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(Self::tag)
    }
}
