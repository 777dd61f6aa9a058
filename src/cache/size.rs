//! Size Estimation Module
//!
//! Approximates the in-memory footprint of cached values. Estimates are
//! deliberately coarse but deterministic: the store keeps a running total by
//! adding and subtracting these numbers, so equal values must always produce
//! equal estimates.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use serde_json::Value;

// == Cost Constants ==
/// Cost of a pointer-sized slot, also the floor for unrecognised shapes.
pub const POINTER_SIZE: usize = 8;
/// Fixed overhead added to every text value.
pub const STRING_OVERHEAD: usize = 16;
/// Fixed overhead of a growable sequence header.
pub const SEQUENCE_OVERHEAD: usize = 24;
/// Baseline cost per sequence element.
pub const ELEMENT_SIZE: usize = 8;
/// Multiplier applied per element when the element type is boxed or polymorphic.
pub const BOXED_ELEMENT_FACTOR: usize = 4;
/// Cost per entry of an associative container.
pub const MAP_ENTRY_SIZE: usize = 32;
/// Average cost per field of a record value.
pub const FIELD_SIZE: usize = 16;

// == Estimate Size ==
/// Types whose footprint the cache can approximate.
pub trait EstimateSize {
    /// Whether values of this type are boxed or polymorphic, which makes them
    /// more expensive to hold inside a sequence.
    const BOXED: bool = false;

    /// Returns an approximate size in bytes.
    fn estimate_size(&self) -> usize;
}

/// Aggregate rule for record values: field count times an average field cost.
pub const fn record_size(field_count: usize) -> usize {
    field_count * FIELD_SIZE
}

/// Sequence rule shared by every ordered container.
pub fn sequence_size<T: EstimateSize>(len: usize) -> usize {
    let mut size = len * ELEMENT_SIZE;
    if T::BOXED && len > 0 {
        size *= BOXED_ELEMENT_FACTOR;
    }
    size + SEQUENCE_OVERHEAD
}

fn text_size(text: &str) -> usize {
    text.len() + STRING_OVERHEAD
}

impl EstimateSize for str {
    fn estimate_size(&self) -> usize {
        text_size(self)
    }
}

impl EstimateSize for String {
    fn estimate_size(&self) -> usize {
        text_size(self)
    }
}

impl<T: EstimateSize> EstimateSize for [T] {
    fn estimate_size(&self) -> usize {
        sequence_size::<T>(self.len())
    }
}

impl<T: EstimateSize> EstimateSize for Vec<T> {
    fn estimate_size(&self) -> usize {
        sequence_size::<T>(self.len())
    }
}

impl<T: EstimateSize> EstimateSize for VecDeque<T> {
    fn estimate_size(&self) -> usize {
        sequence_size::<T>(self.len())
    }
}

impl<K, V> EstimateSize for HashMap<K, V> {
    fn estimate_size(&self) -> usize {
        self.len() * MAP_ENTRY_SIZE
    }
}

impl<K, V> EstimateSize for BTreeMap<K, V> {
    fn estimate_size(&self) -> usize {
        self.len() * MAP_ENTRY_SIZE
    }
}

impl<T: EstimateSize + ?Sized> EstimateSize for Box<T> {
    const BOXED: bool = true;

    fn estimate_size(&self) -> usize {
        POINTER_SIZE + (**self).estimate_size()
    }
}

impl<T: EstimateSize + ?Sized> EstimateSize for Arc<T> {
    const BOXED: bool = true;

    fn estimate_size(&self) -> usize {
        POINTER_SIZE + (**self).estimate_size()
    }
}

impl<T: EstimateSize> EstimateSize for Option<T> {
    fn estimate_size(&self) -> usize {
        match self {
            Some(inner) => POINTER_SIZE + inner.estimate_size(),
            None => POINTER_SIZE,
        }
    }
}

macro_rules! impl_minimal_estimate {
    ($($ty:ty),* $(,)?) => {
        $(
            impl EstimateSize for $ty {
                fn estimate_size(&self) -> usize {
                    POINTER_SIZE
                }
            }
        )*
    };
}

impl_minimal_estimate!(
    (), bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
);

impl EstimateSize for Value {
    const BOXED: bool = true;

    fn estimate_size(&self) -> usize {
        match self {
            Value::String(text) => text_size(text),
            Value::Array(items) => {
                sequence_size::<Value>(items.len())
                    + items.iter().map(Value::estimate_size).sum::<usize>()
            }
            Value::Object(map) => map
                .iter()
                .map(|(key, value)| MAP_ENTRY_SIZE + text_size(key) + value.estimate_size())
                .sum(),
            Value::Null | Value::Bool(_) | Value::Number(_) => POINTER_SIZE,
        }
    }
}
