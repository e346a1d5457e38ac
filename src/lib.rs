//! A vector skip list is a way of storing a sparse mapping from wide
//! integer keys to values in such a way that point lookups, inserts and
//! removals all run in `O(log(w))` on average, while dense runs of keys
//! are stored as compactly as an array.
//!
//! Conceptually, the structure is a skip list whose nodes are *blocks*,
//! each covering an aligned window of 32 consecutive keys:
//!
//! ```text
//! <head> --------------> [96..127] ----------------------------> <tail>
//! <head> --------------> [96..127] --------------> [512..543] -> <tail>
//! <head> --> [0..31] --> [96..127] --> [256..287] --> [512..543] -> <tail>
//! ```
//!
//! Each block contains at the very least links to its neighbors at the
//! lowest level (the complete list of blocks), and can randomly contain
//! more links which skip further down the list, allowing the routing to a
//! key window to move faster than visiting every block. Within a block, a
//! bitmap records which of the 32 slots hold a value, so presence costs
//! one bit per key and a lone key in an otherwise empty region costs a
//! single block.
//!
//! Absent keys are not errors: reads return a caller-supplied *invalid*
//! value, which lets the container double as a logical array. The
//! structure grows a level when the block count doubles past the current
//! height and sheds its top level again, with hysteresis, as blocks
//! disappear.

// In this library, a block's 'level' is the highest tier it is linked
// into, so a block of level 0 carries exactly one pair of links. The
// container's 'height' is the level of the two sentinels, which always
// reach every tier.

#![warn(missing_docs)]

mod bits;
mod block;
pub mod level_generator;
mod rng;
pub mod vector_skiplist;

pub use crate::vector_skiplist::VectorSkipList;
