//! A sparse indexed container which behaves as a dictionary and as a
//! logical array at the same time: absent keys read back as a
//! caller-supplied invalid value instead of an error.

use std::{fmt, ops};

use crate::{
    bits,
    block::{self, base_of, Block},
    level_generator::{LevelGenerator, TrailingZeros, MAX_LEVELS},
    rng::DEFAULT_SEED,
};

// ////////////////////////////////////////////////////////////////////////////
// VectorSkipList
// ////////////////////////////////////////////////////////////////////////////

/// Arena slot of the head sentinel.
const HEAD: usize = 0;
/// Arena slot of the tail sentinel.
const TAIL: usize = 1;

/// The container height does not shrink below this floor, and only shrinks
/// at all once the block count falls to `2^height - 2^MIN_LEVEL`.
const MIN_LEVEL: usize = 6;

/// A `VectorSkipList` maps `u64` keys to values of a copyable type `V`,
/// optimized for keys that cluster in runs separated by large gaps.
///
/// The structure is a skip list whose nodes are not single entries but
/// *blocks*: each block covers an aligned window of 32 consecutive keys and
/// tracks slot occupancy in a bitmap, so a dense run of keys costs one node
/// per 32 entries while a lone key in the middle of nowhere costs exactly
/// one node. Reads for absent keys return a caller-supplied *invalid*
/// value, which makes the container usable as a plain array:
///
/// ```text
/// <head> --------------> [96..127] ----------------------------> <tail>
/// <head> --------------> [96..127] --------------> [512..543] -> <tail>
/// <head> --> [0..31] --> [96..127] --> [256..287] --> [512..543] -> <tail>
/// ```
///
/// Every block participates in level 0; each higher level holds a random
/// subset of the blocks below it, so routing to a key window takes
/// `O(log w)` expected steps for `w` blocks, plus a constant-time bitmap
/// probe inside the block.
///
/// Blocks are held in an arena and linked by index in both directions at
/// every level, with permanent head and tail sentinels bounding each
/// level. Deletions are in place: a block is only unlinked once its last
/// slot is cleared, and blocks are never split or merged.
///
/// The container is not thread-safe; it performs no locking and requires
/// `&mut self` for every mutation.
#[derive(Clone)]
pub struct VectorSkipList<V> {
    // Block arena; slots 0 and 1 are the sentinels, which are never
    // unlinked. Links between blocks are arena indices.
    blocks: Vec<Block<V>>,
    // Recycled arena slots.
    free: Vec<usize>,
    // Number of linked non-sentinel blocks.
    width: u64,
    // Current top level. Sentinels always reach exactly this level.
    height: usize,
    // Number of occupied slots across all blocks.
    len: u64,
    // Returned for absent keys; also the fill for slots materialized
    // through `IndexMut`.
    invalid: V,
    level_generator: TrailingZeros,
}

// ///////////////////////////////////////////////
// Inherent methods
// ///////////////////////////////////////////////

impl<V> VectorSkipList<V>
where
    V: Copy,
{
    /// Create a new list which reports `invalid` for absent keys. Level
    /// assignment uses a fixed default seed, so the structure built by a
    /// given operation sequence is reproducible.
    ///
    /// # Examples
    ///
    /// ```
    /// use vector_skiplist::VectorSkipList;
    ///
    /// let mut list = VectorSkipList::new(f64::NAN);
    /// list.set(3, 1.5);
    /// assert_eq!(list.get(3), 1.5);
    /// assert!(list.get(4).is_nan());
    /// ```
    #[inline]
    pub fn new(invalid: V) -> Self {
        Self::new_seeded(invalid, DEFAULT_SEED)
    }

    /// Create a new list with an explicit seed for level assignment.
    ///
    /// Two lists built with the same seed and the same operation sequence
    /// have identical internal structure.
    ///
    /// # Examples
    ///
    /// ```
    /// use vector_skiplist::VectorSkipList;
    ///
    /// let mut list = VectorSkipList::new_seeded(-1i64, 0xFEED);
    /// list.set(10, 100);
    /// assert_eq!(list.get(10), 100);
    /// ```
    pub fn new_seeded(invalid: V, seed: u64) -> Self {
        let mut list = VectorSkipList {
            blocks: Vec::new(),
            free: Vec::new(),
            width: 0,
            height: 0,
            len: 0,
            invalid,
            level_generator: TrailingZeros::with_seed(seed),
        };
        list.clear();
        list
    }

    /// Create a new list seeded from the system entropy source.
    ///
    /// # Examples
    ///
    /// ```
    /// use vector_skiplist::VectorSkipList;
    ///
    /// let mut list = VectorSkipList::from_entropy(-1i64);
    /// list.set(1, 11);
    /// assert_eq!(list.get(1), 11);
    /// ```
    pub fn from_entropy(invalid: V) -> Self {
        Self::new_seeded(invalid, rand::random())
    }

    /// Clears the list, removing all values.
    ///
    /// # Examples
    ///
    /// ```
    /// use vector_skiplist::VectorSkipList;
    ///
    /// let mut list = VectorSkipList::new(-1i64);
    /// list.set(5, 50);
    /// list.clear();
    /// assert!(list.is_empty());
    /// assert_eq!(list.get(5), -1);
    /// ```
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.blocks.push(Block::new(0, 0)); // head sentinel
        self.blocks.push(Block::new(0, 0)); // tail sentinel
        self.blocks[HEAD].set_right(0, TAIL);
        self.blocks[TAIL].set_left(0, HEAD);
        self.free.clear();
        self.width = 0;
        self.height = 0;
        self.len = 0;
    }

    /// Returns the number of keys currently holding a value.
    ///
    /// # Examples
    ///
    /// ```
    /// use vector_skiplist::VectorSkipList;
    ///
    /// let mut list = VectorSkipList::new(-1i64);
    /// list.set(1_000_000, 1);
    /// list.set(2_000_000, 2);
    /// assert_eq!(list.len(), 2);
    /// ```
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` if no key holds a value.
    ///
    /// # Examples
    ///
    /// ```
    /// use vector_skiplist::VectorSkipList;
    ///
    /// let mut list = VectorSkipList::new(-1i64);
    /// assert!(list.is_empty());
    ///
    /// list.set(7, 70);
    /// assert!(!list.is_empty());
    /// ```
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the current top level of the skip list. Grows with the
    /// number of blocks; mainly useful as a diagnostic.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns `true` if `index` holds a value.
    ///
    /// # Examples
    ///
    /// ```
    /// use vector_skiplist::VectorSkipList;
    ///
    /// let mut list = VectorSkipList::new(-1i64);
    /// list.set(42, 1);
    /// assert!(list.has(42));
    /// assert!(!list.has(41));
    /// ```
    pub fn has(&self, index: u64) -> bool {
        if self.width == 0 {
            return false;
        }
        let mut path = [HEAD; MAX_LEVELS];
        let node = self.find_left(index, &mut path);
        match self.covering_offset(node, index) {
            Some(offset) => self.blocks[node].has(offset),
            None => false,
        }
    }

    /// Returns the value at `index`, or the invalid value if the key is
    /// absent. Never fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use vector_skiplist::VectorSkipList;
    ///
    /// let mut list = VectorSkipList::new(-1i64);
    /// list.set(100, 7);
    /// assert_eq!(list.get(100), 7);
    /// assert_eq!(list.get(101), -1);
    /// ```
    pub fn get(&self, index: u64) -> V {
        if self.width == 0 {
            return self.invalid;
        }
        let mut path = [HEAD; MAX_LEVELS];
        let node = self.find_left(index, &mut path);
        match self.covering_offset(node, index) {
            Some(offset) => self.blocks[node].get(offset).copied().unwrap_or(self.invalid),
            None => self.invalid,
        }
    }

    /// Store `value` at `index`, inserting or overwriting. The value is
    /// stored verbatim even when it equals the invalid value; removal
    /// happens only through [`erase`](Self::erase).
    ///
    /// # Examples
    ///
    /// ```
    /// use vector_skiplist::VectorSkipList;
    ///
    /// let mut list = VectorSkipList::new(-1i64);
    /// list.set(3, 30);
    /// list.set(3, 33);
    /// assert_eq!(list.get(3), 33);
    /// assert_eq!(list.len(), 1);
    /// ```
    pub fn set(&mut self, index: u64, value: V) {
        let mut path = [HEAD; MAX_LEVELS];
        let node = self.find_left(index, &mut path);
        let target = match self.covering_offset(node, index) {
            Some(_) => node,
            None => self.insert_block(base_of(index), &path),
        };
        let offset = (index - self.blocks[target].base) as usize;
        if self.blocks[target].set(offset, value) {
            self.len += 1;
        }
    }

    /// Remove the value at `index`. Returns `true` iff a value was
    /// present; erasing an absent key is a no-op returning `false`.
    ///
    /// The deletion is logical. The covering block stays linked while any
    /// of its other slots are occupied and is unlinked as soon as it
    /// becomes empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use vector_skiplist::VectorSkipList;
    ///
    /// let mut list = VectorSkipList::new(-1i64);
    /// list.set(8, 80);
    /// assert!(list.erase(8));
    /// assert!(!list.erase(8));
    /// assert_eq!(list.get(8), -1);
    /// ```
    pub fn erase(&mut self, index: u64) -> bool {
        if self.width == 0 {
            return false;
        }
        let mut path = [HEAD; MAX_LEVELS];
        let node = self.find_left(index, &mut path);
        let offset = match self.covering_offset(node, index) {
            Some(offset) => offset,
            None => return false,
        };
        if !self.blocks[node].erase(offset) {
            return false;
        }
        self.len -= 1;
        if self.blocks[node].is_empty() {
            self.unlink(node);
        }
        true
    }
}

// ///////////////////////////////////////////////
// Internal methods
// ///////////////////////////////////////////////

impl<V> VectorSkipList<V> {
    /// Descend from the head, returning the rightmost block whose base key
    /// is at most `index` (or `HEAD` if none exists). `path` receives, for
    /// each level, the rightmost block visited at that level; it is the
    /// splice path for a subsequent insertion.
    fn find_left(&self, index: u64, path: &mut [usize; MAX_LEVELS]) -> usize {
        let mut node = HEAD;
        let mut level = self.height;
        loop {
            let next = self.blocks[node].right(level);
            if next != TAIL && self.blocks[next].base <= index {
                node = next;
            } else {
                path[level] = node;
                if level == 0 {
                    break;
                }
                level -= 1;
            }
        }
        node
    }

    /// If `node` is a real block whose window covers `index`, return the
    /// in-block offset.
    fn covering_offset(&self, node: usize, index: u64) -> Option<usize> {
        if node == HEAD {
            return None;
        }
        let offset = index - self.blocks[node].base;
        if offset < block::CAPACITY as u64 {
            Some(offset as usize)
        } else {
            None
        }
    }

    /// Splice a fresh block with the given (aligned) base key between the
    /// predecessors recorded in `path` and their right neighbors. Grows
    /// the container height if the block count now exceeds `2^height`.
    fn insert_block(&mut self, base: u64, path: &[usize; MAX_LEVELS]) -> usize {
        // New blocks never exceed the current height; extra tiers come
        // only from grow_level.
        let level = self.level_generator.random().min(self.height);
        let node = match self.free.pop() {
            Some(slot) => {
                self.blocks[slot] = Block::new(base, level);
                slot
            }
            None => {
                self.blocks.push(Block::new(base, level));
                self.blocks.len() - 1
            }
        };

        for l in 0..=level {
            let left = path[l];
            let right = self.blocks[left].right(l);
            self.blocks[node].set_left(l, left);
            self.blocks[node].set_right(l, right);
            self.blocks[left].set_right(l, node);
            self.blocks[right].set_left(l, node);
        }

        self.width += 1;
        if self.height + 1 < MAX_LEVELS && self.width > 1u64 << self.height {
            self.grow_level();
        }
        node
    }

    /// Remove `node` from every level it participates in and recycle its
    /// arena slot, shrinking the container height if the block count has
    /// fallen far enough below the growth threshold.
    fn unlink(&mut self, node: usize) {
        let level = self.blocks[node].level;
        for l in 0..=level {
            let left = self.blocks[node].left(l);
            let right = self.blocks[node].right(l);
            self.blocks[left].set_right(l, right);
            self.blocks[right].set_left(l, left);
        }
        self.free.push(node);
        self.width -= 1;

        if self.height >= MIN_LEVEL
            && self.width <= (1u64 << self.height) - (1u64 << MIN_LEVEL)
        {
            self.shrink_level();
        }
    }

    /// Add one level to the container, promoting each block of the
    /// previous top level with probability one half.
    fn grow_level(&mut self) {
        self.blocks[HEAD].increase_level();
        self.blocks[TAIL].increase_level();
        self.height += 1;

        let top = self.height;
        let mut left = HEAD;
        let mut promoted = false;

        let mut node = self.blocks[HEAD].right(top - 1);
        while node != TAIL {
            let next = self.blocks[node].right(top - 1);
            // The last candidate is promoted unconditionally if every coin
            // so far came up tails: the new top level must not be empty.
            if self.level_generator.coin() || (!promoted && next == TAIL) {
                self.blocks[node].increase_level();
                self.blocks[node].set_left(top, left);
                self.blocks[left].set_right(top, node);
                left = node;
                promoted = true;
            }
            node = next;
        }

        self.blocks[left].set_right(top, TAIL);
        self.blocks[TAIL].set_left(top, left);
    }

    /// Drop the top level: demote every block in its chain, then both
    /// sentinels.
    fn shrink_level(&mut self) {
        let top = self.height;
        let mut node = HEAD;
        while node != TAIL {
            let next = self.blocks[node].right(top);
            self.blocks[node].decrease_level();
            node = next;
        }
        self.blocks[TAIL].decrease_level();
        self.height -= 1;
    }

    /// Checks the integrity of the skip list.
    #[allow(dead_code)]
    fn check(&self) {
        assert_eq!(self.blocks[HEAD].level, self.height);
        assert_eq!(self.blocks[TAIL].level, self.height);
        assert!(self.blocks[HEAD].is_empty());
        assert!(self.blocks[TAIL].is_empty());

        // Hysteresis bound: a tall container must still be populated
        // enough that the last shrink threshold has not been crossed.
        if self.height >= MIN_LEVEL {
            assert!(self.width > (1u64 << self.height) - (1u64 << MIN_LEVEL));
        }

        // Walk level 0: every linked block in strictly increasing, aligned
        // base order, none empty, none on the free list.
        let mut reachable = Vec::new();
        let mut live = 0u64;
        let mut previous_base = None;
        let mut node = self.blocks[HEAD].right(0);
        while node != TAIL {
            let block = &self.blocks[node];
            assert_eq!(block.base % block::CAPACITY as u64, 0);
            if let Some(previous) = previous_base {
                assert!(previous < block.base);
            }
            previous_base = Some(block.base);
            assert!(!block.is_empty());
            assert!(block.level <= self.height);
            assert!(!self.free.contains(&node));
            live += u64::from(block.occupancy());
            reachable.push(node);
            node = block.right(0);
        }
        assert_eq!(reachable.len() as u64, self.width);
        assert_eq!(live, self.len);

        // Each level's chain must visit exactly the blocks reaching that
        // level, in level-0 order, with symmetric links.
        for level in 0..=self.height {
            let expected: Vec<usize> = reachable
                .iter()
                .copied()
                .filter(|&n| self.blocks[n].level >= level)
                .collect();
            let mut chain = Vec::new();
            let mut previous = HEAD;
            let mut node = self.blocks[HEAD].right(level);
            while node != TAIL {
                assert_eq!(self.blocks[node].left(level), previous);
                chain.push(node);
                previous = node;
                node = self.blocks[node].right(level);
            }
            assert_eq!(self.blocks[TAIL].left(level), previous);
            assert_eq!(chain, expected);
        }
    }

    /// Prints out the internal structure of the skip list (for debugging
    /// purposes).
    #[allow(dead_code)]
    fn debug_structure(&self) {
        for level in (0..=self.height).rev() {
            let mut row = format!("L{}: head", level);
            let mut node = self.blocks[HEAD].right(level);
            while node != TAIL {
                let block = &self.blocks[node];
                row.push_str(&format!(" -> [{}+{}]", block.base, block.occupancy()));
                node = block.right(level);
            }
            row.push_str(" -> tail");
            println!("{}", row);
        }
    }
}

// ///////////////////////////////////////////////
// Trait implementation
// ///////////////////////////////////////////////

impl<V> ops::Index<u64> for VectorSkipList<V>
where
    V: Copy,
{
    type Output = V;

    /// Read the value at `index`, returning a reference to the invalid
    /// value when the key is absent. Never materializes storage.
    fn index(&self, index: u64) -> &V {
        if self.width == 0 {
            return &self.invalid;
        }
        let mut path = [HEAD; MAX_LEVELS];
        let node = self.find_left(index, &mut path);
        match self.covering_offset(node, index) {
            Some(offset) => self.blocks[node].get(offset).unwrap_or(&self.invalid),
            None => &self.invalid,
        }
    }
}

impl<V> ops::IndexMut<u64> for VectorSkipList<V>
where
    V: Copy,
{
    /// Returns a mutable reference to the value at `index`, materializing
    /// the slot (and, if needed, the covering block) with the invalid
    /// value first when the key is absent.
    ///
    /// ```
    /// use vector_skiplist::VectorSkipList;
    ///
    /// let mut list = VectorSkipList::new(0.0f64);
    /// list[3] = 2.5;
    /// assert_eq!(list[3], 2.5);
    /// assert_eq!(list[9], 0.0);
    /// ```
    fn index_mut(&mut self, index: u64) -> &mut V {
        let mut path = [HEAD; MAX_LEVELS];
        let node = self.find_left(index, &mut path);
        let target = match self.covering_offset(node, index) {
            Some(_) => node,
            None => self.insert_block(base_of(index), &path),
        };
        let offset = (index - self.blocks[target].base) as usize;
        if !self.blocks[target].has(offset) {
            let fill = self.invalid;
            if self.blocks[target].set(offset, fill) {
                self.len += 1;
            }
        }
        self.blocks[target].slot_mut(offset)
    }
}

impl<V> Extend<(u64, V)> for VectorSkipList<V>
where
    V: Copy,
{
    #[inline]
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = (u64, V)>,
    {
        for (index, value) in iter {
            self.set(index, value);
        }
    }
}

impl<V> fmt::Debug for VectorSkipList<V>
where
    V: Copy + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        let mut node = self.blocks[HEAD].right(0);
        while node != TAIL {
            let block = &self.blocks[node];
            let mut bitmap = block.bitmap;
            while bitmap != 0 {
                let offset = bits::ctz32(bitmap) as usize;
                bitmap &= bitmap - 1;
                map.entry(
                    &(block.base + offset as u64),
                    block.get(offset).unwrap_or(&self.invalid),
                );
            }
            node = block.right(0);
        }
        map.finish()
    }
}

// ////////////////////////////////////////////////////////////////////////////
// Tests
// ////////////////////////////////////////////////////////////////////////////
