use crate::board::Player;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

/// Cached value of a completed subtree. Only a value, no move: entries are
/// used for cutoffs, never to pick what to play.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry {
    pub key: u64,
    pub depth: u32,
    pub side: Player,
    pub score: i32,
    pub bound: Bound,
}

impl Entry {
    fn matches(&self, key: u64, depth: u32, side: Player) -> bool {
        self.key == key && self.depth == depth && self.side == side
    }
}

const DEFAULT_WAYS: usize = 4;

#[derive(Default, Clone, Copy)]
struct Bucket {
    slots: [Option<Entry>; DEFAULT_WAYS],
}

/// Set-associative table keyed by (board signature, depth, side to move).
/// Lives for one top-level search.
#[derive(Default)]
pub struct Tt {
    buckets: Vec<Bucket>,
}

impl Tt {
    pub fn new() -> Self { Self { buckets: Vec::new() } }

    pub fn with_capacity_entries(cap: usize) -> Self {
        let mut t = Self::new();
        t.set_capacity_entries(cap);
        t
    }

    pub fn clear(&mut self) {
        for b in &mut self.buckets { *b = Bucket::default(); }
    }

    fn bucket_index(&self, key: u64, depth: u32, side: Player) -> usize {
        let mixed = key ^ (key >> 32) ^ ((depth as u64) << 1) ^ side.index() as u64;
        (mixed as usize) % self.buckets.len().max(1)
    }

    pub fn get(&self, key: u64, depth: u32, side: Player) -> Option<Entry> {
        if self.buckets.is_empty() { return None; }
        let b = &self.buckets[self.bucket_index(key, depth, side)];
        b.slots.iter().flatten().find(|e| e.matches(key, depth, side)).copied()
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.slots.iter().filter(|s| s.is_some()).count()).sum()
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn set_capacity_entries(&mut self, cap: usize) {
        let entries = cap.max(DEFAULT_WAYS);
        let buckets = (entries + DEFAULT_WAYS - 1) / DEFAULT_WAYS;
        self.buckets.clear();
        self.buckets.resize_with(buckets, Bucket::default);
    }

    pub fn put(&mut self, e: Entry) {
        if self.buckets.is_empty() { return; }
        let idx = self.bucket_index(e.key, e.depth, e.side);
        let b = &mut self.buckets[idx];
        // Same key: exact results are never downgraded to a bound
        for slot in &mut b.slots {
            if let Some(cur) = *slot {
                if cur.matches(e.key, e.depth, e.side) {
                    if e.bound == Bound::Exact || cur.bound != Bound::Exact { *slot = Some(e); }
                    return;
                }
            }
        }
        if let Some(slot) = b.slots.iter_mut().find(|s| s.is_none()) {
            *slot = Some(e);
            return;
        }
        // Replace shallowest
        let mut victim = 0usize;
        let mut lowest = u32::MAX;
        for (i, slot) in b.slots.iter().enumerate() {
            if let Some(cur) = slot {
                if cur.depth < lowest { lowest = cur.depth; victim = i; }
            }
        }
        b.slots[victim] = Some(e);
    }
}
