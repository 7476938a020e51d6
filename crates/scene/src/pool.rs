//! Slab pool for membership ref nodes.
//!
//! Grows in fixed-size blocks and recycles slots through an internal free
//! list; memory is held until the pool itself is dropped. The outstanding
//! count doubles as a leak detector: registry teardown asserts it reaches
//! zero once every object has been detached.

/// Slots added per growth step.
pub const BLOCK_SIZE: usize = 4096;

enum Slot<T> {
    Free { next: Option<u32> },
    Occupied(T),
}

/// Generic free-list slab allocator handing out stable `u32` indices.
pub struct SlabPool<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    live: usize,
}

impl<T> SlabPool<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            live: 0,
        }
    }

    /// Store `value`, growing the slab by one block when the free list is
    /// empty. Returns the slot index.
    pub fn alloc(&mut self, value: T) -> u32 {
        if self.free_head.is_none() {
            self.grow();
        }
        let idx = self.free_head.expect("grow() must refill the free list");
        match self.slots[idx as usize] {
            Slot::Free { next } => self.free_head = next,
            Slot::Occupied(_) => unreachable!("free list pointed at an occupied slot"),
        }
        self.slots[idx as usize] = Slot::Occupied(value);
        self.live += 1;
        idx
    }

    /// Return a slot to the free list, yielding its value.
    /// Panics when the slot is already free (double-free is a programmer
    /// error, same as a dangling ref).
    pub fn free(&mut self, idx: u32) -> T {
        let slot = std::mem::replace(
            &mut self.slots[idx as usize],
            Slot::Free {
                next: self.free_head,
            },
        );
        match slot {
            Slot::Occupied(value) => {
                self.free_head = Some(idx);
                self.live -= 1;
                value
            }
            Slot::Free { .. } => panic!("double free of pool slot {idx}"),
        }
    }

    pub fn get(&self, idx: u32) -> &T {
        match &self.slots[idx as usize] {
            Slot::Occupied(value) => value,
            Slot::Free { .. } => panic!("access to freed pool slot {idx}"),
        }
    }

    pub fn get_mut(&mut self, idx: u32) -> &mut T {
        match &mut self.slots[idx as usize] {
            Slot::Occupied(value) => value,
            Slot::Free { .. } => panic!("access to freed pool slot {idx}"),
        }
    }

    /// Number of occupied slots.
    pub fn live(&self) -> usize {
        self.live
    }

    /// Total slots across all blocks.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of blocks grown so far.
    pub fn blocks(&self) -> usize {
        self.slots.len() / BLOCK_SIZE
    }

    fn grow(&mut self) {
        let base = self.slots.len() as u32;
        self.slots.reserve(BLOCK_SIZE);
        for i in 0..BLOCK_SIZE as u32 {
            // Chain every new slot onto the free list, LIFO.
            self.slots.push(Slot::Free {
                next: self.free_head,
            });
            self.free_head = Some(base + i);
        }
        tracing::trace!(blocks = self.blocks(), "ref pool grew by one block");
    }
}

impl<T> Default for SlabPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for SlabPool<T> {
    fn drop(&mut self) {
        if self.live != 0 {
            // A panic here would abort during unwinding; log instead.
            tracing::error!(outstanding = self.live, "ref pool dropped with live nodes");
        }
    }
}
