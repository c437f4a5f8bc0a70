//! Generic slot+generation table backing the DCB, ACB and PCB tables.
//!
//! Entries are addressed by `u64` keys that encode a slot index and a
//! generation. Removing an entry bumps its slot's generation, so every
//! copy of the old key becomes detectably stale instead of silently
//! resolving to whatever is stored in the slot next.

/// Key encoding: upper 32 bits = slot index, lower 32 bits = generation.
fn encode(slot: u32, generation: u32) -> u64 {
    ((slot as u64) << 32) | (generation as u64)
}

fn decode(key: u64) -> (u32, u32) {
    let slot = (key >> 32) as u32;
    let generation = key as u32;
    (slot, generation)
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    data: Option<T>,
}

/// A slot+generation table mapping `u64` keys to owned entries.
///
/// Reuses slots via a free list. A slot whose generation wraps is
/// retired rather than recycled.
#[derive(Debug)]
pub(crate) struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    len: usize,
}

impl<T> HandleTable<T> {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Insert an entry and return its key.
    pub fn insert(&mut self, value: T) -> u64 {
        self.len += 1;
        if let Some(slot_idx) = self.free_list.pop() {
            let slot = &mut self.slots[slot_idx as usize];
            slot.data = Some(value);
            encode(slot_idx, slot.generation)
        } else {
            let slot_idx = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                data: Some(value),
            });
            encode(slot_idx, 0)
        }
    }

    /// The entry behind `key`, or `None` if the key is stale or was
    /// never issued.
    pub fn get(&self, key: u64) -> Option<&T> {
        let (slot_idx, generation) = decode(key);
        let slot = self.slots.get(slot_idx as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.data.as_ref()
    }

    /// Mutable access to the entry behind `key`.
    pub fn get_mut(&mut self, key: u64) -> Option<&mut T> {
        let (slot_idx, generation) = decode(key);
        let slot = self.slots.get_mut(slot_idx as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.data.as_mut()
    }

    /// Whether `key` resolves to a live entry.
    pub fn contains(&self, key: u64) -> bool {
        self.get(key).is_some()
    }

    /// Remove the entry behind `key`, returning it.
    ///
    /// Double removal returns `None`.
    pub fn remove(&mut self, key: u64) -> Option<T> {
        let (slot_idx, generation) = decode(key);
        let slot = self.slots.get_mut(slot_idx as usize)?;
        if slot.generation != generation {
            return None;
        }
        let value = slot.data.take()?;
        self.len -= 1;
        slot.generation = slot.generation.wrapping_add(1);
        // A wrapped generation would collide with keys issued in epoch 0.
        if slot.generation != 0 {
            self.free_list.push(slot_idx);
        }
        Some(value)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Live entries with their keys, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &T)> {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            slot.data
                .as_ref()
                .map(|data| (encode(idx as u32, slot.generation), data))
        })
    }
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
