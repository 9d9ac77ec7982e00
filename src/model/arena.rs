//! Generational slot storage for nodes and links.
//!
//! Freed slots are reused, but every reuse bumps the slot generation, so a
//! handle taken before a removal never resolves to the element that later
//! occupies the same slot.

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot vector with a free list.
#[derive(Debug, Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<T> Arena<T> {
    /// Store a value, returning its `(index, generation)` pair
    pub(crate) fn insert(&mut self, value: T) -> (u32, u32) {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return (index, slot.generation);
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        (index, 0)
    }

    pub(crate) fn get(&self, index: u32, generation: u32) -> Option<&T> {
        self.slots
            .get(index as usize)
            .filter(|slot| slot.generation == generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub(crate) fn get_mut(&mut self, index: u32, generation: u32) -> Option<&mut T> {
        self.slots
            .get_mut(index as usize)
            .filter(|slot| slot.generation == generation)
            .and_then(|slot| slot.value.as_mut())
    }

    pub(crate) fn remove(&mut self, index: u32, generation: u32) -> Option<T> {
        let slot = self.slots.get_mut(index as usize)?;
        if slot.generation != generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        self.len -= 1;
        Some(value)
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Iterate occupied slots in slot order as `(index, generation, value)`
    pub(crate) fn iter(&self) -> impl Iterator<Item = (u32, u32, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|value| (index as u32, slot.generation, value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removed_slot_is_not_resolved_after_reuse() {
        let mut arena = Arena::default();
        let (index, generation) = arena.insert("a");
        assert_eq!(arena.remove(index, generation), Some("a"));

        let (reused, new_generation) = arena.insert("b");
        assert_eq!(reused, index);
        assert_ne!(new_generation, generation);
        assert!(arena.get(index, generation).is_none());
        assert_eq!(arena.get(reused, new_generation), Some(&"b"));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_iteration_skips_free_slots() {
        let mut arena = Arena::default();
        let first = arena.insert(1);
        arena.insert(2);
        arena.insert(3);
        arena.remove(first.0, first.1);

        let values: Vec<i32> = arena.iter().map(|(_, _, value)| *value).collect();
        assert_eq!(values, vec![2, 3]);
    }
}
