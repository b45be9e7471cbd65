// Copyright (c) 2026 rezky_nightky

pub trait Reset {
    fn reset(&mut self);
}

// Slot index plus the generation it was handed out in. A handle to a
// released slot stops resolving once the slot is reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    pub index: usize,
    pub generation: u32,
}

#[derive(Debug)]
struct Slot<T> {
    item: T,
    generation: u32,
    live: bool,
}

#[derive(Debug)]
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T: Default + Reset> Pool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&mut self) -> Handle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.item.reset();
            slot.generation = slot.generation.wrapping_add(1);
            slot.live = true;
            return Handle {
                index,
                generation: slot.generation,
            };
        }

        self.slots.push(Slot {
            item: T::default(),
            generation: 0,
            live: true,
        });
        Handle {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    pub fn release(&mut self, h: Handle) -> bool {
        match self.slots.get_mut(h.index) {
            Some(slot) if slot.live && slot.generation == h.generation => {
                slot.live = false;
                self.free.push(h.index);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, h: Handle) -> Option<&T> {
        self.slots
            .get(h.index)
            .filter(|s| s.live && s.generation == h.generation)
            .map(|s| &s.item)
    }

    pub fn get_mut(&mut self, h: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(h.index)
            .filter(|s| s.live && s.generation == h.generation)
            .map(|s| &mut s.item)
    }

    pub fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn allocated(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Debug)]
    struct Node {
        text: String,
        resets: u32,
    }

    impl Reset for Node {
        fn reset(&mut self) {
            self.text.clear();
            self.resets += 1;
        }
    }

    #[test]
    fn released_slot_is_reused_and_wiped() {
        let mut pool: Pool<Node> = Pool::new();
        let a = pool.acquire();
        pool.get_mut(a).unwrap().text.push_str("old profile");
        assert!(pool.release(a));

        let b = pool.acquire();
        assert_eq!(b.index, a.index);
        assert_ne!(b.generation, a.generation);
        assert_eq!(pool.allocated(), 1);
        let node = pool.get(b).unwrap();
        assert!(node.text.is_empty());
        assert_eq!(node.resets, 1);
    }

    #[test]
    fn stale_handle_does_not_resolve() {
        let mut pool: Pool<Node> = Pool::new();
        let a = pool.acquire();
        pool.release(a);
        let _b = pool.acquire();
        assert!(pool.get(a).is_none());
        assert!(!pool.release(a));
    }

    #[test]
    fn live_counts_only_acquired_slots() {
        let mut pool: Pool<Node> = Pool::new();
        let hs: Vec<_> = (0..4).map(|_| pool.acquire()).collect();
        pool.release(hs[1]);
        pool.release(hs[3]);
        assert_eq!(pool.live(), 2);
        assert_eq!(pool.allocated(), 4);
        assert!(pool.get(hs[0]).is_some() && pool.get(hs[1]).is_none());
    }
}
