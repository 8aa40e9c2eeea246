use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::core::particle::Particle;

/// Handle into the particle pool with generation tracking to prevent stale references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ParticleId {
    pub index: usize,
    pub generation: u32,
}

impl ParticleId {
    pub fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Fixed-size particle pool.
///
/// Every slot is allocated up front and lives for the lifetime of the pool.
/// A slot is either on the free list or handed out; handing a slot back bumps
/// its generation so that handles taken before the release no longer resolve.
#[derive(Debug, Clone)]
pub struct ParticleArena {
    slots: Vec<Particle>,
    generations: Vec<u32>,
    in_use: Vec<bool>,
    free_list: VecDeque<usize>,
}

impl ParticleArena {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![Particle::default(); capacity],
            generations: vec![0; capacity],
            in_use: vec![false; capacity],
            free_list: (0..capacity).collect(),
        }
    }

    /// Pops a slot from the free list, resets it and marks it active.
    pub fn acquire(&mut self) -> Option<ParticleId> {
        let index = self.free_list.pop_front()?;
        self.slots[index] = Particle::default();
        self.slots[index].set_active(true);
        self.in_use[index] = true;
        Some(ParticleId::new(index, self.generations[index]))
    }

    /// Returns a slot to the free list. Stale or already free handles are ignored.
    pub fn release(&mut self, id: ParticleId) -> bool {
        if !self.is_valid(id) {
            return false;
        }
        let index = id.index();
        self.slots[index].set_active(false);
        self.slots[index].clear_force_accumulator();
        self.in_use[index] = false;
        self.generations[index] = self.generations[index].wrapping_add(1);
        self.free_list.push_back(index);
        true
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        if self.is_valid(id) {
            self.slots.get(id.index())
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        if self.is_valid(id) {
            self.slots.get_mut(id.index())
        } else {
            None
        }
    }

    pub fn get2_mut(
        &mut self,
        id_a: ParticleId,
        id_b: ParticleId,
    ) -> Option<(&mut Particle, &mut Particle)> {
        if id_a.index() == id_b.index() {
            return None;
        }

        if !self.is_valid(id_a) || !self.is_valid(id_b) {
            return None;
        }

        let (first, second, flipped) = if id_a.index() < id_b.index() {
            (id_a, id_b, false)
        } else {
            (id_b, id_a, true)
        };

        let (left, right) = self.slots.split_at_mut(second.index());
        let first_slot = left.get_mut(first.index())?;
        let second_slot = right.get_mut(0)?;

        if flipped {
            Some((second_slot, first_slot))
        } else {
            Some((first_slot, second_slot))
        }
    }

    /// True when the handle refers to a handed-out slot of the current generation.
    pub fn is_valid(&self, id: ParticleId) -> bool {
        self.generations
            .get(id.index())
            .copied()
            .map(|gen| gen == id.generation() && self.in_use[id.index()])
            .unwrap_or(false)
    }

    /// True when the handle is valid and the particle has not been deactivated.
    pub fn is_active(&self, id: ParticleId) -> bool {
        self.get(id).map(Particle::is_active).unwrap_or(false)
    }

    /// Mutable view over every slot, handed out or not. Used by the integrator.
    pub fn slots_mut(&mut self) -> &mut [Particle] {
        &mut self.slots
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_hands_out_every_slot_once() {
        let mut arena = ParticleArena::with_capacity(3);
        let ids: Vec<_> = std::iter::from_fn(|| arena.acquire()).collect();

        assert_eq!(ids.len(), 3);
        assert_eq!(arena.free_count(), 0);
        assert!(arena.acquire().is_none());
        assert!(ids.iter().all(|id| arena.is_active(*id)));
    }

    #[test]
    fn released_handle_goes_stale() {
        let mut arena = ParticleArena::with_capacity(1);
        let first = arena.acquire().expect("slot available");
        assert!(arena.release(first));
        assert!(!arena.release(first), "double release must be ignored");

        let second = arena.acquire().expect("slot recycled");
        assert_eq!(first.index(), second.index());
        assert_ne!(first.generation(), second.generation());
        assert!(arena.get(first).is_none());
        assert!(arena.get(second).is_some());
    }

    #[test]
    fn get2_mut_preserves_argument_order() {
        let mut arena = ParticleArena::with_capacity(4);
        let a = arena.acquire().unwrap();
        let b = arena.acquire().unwrap();
        arena.get_mut(a).unwrap().set_mass(2.0);
        arena.get_mut(b).unwrap().set_mass(4.0);

        let (pb, pa) = arena.get2_mut(b, a).expect("distinct handles");
        assert_eq!(pb.mass(), 4.0);
        assert_eq!(pa.mass(), 2.0);
        assert!(arena.get2_mut(a, a).is_none());
    }
}
