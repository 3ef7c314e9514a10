//! Falling tiles and the slot arena that recycles them
//!
//! Tiles are spawned and consumed several times a second, so they live in a
//! fixed set of slots addressed by generational handles. A freed slot goes on
//! a free list and is reused by the next spawn; a stale handle to a reused
//! slot no longer resolves.

use serde::{Deserialize, Serialize};

/// A fixed-height rectangle falling down one lane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub lane: usize,
    /// Top edge (dp, grows downward)
    pub y: f32,
}

impl Tile {
    pub fn new(lane: usize, y: f32) -> Self {
        Self { lane, y }
    }

    pub fn bottom(&self, height: f32) -> f32 {
        self.y + height
    }

    pub fn center_y(&self, height: f32) -> f32 {
        self.y + height / 2.0
    }

    /// Whether a vertical position lies on the tile body (edges inclusive)
    pub fn contains_y(&self, y: f32, height: f32) -> bool {
        y >= self.y && y <= self.bottom(height)
    }
}

/// Stable reference to a live tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    tile: Option<Tile>,
}

#[derive(Debug, Clone)]
pub struct TileArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl Default for TileArena {
    fn default() -> Self {
        Self::with_capacity(crate::consts::TILE_POOL_CAPACITY)
    }
}

impl TileArena {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::with_capacity(capacity),
            live: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots ever allocated (live + free)
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn insert(&mut self, tile: Tile) -> TileHandle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.tile = Some(tile);
            return TileHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        if self.slots.len() == self.slots.capacity() {
            log::debug!("Tile arena growing past {} slots", self.slots.len());
        }
        self.slots.push(Slot {
            generation: 0,
            tile: Some(tile),
        });
        TileHandle {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, handle: TileHandle) -> Option<&Tile> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.tile.as_ref())
    }

    pub fn get_mut(&mut self, handle: TileHandle) -> Option<&mut Tile> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.tile.as_mut())
    }

    /// Release a tile's slot back to the free list
    pub fn remove(&mut self, handle: TileHandle) -> Option<Tile> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let tile = slot.tile.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        Some(tile)
    }

    /// Release every live tile; slots stay allocated for reuse
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.tile.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.live = 0;
    }

    /// Live tiles in slot order
    pub fn iter(&self) -> impl Iterator<Item = (TileHandle, &Tile)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.tile.as_ref().map(|tile| {
                (
                    TileHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    tile,
                )
            })
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (TileHandle, &mut Tile)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.tile.as_mut().map(|tile| {
                (
                    TileHandle {
                        index: index as u32,
                        generation,
                    },
                    tile,
                )
            })
        })
    }

    pub fn in_lane(&self, lane: usize) -> impl Iterator<Item = (TileHandle, &Tile)> {
        self.iter().filter(move |(_, tile)| tile.lane == lane)
    }
}
