//! Spatial hash grid for short-range neighbor queries.
//!
//! Space is cut into cubic voxels of `voxel_size`. Each voxel's integer
//! coordinate hashes into a fixed-size bucket table, independent of world
//! extent. Distinct voxels may share a bucket, which only over-reports
//! neighbors; equal voxels always share one.

use glam::{IVec3, Vec3};

/// Marks an empty bucket in the offset table
pub const NONE: u32 = u32::MAX;

/// Smallest usable voxel size
pub const MIN_VOXEL_SIZE: f32 = 1e-6;

const P1: u32 = 917_935_420;
const P2: u32 = 659_095_552;
const P3: u32 = 698_673_843;

/// A particle and the bucket its voxel hashes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellEntry {
    pub cell_hash: u32,
    pub particle: u32,
}

#[derive(Debug, Clone)]
pub struct NeighborGrid {
    voxel_size: f32,
    table_size: u32,
    /// Entries sorted by bucket, particle order kept within a bucket
    sorted: Vec<CellEntry>,
    /// Start of each bucket's run in `sorted`, or [`NONE`]
    cell_offsets: Vec<u32>,
    /// Scratch space reused across builds
    cursors: Vec<u32>,
}

impl NeighborGrid {
    /// Create an empty grid. `table_size` should not be a power of two.
    pub fn new(table_size: u32) -> Self {
        let table_size = table_size.max(1);
        Self {
            voxel_size: 1.0,
            table_size,
            sorted: Vec::new(),
            cell_offsets: vec![NONE; table_size as usize],
            cursors: Vec::new(),
        }
    }

    pub fn voxel_size(&self) -> f32 {
        self.voxel_size
    }

    pub fn table_size(&self) -> u32 {
        self.table_size
    }

    /// Number of particles in the grid.
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    pub fn sorted_entries(&self) -> &[CellEntry] {
        &self.sorted
    }

    /// Start of a bucket's run in [`sorted_entries`](Self::sorted_entries).
    pub fn cell_offset(&self, cell_hash: u32) -> Option<u32> {
        self.cell_offsets
            .get(cell_hash as usize)
            .copied()
            .filter(|&offset| offset != NONE)
    }

    /// Number of non-empty buckets.
    pub fn filled_cells(&self) -> usize {
        self.cell_offsets.iter().filter(|&&o| o != NONE).count()
    }

    pub fn cell_coord(&self, position: Vec3) -> IVec3 {
        (position / self.voxel_size).floor().as_ivec3()
    }

    pub fn hash_cell(&self, cell: IVec3) -> u32 {
        let n = (cell.x as u32).wrapping_mul(P1)
            ^ (cell.y as u32).wrapping_mul(P2)
            ^ (cell.z as u32).wrapping_mul(P3);
        n % self.table_size
    }

    pub fn hash_position(&self, position: Vec3) -> u32 {
        self.hash_cell(self.cell_coord(position))
    }

    pub fn clear(&mut self) {
        for entry in &self.sorted {
            self.cell_offsets[entry.cell_hash as usize] = NONE;
        }
        self.sorted.clear();
    }

    /// Rebuild from `positions` with a counting sort over the bucket table.
    ///
    /// A non-positive or non-finite `voxel_size` is raised to
    /// [`MIN_VOXEL_SIZE`].
    pub fn build(&mut self, positions: &[Vec3], voxel_size: f32) {
        self.voxel_size = if voxel_size.is_finite() {
            voxel_size.max(MIN_VOXEL_SIZE)
        } else {
            MIN_VOXEL_SIZE
        };

        let table = self.table_size as usize;
        self.cursors.clear();
        self.cursors.resize(table, 0);

        self.sorted.clear();
        self.sorted.reserve(positions.len());
        for (i, &position) in positions.iter().enumerate() {
            let cell_hash = self.hash_position(position);
            self.cursors[cell_hash as usize] += 1;
            self.sorted.push(CellEntry {
                cell_hash,
                particle: i as u32,
            });
        }

        // Counts become run starts
        let mut running = 0u32;
        for (offset, cursor) in self.cell_offsets.iter_mut().zip(self.cursors.iter_mut()) {
            let count = *cursor;
            if count == 0 {
                *offset = NONE;
            } else {
                *offset = running;
                *cursor = running;
                running += count;
            }
        }

        let unsorted = std::mem::take(&mut self.sorted);
        self.sorted = vec![CellEntry::default(); unsorted.len()];
        for entry in unsorted {
            let slot = &mut self.cursors[entry.cell_hash as usize];
            self.sorted[*slot as usize] = entry;
            *slot += 1;
        }
    }

    /// Particles in the 27 voxels around `position`. Lazy and cloneable;
    /// each particle is yielded at most once even when voxels share a bucket.
    pub fn neighbors_of(&self, position: Vec3) -> Neighbors<'_> {
        Neighbors {
            grid: self,
            center: self.cell_coord(position),
            next_cell: 0,
            visited: [NONE; 27],
            visited_len: 0,
            run_hash: NONE,
            run_pos: 0,
        }
    }
}

/// Iterator returned by [`NeighborGrid::neighbors_of`].
#[derive(Debug, Clone)]
pub struct Neighbors<'a> {
    grid: &'a NeighborGrid,
    center: IVec3,
    next_cell: usize,
    visited: [u32; 27],
    visited_len: usize,
    run_hash: u32,
    run_pos: usize,
}

impl Iterator for Neighbors<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let sorted = &self.grid.sorted;
        loop {
            if self.run_hash != NONE {
                match sorted.get(self.run_pos) {
                    Some(entry) if entry.cell_hash == self.run_hash => {
                        self.run_pos += 1;
                        return Some(entry.particle as usize);
                    }
                    _ => self.run_hash = NONE,
                }
            }

            if self.next_cell >= 27 {
                return None;
            }
            let n = self.next_cell as i32;
            self.next_cell += 1;
            let offset = IVec3::new(n % 3 - 1, (n / 3) % 3 - 1, n / 9 - 1);
            let cell_hash = self.grid.hash_cell(self.center.wrapping_add(offset));

            if self.visited[..self.visited_len].contains(&cell_hash) {
                continue;
            }
            self.visited[self.visited_len] = cell_hash;
            self.visited_len += 1;

            if let Some(start) = self.grid.cell_offset(cell_hash) {
                self.run_hash = cell_hash;
                self.run_pos = start as usize;
            }
        }
    }
}
