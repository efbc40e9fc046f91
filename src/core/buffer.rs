use super::errors::SimulationError;
use super::job::Job;
use super::types::JobId;
use log::{debug, warn};
use serde::Serialize;

/// Where an inserted job landed, and who had to leave to make room
#[derive(Debug)]
pub struct Insertion {
    pub position: usize,
    pub evicted: Option<Job>,
}

/// Returned when no empty slot could be found. The job comes back to the
/// caller together with any job that was evicted before the scan failed.
#[derive(Debug)]
pub struct InsertFailure {
    pub job: Job,
    pub evicted: Option<Job>,
}

/// Read-only view of the ring for display
#[derive(Debug, Clone, Serialize)]
pub struct BufferSnapshot {
    pub slots: Vec<Option<JobId>>,
    pub capacity: usize,
    pub count: usize,
    pub insert_pointer: usize,
    pub oldest_pointer: usize,
}

/// Fixed-size ring of overflow jobs.
///
/// Slots may be sparse after removals, so the insert pointer says nothing
/// about age. "Oldest" is always the minimum arrival time found by a full
/// scan; equal arrival times resolve to the lowest slot index.
#[derive(Debug, Clone)]
pub struct CircularBuffer {
    slots: Vec<Option<Job>>,
    insert_pointer: usize,
    oldest_pointer: usize,
    count: usize,
}

impl CircularBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            insert_pointer: 0,
            oldest_pointer: 0,
            count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.capacity()
    }

    pub fn insert_pointer(&self) -> usize {
        self.insert_pointer
    }

    pub fn oldest_pointer(&self) -> usize {
        self.oldest_pointer
    }

    pub fn slot(&self, position: usize) -> Option<&Job> {
        self.slots.get(position).and_then(|s| s.as_ref())
    }

    /// Place `job` in the first empty slot at or after the insert pointer.
    ///
    /// A full buffer first evicts its oldest job.
    pub fn insert(&mut self, job: Job) -> Result<Insertion, InsertFailure> {
        let evicted = if self.is_full() {
            let oldest = self.remove_oldest();
            if let Some(old) = &oldest {
                warn!("[Buffer] Full, evicting oldest {}", old);
            }
            oldest
        } else {
            None
        };

        match self.find_insertion_position() {
            Some(position) => {
                debug!(
                    "[Buffer] Inserted {} at slot {} ({}/{})",
                    job,
                    position,
                    self.count + 1,
                    self.capacity()
                );
                self.slots[position] = Some(job);
                self.insert_pointer = (position + 1) % self.capacity();
                self.count += 1;
                Ok(Insertion { position, evicted })
            }
            None => Err(InsertFailure { job, evicted }),
        }
    }

    /// Put a previously evicted job back without evicting anything.
    /// Used to undo an eviction whose replacement could not be placed.
    pub fn restore(&mut self, job: Job) -> Result<usize, Job> {
        if self.is_full() {
            return Err(job);
        }
        match self.find_insertion_position() {
            Some(position) => {
                self.slots[position] = Some(job);
                self.count += 1;
                self.oldest_pointer = self.find_oldest_index().unwrap_or(0);
                Ok(position)
            }
            None => Err(job),
        }
    }

    /// Ring scan from the insert pointer: `c, c+1, ..., c-1 (mod capacity)`
    fn find_insertion_position(&self) -> Option<usize> {
        let capacity = self.capacity();
        if capacity == 0 {
            return None;
        }
        let start = self.insert_pointer % capacity;
        (0..capacity)
            .map(|offset| (start + offset) % capacity)
            .find(|&index| self.slots[index].is_none())
    }

    fn find_oldest_index(&self) -> Option<usize> {
        let mut oldest: Option<(usize, f64)> = None;
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(job) = slot {
                match oldest {
                    Some((_, time)) if job.arrived_at >= time => {}
                    _ => oldest = Some((index, job.arrived_at)),
                }
            }
        }
        oldest.map(|(index, _)| index)
    }

    pub fn peek_oldest(&self) -> Option<&Job> {
        self.find_oldest_index().and_then(|index| self.slots[index].as_ref())
    }

    pub fn remove_oldest(&mut self) -> Option<Job> {
        let index = self.find_oldest_index()?;
        let job = self.slots[index].take()?;
        self.count -= 1;
        self.oldest_pointer = self.find_oldest_index().unwrap_or(0);
        Some(job)
    }

    /// Verify `count` against the slot array
    pub fn check_invariants(&self) -> Result<(), SimulationError> {
        let occupied = self.slots.iter().filter(|s| s.is_some()).count();
        if occupied != self.count || self.count > self.capacity() {
            return Err(SimulationError::BufferCorrupted {
                count: self.count,
                occupied,
            });
        }
        Ok(())
    }

    /// Overwrite the occupancy counter without touching the slots
    #[cfg(test)]
    pub(crate) fn force_count(&mut self, count: usize) {
        self.count = count;
    }

    pub fn snapshot(&self) -> BufferSnapshot {
        BufferSnapshot {
            slots: self.slots.iter().map(|s| s.as_ref().map(|j| j.id)).collect(),
            capacity: self.capacity(),
            count: self.count,
            insert_pointer: self.insert_pointer,
            oldest_pointer: self.oldest_pointer,
        }
    }
}

impl std::fmt::Display for CircularBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cells: Vec<String> = self
            .slots
            .iter()
            .enumerate()
            .map(|(i, slot)| match slot {
                Some(job) => format!("[{}: {}]", i, job.id.short()),
                None => format!("[{}: EMPTY]", i),
            })
            .collect();
        write!(f, "{}", cells.join(" | "))
    }
}
