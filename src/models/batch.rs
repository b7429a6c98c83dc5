use super::{SequenceNo, WorkItem};

/// An order-preserving group of work items.
///
/// `cost` is the summed estimator output over every field of every item. It stays
/// within the configured budget except for a singleton whose only item is itself
/// over budget.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Position of this batch in the global batch sequence
    pub index: usize,
    pub items: Vec<WorkItem>,
    pub cost: usize,
}

impl Batch {
    pub fn new(index: usize, items: Vec<WorkItem>, cost: usize) -> Self {
        Self { index, items, cost }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn sequence_nos(&self) -> Vec<SequenceNo> {
        self.items.iter().map(WorkItem::sequence_no).collect()
    }

    /// True for the tolerated case of a single item exceeding the budget
    pub fn is_oversized(&self, max_cost: usize) -> bool {
        self.cost > max_cost
    }

    /// Texts of the field at `position` across all items, in item order
    pub fn texts_for(&self, position: usize) -> Vec<String> {
        self.items
            .iter()
            .map(|item| item.text(position).unwrap_or_default().to_string())
            .collect()
    }
}

/// Batches bound to one worker slot, in the order they were produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerAssignment {
    pub worker_id: usize,
    pub batches: Vec<Batch>,
}

impl WorkerAssignment {
    pub fn new(worker_id: usize) -> Self {
        Self {
            worker_id,
            batches: Vec::new(),
        }
    }

    pub fn item_count(&self) -> usize {
        self.batches.iter().map(Batch::len).sum()
    }

    pub fn total_cost(&self) -> usize {
        self.batches.iter().map(|b| b.cost).sum()
    }

    pub fn batch_indices(&self) -> Vec<usize> {
        self.batches.iter().map(|b| b.index).collect()
    }
}
