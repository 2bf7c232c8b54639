//! Splits an interface description into read and write partitions

use super::{Interface, InterfaceEntry};

/// Callable entries partitioned by mutability
#[derive(Debug, Clone, Default)]
pub struct Partitions {
    /// view/pure functions
    pub read: Vec<InterfaceEntry>,
    /// nonpayable/payable functions
    pub write: Vec<InterfaceEntry>,
}

impl Partitions {
    pub fn len(&self) -> usize {
        self.read.len() + self.write.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read.is_empty() && self.write.is_empty()
    }
}

/// Partition the function entries of `interface`. Events, constructors and
/// other non-function entries are dropped.
pub fn format_interface(interface: &Interface) -> Partitions {
    let mut partitions = Partitions::default();
    for entry in interface.entries().iter().filter(|e| e.is_function()) {
        if entry.state_mutability.is_read_only() {
            partitions.read.push(entry.clone());
        } else {
            partitions.write.push(entry.clone());
        }
    }
    partitions
}
