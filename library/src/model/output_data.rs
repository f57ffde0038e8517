//! Auxiliary side-channel data attached to an output.

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;

/// Side-channel object owned by one output (per symbol child and per live slot).
///
/// Created once from the output definition's [`OutputDataFactory`].
pub trait OutputData: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub type OutputDataFactory = fn() -> Box<dyn OutputData>;

impl dyn OutputData {
    pub fn downcast_ref<T: OutputData>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: OutputData>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Ring buffer of the most recent float values produced by an output.
#[derive(Debug, Clone)]
pub struct RecordedValues {
    capacity: usize,
    values: VecDeque<f64>,
}

impl RecordedValues {
    pub const DEFAULT_CAPACITY: usize = 64;

    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            values: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn factory() -> Box<dyn OutputData> {
        Box::new(RecordedValues::new(Self::DEFAULT_CAPACITY))
    }
}

impl OutputData for RecordedValues {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_values_drop_oldest() {
        let mut rec = RecordedValues::new(2);
        rec.push(1.0);
        rec.push(2.0);
        rec.push(3.0);
        assert_eq!(rec.values().collect::<Vec<_>>(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_downcast_through_trait_object() {
        let mut data = RecordedValues::factory();
        data.downcast_mut::<RecordedValues>().unwrap().push(4.0);
        assert_eq!(data.downcast_ref::<RecordedValues>().unwrap().len(), 1);
    }
}
