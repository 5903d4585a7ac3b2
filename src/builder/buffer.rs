//! The growable value buffer shared by every typed builder.

/// A vector with an explicit geometric growth policy.
///
/// When an append would exceed the current capacity, the capacity becomes
/// `max(needed, capacity * 3 / 2)`, or at least 3 when the capacity is 0 or 1.
/// `into_vec` trims the allocation to the logical length.
#[derive(Debug, Clone)]
pub struct GrowableBuffer<T> {
    data: Vec<T>,
    capacity: usize,
}

impl<T: Clone> GrowableBuffer<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn ensure_room(&mut self, additional: usize) {
        let needed = self.data.len() + additional;
        if needed <= self.capacity {
            return;
        }
        let geometric = if self.capacity > 1 {
            self.capacity * 3 / 2
        } else {
            3
        };
        let new_capacity = needed.max(geometric);
        self.data.reserve_exact(new_capacity - self.data.len());
        self.capacity = new_capacity;
    }

    #[inline]
    pub fn push(&mut self, value: T) {
        self.ensure_room(1);
        self.data.push(value);
    }

    pub fn extend_from_slice(&mut self, values: &[T]) {
        self.ensure_room(values.len());
        self.data.extend_from_slice(values);
    }

    /// Appends `count` copies of `value`.
    pub fn push_repeated(&mut self, value: T, count: usize) {
        self.ensure_room(count);
        self.data.resize(self.data.len() + count, value);
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    pub fn into_vec(mut self) -> Vec<T> {
        self.data.shrink_to_fit();
        self.data
    }
}
