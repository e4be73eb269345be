/// Fixed-capacity sample history, most recent first.
///
/// Pushing a new value overwrites the oldest one; `get(0)` is always the value
/// pushed last. A zero-capacity history accepts pushes and stores nothing.
#[derive(Debug, Clone)]
pub(crate) struct History {
    values: Vec<f64>,
    head: usize,
}

impl History {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            values: vec![0.0; capacity],
            head: 0,
        }
    }

    pub(crate) fn fill(&mut self, value: f64) {
        self.values.fill(value);
        self.head = 0;
    }

    pub(crate) fn push(&mut self, value: f64) {
        let len = self.values.len();
        if len == 0 {
            return;
        }
        self.head = (self.head + len - 1) % len;
        self.values[self.head] = value;
    }

    /// Value pushed `age` pushes ago. `age` must be below the capacity.
    pub(crate) fn get(&self, age: usize) -> f64 {
        self.values[(self.head + age) % self.values.len()]
    }
}
