///
/// Slot
///
/// Single-value property storage: the value plus an explicit is-set flag.
/// Both change together.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Slot<T> {
    value: T,
    set: bool,
}

impl<T> Slot<T> {
    pub const fn new(value: T) -> Self {
        Self { value, set: false }
    }

    pub const fn get(&self) -> &T {
        &self.value
    }

    pub const fn is_set(&self) -> bool {
        self.set
    }

    /// Store a value, returning the previous one.
    pub fn update(&mut self, value: T, set: bool) -> T {
        self.set = set;

        std::mem::replace(&mut self.value, value)
    }

    /// Back to `default`, not set.
    pub fn reset(&mut self, default: T) {
        self.value = default;
        self.set = false;
    }
}
