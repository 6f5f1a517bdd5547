use crate::{Result, Value};

/// Behavior shared by every nullable wrapper.
///
/// Lets callers fill or read a set of heterogeneous columns through
/// `&mut dyn Generic`.
pub trait Generic {
    /// Whether the wrapper currently holds a value.
    fn valid(&self) -> bool;

    /// Invalidates the wrapper.
    fn reset(&mut self);

    /// Coerces `input` into the wrapper. Rejected input leaves it untouched.
    fn set(&mut self, input: Value) -> Result<()>;

    /// Payload as a [`Value`], or [`Value::Null`] when invalid.
    fn weak(&self) -> Value;

    /// Storable value handed to a data store.
    fn value(&self) -> Value;

    /// Fills the wrapper from a value read out of a data store.
    fn scan(&mut self, input: Value) -> Result<()> {
        self.set(input)
    }
}

/// Scans `values` into `targets` pairwise.
///
/// Stops at the first rejected value; earlier targets keep their new values.
pub fn scan_all<I>(targets: &mut [&mut dyn Generic], values: I) -> Result<()>
where
    I: IntoIterator<Item = Value>,
{
    for (target, value) in targets.iter_mut().zip(values) {
        target.scan(value)?;
    }
    Ok(())
}

/// Collects the storable values of `sources`.
pub fn values_of(sources: &[&dyn Generic]) -> Vec<Value> {
    sources.iter().map(|source| source.value()).collect()
}
