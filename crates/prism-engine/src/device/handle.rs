use std::fmt;
use std::num::NonZeroU32;

/// Driver-issued identifier for a vertex array, buffer, shader stage or program.
///
/// Exactly one owner at a time: the type is neither `Clone` nor `Copy`, so a
/// handle can only change hands by move. "Not created / already destroyed" is
/// expressed as `Option<RawHandle>::None`, never as a zero value, so driver
/// calls on an absent object do not type-check.
#[derive(PartialEq, Eq, Hash)]
pub struct RawHandle(NonZeroU32);

impl RawHandle {
    /// Wraps a driver id. Returns `None` for zero, which drivers reserve for "no object".
    #[inline]
    pub fn new(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    /// The raw id, for backend lookup tables and labels.
    #[inline]
    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl fmt::Debug for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic id source shared by backends.
///
/// Ids are never reused within a device's lifetime, so a stale id can only miss
/// a lookup, never alias a newer object.
#[derive(Debug)]
pub struct HandleAllocator {
    next: u32,
}

impl HandleAllocator {
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Issues the next handle, or `None` once the id space is exhausted.
    pub fn allocate(&mut self) -> Option<RawHandle> {
        let handle = RawHandle::new(self.next)?;
        self.next = self.next.checked_add(1).unwrap_or(0);
        Some(handle)
    }
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::new()
    }
}
