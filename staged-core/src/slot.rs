//! Per-field presence slots.
//!
//! A generated builder stores every field of its record in a slot whose
//! *type* says whether a value is there. `Absent<T>` holds nothing and has
//! no size; `Present<T>` holds exactly one `T`. Because the state lives in
//! the type, the compiler's drop glue releases precisely the present fields
//! when a builder goes out of scope, and nothing ever inspects a flag at
//! runtime.

use core::fmt;
use core::marker::PhantomData;

mod sealed {
    pub trait Sealed {}
}

/// The presence state of one field slot holding a `T`.
///
/// This trait is sealed: [`Absent`] and [`Present`] are its only
/// implementors, so a builder's state parameters can never be anything else.
pub trait Slot<T>: sealed::Sealed {
    /// Whether this slot holds a value.
    const PRESENT: bool;

    /// Moves the value out, if there is one.
    fn into_option(self) -> Option<T>;
}

/// A slot that does not hold a value yet.
///
/// Zero-sized. The marker is `fn() -> T` so that an absent slot neither owns
/// a `T` for drop-check purposes nor restricts the builder's auto traits.
pub struct Absent<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Absent<T> {
    /// Creates an empty slot.
    #[inline]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    /// Consumes the empty slot and returns one holding `value`.
    #[inline]
    pub fn fill(self, value: T) -> Present<T> {
        Present { value }
    }
}

impl<T> Default for Absent<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Absent<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Absent<T> {}

impl<T> fmt::Debug for Absent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Absent")
    }
}

impl<T> sealed::Sealed for Absent<T> {}

impl<T> Slot<T> for Absent<T> {
    const PRESENT: bool = false;

    #[inline]
    fn into_option(self) -> Option<T> {
        None
    }
}

/// A slot holding a constructed value.
#[repr(transparent)]
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Present<T> {
    value: T,
}

impl<T> Present<T> {
    /// Moves the value out of the slot.
    #[inline]
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Borrows the value.
    #[inline]
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Mutably borrows the value.
    ///
    /// The slot stays present: replacing the value in place is allowed, only
    /// the absent/present state is fixed.
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for Present<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Present").field(&self.value).finish()
    }
}

impl<T> sealed::Sealed for Present<T> {}

impl<T> Slot<T> for Present<T> {
    const PRESENT: bool = true;

    #[inline]
    fn into_option(self) -> Option<T> {
        Some(self.value)
    }
}
