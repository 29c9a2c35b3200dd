/// A record that can be built field by field.
///
/// Implemented by `#[derive(Staged)]`. The associated builder is the
/// empty state: every field slot is [`Absent`](crate::Absent).
pub trait Staged: Sized {
    /// The builder with no field set.
    type Builder;

    /// Returns an empty builder.
    fn builder() -> Self::Builder;
}

/// A builder state from which the record can be produced.
///
/// Only the state where every field is [`Present`](crate::Present)
/// implements this trait, so a bound on `Finalize` is a static proof that
/// nothing is missing.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be finalized yet",
    label = "some fields of this builder are still absent",
    note = "call the setter of every field before finalizing"
)]
pub trait Finalize {
    /// The completed record.
    type Output;

    /// Consumes the builder and returns the record.
    fn finalize(self) -> Self::Output;
}

/// Finalizes a fully-populated builder.
///
/// Equivalent to calling [`Finalize::finalize`]; handy in generic code that
/// only holds a `B: Finalize`.
#[inline]
pub fn finalize<B: Finalize>(builder: B) -> B::Output {
    builder.finalize()
}
