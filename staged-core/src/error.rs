/// Misuse of a checked builder, detected at runtime.
///
/// Typed builders cannot produce these: the operations that would fail do
/// not exist for the offending states. The checked builder trades that
/// guarantee for a runtime presence mask and reports violations here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagedError {
    /// A setter was called for a field that already holds a value.
    ///
    /// The rejected value has been dropped; the original stays in place.
    AlreadySet {
        /// Name of the record being built.
        record: &'static str,
        /// The field that was set twice.
        field: &'static str,
    },

    /// `build` was called while a field was still absent.
    Missing {
        /// Name of the record being built.
        record: &'static str,
        /// The first absent field, in declaration order.
        field: &'static str,
    },
}

impl StagedError {
    /// Name of the record the error refers to.
    pub fn record(&self) -> &'static str {
        match self {
            StagedError::AlreadySet { record, .. } | StagedError::Missing { record, .. } => record,
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            StagedError::AlreadySet { field, .. } | StagedError::Missing { field, .. } => field,
        }
    }
}

impl core::fmt::Display for StagedError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StagedError::AlreadySet { record, field } => {
                write!(f, "field `{field}` of `{record}` is already set")
            }
            StagedError::Missing { record, field } => {
                write!(f, "cannot build `{record}`: field `{field}` was never set")
            }
        }
    }
}

impl core::error::Error for StagedError {}
