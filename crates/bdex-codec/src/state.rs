use crate::error::{CodecError, Result};

/// The two states of a stream.
///
/// `Invalid` is terminal: nothing moves a stream back to `Valid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Validity {
    #[default]
    Valid,
    Invalid,
}

impl Validity {
    pub fn is_valid(self) -> bool {
        self == Validity::Valid
    }
}

/// Validity flag plus the cause that cleared it.
#[derive(Debug, Default)]
pub(crate) struct StreamState {
    validity: Validity,
    failure: Option<CodecError>,
}

impl StreamState {
    pub(crate) fn validity(&self) -> Validity {
        self.validity
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.validity.is_valid()
    }

    pub(crate) fn failure(&self) -> Option<&CodecError> {
        self.failure.as_ref()
    }

    /// Move to `Invalid`, keeping the first cause.
    pub(crate) fn fail(&mut self, err: CodecError) {
        if self.validity.is_valid() {
            self.validity = Validity::Invalid;
            self.failure = Some(err);
        }
    }

    pub(crate) fn into_result(self) -> Result<()> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
