use crate::error::{CertificateError, CertificateResult};

/// Outcome of probing a buffer for one encoding
///
/// `NoMatch` means the buffer is simply not in this encoding and the next
/// strategy should run. `Failed` means the encoding was recognized but the
/// contents are unusable, which ends decoding.
#[derive(Debug)]
pub(crate) enum Sniff<T> {
    Matched(T),
    NoMatch,
    Failed(CertificateError),
}

impl<T> Sniff<T> {
    pub(crate) fn map<U>(self, f: impl FnOnce(T) -> U) -> Sniff<U> {
        match self {
            Sniff::Matched(value) => Sniff::Matched(f(value)),
            Sniff::NoMatch => Sniff::NoMatch,
            Sniff::Failed(err) => Sniff::Failed(err),
        }
    }

    /// Continue a matched value through a fallible step. Errors from `f` are
    /// hard failures since the encoding was already recognized.
    pub(crate) fn and_then<U>(self, f: impl FnOnce(T) -> CertificateResult<U>) -> Sniff<U> {
        match self {
            Sniff::Matched(value) => match f(value) {
                Ok(next) => Sniff::Matched(next),
                Err(err) => Sniff::Failed(err),
            },
            Sniff::NoMatch => Sniff::NoMatch,
            Sniff::Failed(err) => Sniff::Failed(err),
        }
    }

    /// Hard failures become `Err`, so callers can use `?` and fall through on `None`
    pub(crate) fn into_result(self) -> CertificateResult<Option<T>> {
        match self {
            Sniff::Matched(value) => Ok(Some(value)),
            Sniff::NoMatch => Ok(None),
            Sniff::Failed(err) => Err(err),
        }
    }
}

impl<T> From<CertificateResult<Option<T>>> for Sniff<T> {
    fn from(result: CertificateResult<Option<T>>) -> Self {
        match result {
            Ok(Some(value)) => Sniff::Matched(value),
            Ok(None) => Sniff::NoMatch,
            Err(err) => Sniff::Failed(err),
        }
    }
}
