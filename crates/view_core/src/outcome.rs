/// Instantaneous status of an asynchronous dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncOutcome<T, E> {
    Pending,
    Rejected(E),
    Ready(T),
}

impl<T, E> AsyncOutcome<T, E> {
    pub fn is_pending(&self) -> bool {
        matches!(self, AsyncOutcome::Pending)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, AsyncOutcome::Ready(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, AsyncOutcome::Rejected(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            AsyncOutcome::Ready(value) => Some(value),
            _ => None,
        }
    }
}

impl<T, E> From<Result<T, E>> for AsyncOutcome<T, E> {
    fn from(value: Result<T, E>) -> Self {
        match value {
            Ok(value) => AsyncOutcome::Ready(value),
            Err(err) => AsyncOutcome::Rejected(err),
        }
    }
}
