//! The join of the procedures of a session
//!
//! A [`Join`] counts the procedures that are not yet resolved and folds their results into one
//! aggregate result. The stored callback is called with the aggregate result when the count
//! returns to zero.

/// The state of the callback
enum State<F> {
    Open(F),
    Fired,
}

pub(crate) struct Join<F, E> {
    outstanding: usize,
    first_error: Option<E>,
    state: State<F>,
}

impl<F, E> Join<F, E>
where
    F: FnOnce(Result<(), E>),
{
    pub fn new(callback: F) -> Self {
        Join {
            outstanding: 0,
            first_error: None,
            state: State::Open(callback),
        }
    }

    /// Add a procedure to the join
    ///
    /// This must be called before the command of the procedure is sent.
    pub fn add(&mut self) {
        if let State::Open(_) = self.state {
            self.outstanding += 1;
        }
    }

    /// Get the number of procedures not yet resolved
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Check if no error has been folded into the aggregate result
    pub fn is_ok(&self) -> bool {
        self.first_error.is_none()
    }

    pub fn is_fired(&self) -> bool {
        matches!(self.state, State::Fired)
    }

    /// Resolve a procedure
    ///
    /// Only the first error is kept, later errors are discarded. The callback is called once the
    /// last outstanding procedure is resolved. Resolving after the callback was called does
    /// nothing.
    pub fn resolve(&mut self, result: Result<(), E>) {
        if self.is_fired() || self.outstanding == 0 {
            return;
        }

        self.outstanding -= 1;

        if let (Err(e), None) = (result, &self.first_error) {
            self.first_error = Some(e);
        }

        if self.outstanding == 0 {
            self.finish();
        }
    }

    /// Call the callback with the aggregate result
    ///
    /// Procedures that are still outstanding are abandoned.
    pub fn finish(&mut self) {
        let result = match self.first_error.take() {
            None => Ok(()),
            Some(e) => Err(e),
        };

        self.fire(result)
    }

    /// Call the callback with `result` instead of the aggregate result
    ///
    /// This does nothing if the callback was already called.
    pub fn fire(&mut self, result: Result<(), E>) {
        if let State::Open(callback) = core::mem::replace(&mut self.state, State::Fired) {
            self.outstanding = 0;

            callback(result)
        }
    }
}
