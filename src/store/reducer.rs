//! Reducer trait for the store.

/// Reducer transforms state based on actions.
///
/// The reducer is the only place where state transitions happen. It must be
/// a pure function of `(config, state, action)`: the previous state is never
/// modified, and anything it does not touch is shared with the result.
pub trait Reducer {
    /// The state type this reducer operates on.
    type State;

    /// The action type this reducer handles.
    type Action;

    /// Errors that must reach the caller instead of degrading to a no-op.
    type Error;

    /// Process an action and return the new state.
    fn reduce(&self, state: &Self::State, action: &Self::Action)
        -> Result<Self::State, Self::Error>;
}
