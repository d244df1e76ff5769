//! Render throttling.
//!
//! Requests arriving before the next frame collapse into one; the latest request wins.

#[derive(Debug, Clone)]
pub struct FrameCoalescer<T> {
    pending: Option<T>,
    requested: u64,
    delivered: u64,
}

impl<T> Default for FrameCoalescer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameCoalescer<T> {
    pub fn new() -> Self {
        Self {
            pending: None,
            requested: 0,
            delivered: 0,
        }
    }

    /// Records a request. Returns `true` when this request scheduled a new frame, `false`
    /// when it was folded into one already pending.
    pub fn request(&mut self, state: T) -> bool {
        self.requested += 1;
        self.pending.replace(state).is_none()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Called once per display refresh; yields the state to render, if any.
    pub fn take_frame(&mut self) -> Option<T> {
        let state = self.pending.take()?;
        self.delivered += 1;
        Some(state)
    }

    /// Requests received so far.
    pub fn requested(&self) -> u64 {
        self.requested
    }

    /// Frames handed out so far.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}
