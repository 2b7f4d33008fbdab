/// Single-flight frame scheduler.
///
/// At most one callback is queued with the host at any time; requests made
/// while one is queued are absorbed. The host calls [`begin`](Self::begin)
/// at the top of the callback, which re-opens the slot.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    pending: bool,
    /// Requests absorbed by an already-queued callback.
    absorbed: u64,
    /// Callbacks actually queued with the host.
    queued: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a callback. Returns `true` if the host must queue one now,
    /// `false` if one is already on its way.
    pub fn request(&mut self) -> bool {
        if self.pending {
            self.absorbed += 1;
            return false;
        }
        self.pending = true;
        self.queued += 1;
        true
    }

    /// Mark the queued callback as running. Returns whether one was pending.
    pub fn begin(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn absorbed(&self) -> u64 {
        self.absorbed
    }

    pub fn queued(&self) -> u64 {
        self.queued
    }
}
