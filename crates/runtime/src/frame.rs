/// Metadata for one compositor frame.
///
/// `time_ms` is the host's `DOMHighResTimeStamp` for the frame callback.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index within the session.
    pub index: u64,
    /// Host timestamp (milliseconds).
    pub time_ms: f64,
    /// Time since the previous frame (milliseconds); 0 for the first frame.
    pub delta_ms: f64,
}

impl Frame {
    pub fn is_first(&self) -> bool {
        self.index == 0
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NonMonotonicFrame {
    pub previous_ms: f64,
    pub received_ms: f64,
}

/// Numbers frame callbacks and enforces that they arrive in time order.
#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    last: Option<Frame>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<Frame> {
        self.last
    }

    pub fn tick(&mut self, time_ms: f64) -> Result<Frame, NonMonotonicFrame> {
        let frame = match self.last {
            None => Frame {
                index: 0,
                time_ms,
                delta_ms: 0.0,
            },
            Some(prev) if time_ms < prev.time_ms => {
                return Err(NonMonotonicFrame {
                    previous_ms: prev.time_ms,
                    received_ms: time_ms,
                });
            }
            Some(prev) => Frame {
                index: prev.index + 1,
                time_ms,
                delta_ms: time_ms - prev.time_ms,
            },
        };
        self.last = Some(frame);
        Ok(frame)
    }
}
