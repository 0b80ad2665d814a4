#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::{
    engine::config::Controller,
    shape::Node,
    transport::{BaseUnit, TransportState},
};

/// Control events for the engine. Cheap to copy, so they can travel through a
/// lock-free queue from the UI or host thread to the audio thread.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ShaperMessage {
    SetController { controller: Controller, value: f32 },
    SetBase { unit: BaseUnit, value: f64 },
    InsertNode { stage: usize, node: Node },
    ChangeNode { stage: usize, index: usize, node: Node },
    DeleteNode { stage: usize, index: usize },
    ClearShape { stage: usize },
    /// New tempo, speed or meter.
    Transport(TransportState),
    /// Host relocated the playhead.
    Position { bar: i64, bar_beat: f64 },
}

/// A message that takes effect `offset` frames into the next block.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TimedMessage {
    pub offset: usize,
    pub message: ShaperMessage,
}

impl TimedMessage {
    pub fn new(offset: usize, message: ShaperMessage) -> Self {
        Self { offset, message }
    }
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<ShaperMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<ShaperMessage> {
    fn pop(&mut self) -> Option<ShaperMessage> {
        Consumer::pop(self).ok()
    }
}

/// Single-threaded receiver, for offline rendering and tests.
impl MessageReceiver for std::collections::VecDeque<ShaperMessage> {
    fn pop(&mut self) -> Option<ShaperMessage> {
        self.pop_front()
    }
}
