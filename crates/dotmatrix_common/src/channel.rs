//! Bounded hand-off queues between the emulation thread and the front end.
//!
//! Both directions hold at most a couple of items. A full frame queue blocks
//! the emulator until the consumer catches up; a full input queue blocks the
//! producer.

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};

use crate::key::KeyEvent;
use crate::Frame;

pub const FRAME_QUEUE_DEPTH: usize = 2;
pub const INPUT_QUEUE_DEPTH: usize = 2;

/// The other side of a queue has been dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disconnected;

impl std::fmt::Display for Disconnected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("channel peer disconnected")
    }
}

impl std::error::Error for Disconnected {}

pub fn frame_channel() -> (FrameSender, FrameReceiver) {
    let (tx, rx) = bounded(FRAME_QUEUE_DEPTH);
    (FrameSender { tx }, FrameReceiver { rx })
}

pub fn input_channel() -> (InputSender, InputReceiver) {
    let (tx, rx) = bounded(INPUT_QUEUE_DEPTH);
    (InputSender { tx }, InputReceiver { rx })
}

pub struct FrameSender {
    tx: Sender<Frame>,
}

impl FrameSender {
    /// Publish a frame, blocking while the queue is full.
    pub fn send(&self, frame: Frame) -> Result<(), Disconnected> {
        self.tx.send(frame).map_err(|_| Disconnected)
    }
}

pub struct FrameReceiver {
    rx: Receiver<Frame>,
}

impl FrameReceiver {
    pub fn recv(&self) -> Result<Frame, Disconnected> {
        self.rx.recv().map_err(|_| Disconnected)
    }

    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<Frame> {
        self.rx.recv_timeout(timeout).ok()
    }

    pub fn try_recv(&self) -> Option<Frame> {
        self.rx.try_recv().ok()
    }
}

#[derive(Clone)]
pub struct InputSender {
    tx: Sender<KeyEvent>,
}

impl InputSender {
    pub fn send(&self, event: KeyEvent) -> Result<(), Disconnected> {
        self.tx.send(event).map_err(|_| Disconnected)
    }
}

pub struct InputReceiver {
    rx: Receiver<KeyEvent>,
}

impl InputReceiver {
    /// Take the next pending event without blocking.
    ///
    /// `Ok(None)` means the queue is empty.
    pub fn poll(&self) -> Result<Option<KeyEvent>, Disconnected> {
        match self.rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(Disconnected),
        }
    }
}
