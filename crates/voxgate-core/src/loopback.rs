//! In-process frame transport between the capture thread and the upload
//! session.
//!
//! The capture side never blocks: when the channel is full the frame is
//! dropped. The receive side polls with a timeout. Frame buffers travel back
//! to the sender on a second channel so steady-state operation does not
//! allocate.

use crate::SessionToken;

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use tracing::trace;

struct Datagram {
    token: SessionToken,
    bytes: Vec<u8>,
}

/// A frame handed to [`LoopbackReceiver::try_receive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Session that was streaming when the frame was captured.
    pub token: SessionToken,
    /// Bytes copied into the caller's buffer.
    pub len: usize,
}

/// Creates a channel for frames of exactly `frame_len` bytes holding at most
/// `capacity` frames.
pub fn channel(frame_len: usize, capacity: usize) -> (LoopbackSender, LoopbackReceiver) {
    let capacity = capacity.max(1);
    let (frames_tx, frames_rx) = crossbeam_channel::bounded(capacity);
    let (recycle_tx, recycle_rx) = crossbeam_channel::bounded(capacity + 1);

    (
        LoopbackSender {
            frames: frames_tx,
            recycled: recycle_rx,
            spare: None,
            frame_len,
        },
        LoopbackReceiver {
            frames: frames_rx,
            recycle: recycle_tx,
            frame_len,
        },
    )
}

/// Capture-side half. Owned by the capture loop.
pub struct LoopbackSender {
    frames: Sender<Datagram>,
    recycled: Receiver<Vec<u8>>,
    spare: Option<Vec<u8>>,
    frame_len: usize,
}

impl LoopbackSender {
    /// Queues a copy of `frame` without blocking.
    ///
    /// Returns `false` when the receiver cannot accept it right now (channel
    /// full or receiver gone) or when `frame` is not one frame long; the
    /// frame is then dropped and never delivered.
    pub fn try_send(&mut self, token: SessionToken, frame: &[u8]) -> bool {
        if frame.len() != self.frame_len {
            trace!(
                expected = self.frame_len,
                actual = frame.len(),
                "Refusing datagram of wrong length"
            );
            return false;
        }

        let mut bytes = self
            .spare
            .take()
            .or_else(|| self.recycled.try_recv().ok())
            .unwrap_or_else(|| Vec::with_capacity(self.frame_len));
        bytes.clear();
        bytes.extend_from_slice(frame);

        match self.frames.try_send(Datagram { token, bytes }) {
            Ok(()) => true,
            Err(TrySendError::Full(datagram)) | Err(TrySendError::Disconnected(datagram)) => {
                self.spare = Some(datagram.bytes);
                false
            }
        }
    }

    /// Byte length every datagram must have.
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }
}

/// Session-side half.
///
/// Cloned into each upload session; the start gate guarantees only one
/// session reads at a time.
#[derive(Clone)]
pub struct LoopbackReceiver {
    frames: Receiver<Datagram>,
    recycle: Sender<Vec<u8>>,
    frame_len: usize,
}

impl LoopbackReceiver {
    /// Waits up to `timeout` for one frame and copies it into `buf`.
    ///
    /// A zero timeout polls once. Returns `None` when nothing arrived in time.
    pub fn try_receive(&self, timeout: Duration, buf: &mut [u8]) -> Option<Delivery> {
        let datagram = if timeout.is_zero() {
            match self.frames.try_recv() {
                Ok(d) => d,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
            }
        } else {
            match self.frames.recv_timeout(timeout) {
                Ok(d) => d,
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => {
                    // Capture side is gone; still honour the timeout so
                    // polling callers do not spin.
                    std::thread::sleep(timeout);
                    return None;
                }
            }
        };

        let len = datagram.bytes.len().min(buf.len());
        buf[..len].copy_from_slice(&datagram.bytes[..len]);
        let delivery = Delivery {
            token: datagram.token,
            len,
        };
        self.give_back(datagram.bytes);
        Some(delivery)
    }

    /// Discards every queued frame and returns how many there were.
    ///
    /// Never waits, and stops after the backlog present at the start of the
    /// call even if the sender keeps producing.
    pub fn drain(&self) -> usize {
        let backlog = self.frames.len();
        let mut drained = 0;
        while drained < backlog {
            let Ok(datagram) = self.frames.try_recv() else {
                break;
            };
            self.give_back(datagram.bytes);
            drained += 1;
        }
        drained
    }

    /// Frames currently queued.
    pub fn pending(&self) -> usize {
        self.frames.len()
    }

    /// Byte length every datagram has.
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    fn give_back(&self, bytes: Vec<u8>) {
        // Pool full: let the buffer drop.
        let _ = self.recycle.try_send(bytes);
    }
}
