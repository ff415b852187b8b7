/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines progress reporting messages, sinks, and helper functions for RBF solves.
//
// Created on: 19 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Progress reporting primitives for RBF solves.

use std::fmt::Debug;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;

/// Progress events emitted while solving.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMsg {
    /// Event indicating the pose matrices have been assembled.
    PosesAssembled {
        num_poses: usize,
        driver_dims: usize,
        driven_dims: usize,
    },

    /// Event indicating one driven output column has been solved.
    ColumnSolved {
        column: usize,
        num_columns: usize,
        progress: f64,
    },

    /// Arbitrary informational message.
    Message { message: String },
}

/// Sink that consumes progress messages.
pub trait ProgressSink: Send + Sync + Debug {
    fn emit(&self, msg: ProgressMsg);
}

/// Progress sink that forwards messages over a channel.
#[derive(Debug)]
pub struct ClosureSink {
    tx: mpsc::SyncSender<ProgressMsg>,
}

impl ProgressSink for ClosureSink {
    #[inline]
    fn emit(&self, msg: ProgressMsg) {
        let _ = self.tx.try_send(msg);
    }
}

/// Spawns a listener thread that runs a handler closure for each progress message.
///
/// The thread exits once every clone of the returned sink has been dropped.
pub fn closure_sink<F>(
    buffer: usize,
    mut handler: F,
) -> (Arc<dyn ProgressSink>, thread::JoinHandle<()>)
where
    F: FnMut(ProgressMsg) + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel::<ProgressMsg>(buffer.max(1));
    let sink: Arc<dyn ProgressSink> = Arc::new(ClosureSink { tx });

    let handle = thread::spawn(move || {
        while let Ok(msg) = rx.recv() {
            handler(msg);
        }
    });

    (sink, handle)
}

/// Progress sink that keeps every message in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    messages: Mutex<Vec<ProgressMsg>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the messages received so far.
    pub fn messages(&self) -> Vec<ProgressMsg> {
        match self.messages.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ProgressSink for CollectingSink {
    fn emit(&self, msg: ProgressMsg) {
        match self.messages.lock() {
            Ok(mut guard) => guard.push(msg),
            Err(poisoned) => poisoned.into_inner().push(msg),
        }
    }
}

/// Fraction of output columns solved, in `[0, 1]`.
#[inline]
pub(crate) fn progress_from_columns(solved: usize, total: usize) -> f64 {
    if total == 0 { 1.0 } else { solved as f64 / total as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_sink_delivers_messages() {
        let (done_tx, done_rx) = mpsc::channel();
        let (sink, handle) = closure_sink(8, move |msg| {
            let _ = done_tx.send(msg);
        });

        sink.emit(ProgressMsg::Message {
            message: "hello".into(),
        });
        drop(sink);
        handle.join().unwrap();

        assert_eq!(
            done_rx.recv().unwrap(),
            ProgressMsg::Message {
                message: "hello".into()
            }
        );
    }

    #[test]
    fn column_progress() {
        assert_eq!(progress_from_columns(0, 0), 1.0);
        assert_eq!(progress_from_columns(1, 4), 0.25);
        assert_eq!(progress_from_columns(4, 4), 1.0);
    }
}
