//! Consumer-side proxy for a [`ComputeHost`] running on its own thread.
//!
//! `ModelInWorker` hides the batched, asynchronous host behind a pull-based
//! [`ModelInWorker::next`]. Change-sets arrive in batches and are queued;
//! `next` pops one and broadcasts it through [`ModelInWorker::changed`]. When
//! the queue is empty the pull is recorded as pending and satisfied as soon as
//! the next batch is received.
//!
//! The consumer drives delivery by calling [`ModelInWorker::pump`] (non-blocking)
//! or [`ModelInWorker::wait`] (blocking with a timeout); `next` itself never
//! blocks.

use std::collections::VecDeque;
use std::io;
use std::mem;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::compute::{ChangeSet, ModelError};
use crate::protocol::{Envelope, Request, Response};
use crate::schema::{ConfigError, LifeConfig, RandomFill};
use crate::signal::Signal;

use super::ComputeHost;

/// Proxy errors.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Shape(#[from] ModelError),
    #[error("Failed to spawn compute host: {0}")]
    Spawn(#[from] io::Error),
    /// The host is gone. Terminal: build a new proxy to continue.
    #[error("Compute host channel closed")]
    ChannelClosed,
    #[error("No response from compute host within {0:?}")]
    Timeout(Duration),
}

/// Pull-based stream of change-sets computed on a background thread.
pub struct ModelInWorker {
    cols: usize,
    rows: usize,
    prefetch: usize,
    low_water: usize,
    fill: RandomFill,
    requests: Sender<Envelope<Request>>,
    responses: Receiver<Envelope<Response>>,
    host: Option<JoinHandle<()>>,
    /// Delivered but not yet consumed, in generation order.
    buffer: VecDeque<ChangeSet>,
    /// Pulls made while the buffer was empty.
    pending: usize,
    last_dispatched: Option<ChangeSet>,
    /// Bumped by every reset; older responses are dropped.
    epoch: u64,
    closed: bool,
    changed: Signal<ChangeSet>,
}

impl ModelInWorker {
    /// Spawn a host, load `values` and request the first batch.
    pub fn new(config: &LifeConfig, values: Vec<i64>) -> Result<Self, ProxyError> {
        config.validate()?;
        check_shape(config.cols, config.rows, &values)?;

        let (requests, host_requests) = mpsc::channel();
        let (host_responses, responses) = mpsc::channel();
        let host = ComputeHost::spawn(host_requests, host_responses)?;

        let mut proxy = Self {
            cols: config.cols,
            rows: config.rows,
            prefetch: config.prefetch,
            low_water: config.low_water,
            fill: RandomFill::new(config.density, config.seed),
            requests,
            responses,
            host: Some(host),
            buffer: VecDeque::new(),
            pending: 0,
            last_dispatched: None,
            epoch: 0,
            closed: false,
            changed: Signal::new(),
        };
        proxy.start(values)?;
        Ok(proxy)
    }

    /// Notifier raised with each change-set handed to the consumer.
    pub fn changed(&self) -> &Signal<ChangeSet> {
        &self.changed
    }

    /// Pull the next change-set.
    ///
    /// Broadcasts immediately if one is buffered, and requests another batch
    /// once the buffer runs low. Otherwise the pull stays pending until a
    /// batch is received by `pump` or `wait`.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<(), ProxyError> {
        match self.buffer.pop_front() {
            Some(changes) => {
                self.dispatch(changes);
                if self.buffer.len() <= self.low_water {
                    self.send(Request::NeedSome { n: self.prefetch })?;
                }
            }
            None => {
                if self.closed {
                    return Err(ProxyError::ChannelClosed);
                }
                self.pending += 1;
            }
        }
        Ok(())
    }

    /// Pull the next change-set and block until every pending pull is satisfied.
    pub fn next_blocking(&mut self, timeout: Duration) -> Result<(), ProxyError> {
        self.next()?;
        while self.pending > 0 {
            self.wait(timeout)?;
        }
        Ok(())
    }

    /// Replace the population with a fresh random one.
    pub fn randomize(&mut self) -> Result<(), ProxyError> {
        if self.closed {
            return Err(ProxyError::ChannelClosed);
        }
        let values = self.fill.generate(self.cols, self.rows);
        self.reset(values)
    }

    /// Replace the population with `values`.
    ///
    /// Everything buffered is discarded in favour of a single wipe change-set
    /// that kills the cells last shown alive. Batches still in flight for the
    /// old population are dropped on arrival.
    pub fn reset(&mut self, values: Vec<i64>) -> Result<(), ProxyError> {
        check_shape(self.cols, self.rows, &values)?;
        if self.closed {
            return Err(ProxyError::ChannelClosed);
        }

        let wipe = self
            .last_dispatched
            .as_ref()
            .map(ChangeSet::wipe)
            .unwrap_or_default();

        self.buffer.clear();
        self.epoch += 1;
        log::debug!(
            "Reset to epoch {} (wiping {} cells)",
            self.epoch,
            wipe.died.len()
        );

        if self.pending > 0 {
            self.pending -= 1;
            self.dispatch(wipe);
        } else {
            self.buffer.push_back(wipe);
        }

        self.start(values)
    }

    /// Apply every batch that has already arrived, without blocking.
    ///
    /// Returns the number of batches received (stale ones included).
    pub fn pump(&mut self) -> Result<usize, ProxyError> {
        let mut received = 0;
        loop {
            match self.responses.try_recv() {
                Ok(envelope) => {
                    self.receive(envelope);
                    received += 1;
                }
                Err(TryRecvError::Empty) => return Ok(received),
                Err(TryRecvError::Disconnected) => return Err(self.fail()),
            }
        }
    }

    /// Block until one batch arrives and apply it.
    pub fn wait(&mut self, timeout: Duration) -> Result<(), ProxyError> {
        match self.responses.recv_timeout(timeout) {
            Ok(envelope) => {
                self.receive(envelope);
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => Err(ProxyError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(self.fail()),
        }
    }

    /// Change-sets received but not yet pulled.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Pulls waiting for data.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Number of resets so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    fn start(&mut self, values: Vec<i64>) -> Result<(), ProxyError> {
        self.send(Request::Init {
            cols: self.cols,
            rows: self.rows,
            values,
        })?;
        self.send(Request::NeedSome { n: self.prefetch })
    }

    fn send(&mut self, request: Request) -> Result<(), ProxyError> {
        if self.closed {
            return Err(ProxyError::ChannelClosed);
        }
        if self.requests.send(Envelope::new(self.epoch, request)).is_err() {
            return Err(self.fail());
        }
        Ok(())
    }

    fn receive(&mut self, envelope: Envelope<Response>) {
        let Response::HereSome { changes } = envelope.message;
        if envelope.epoch < self.epoch {
            log::trace!(
                "Dropping {} change-sets from epoch {} (current {})",
                changes.len(),
                envelope.epoch,
                self.epoch
            );
            return;
        }

        for change in changes {
            if self.pending > 0 {
                self.pending -= 1;
                self.dispatch(change);
            } else {
                self.buffer.push_back(change);
            }
        }
    }

    fn dispatch(&mut self, changes: ChangeSet) {
        let changes = self.last_dispatched.insert(changes);
        self.changed.raise(changes);
    }

    fn fail(&mut self) -> ProxyError {
        if !self.closed {
            log::warn!("Compute host channel closed");
            self.closed = true;
        }
        ProxyError::ChannelClosed
    }
}

fn check_shape(cols: usize, rows: usize, values: &[i64]) -> Result<(), ModelError> {
    if values.len() != cols * rows {
        return Err(ModelError::ShapeMismatch {
            cols,
            rows,
            expected: cols * rows,
            actual: values.len(),
        });
    }
    Ok(())
}

impl Drop for ModelInWorker {
    fn drop(&mut self) {
        // Closing the request channel ends the host loop.
        let (closed, _) = mpsc::channel();
        drop(mem::replace(&mut self.requests, closed));
        if let Some(handle) = self.host.take() {
            if handle.join().is_err() {
                log::warn!("Compute host thread panicked");
            }
        }
    }
}
