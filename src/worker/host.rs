//! Compute host: answers protocol requests by driving one [`Model`].

use std::io;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::compute::{ChangeSet, Model, ModelError};
use crate::protocol::{Envelope, Request, Response, encode};

/// Host errors. Both are fatal to the host instance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("Protocol violation: {0}")]
    ProtocolViolation(&'static str),
    #[error(transparent)]
    Shape(#[from] ModelError),
}

/// Owns the simulation engine on the compute side.
///
/// The engine is created by the first `Init`; a later `Init` with different
/// dimensions replaces it.
#[derive(Default)]
pub struct ComputeHost {
    model: Option<Model>,
}

impl ComputeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// The engine, once an `Init` has been handled.
    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    /// Handle one request and build its response.
    pub fn handle(&mut self, request: Request) -> Result<Response, HostError> {
        match request {
            Request::Init { cols, rows, values } => {
                let reuse = self
                    .model
                    .as_ref()
                    .is_some_and(|m| m.cols() == cols && m.rows() == rows);
                if !reuse {
                    // Validate before discarding the current engine.
                    if values.len() != cols * rows {
                        return Err(ModelError::ShapeMismatch {
                            cols,
                            rows,
                            expected: cols * rows,
                            actual: values.len(),
                        }
                        .into());
                    }
                    self.model = None;
                }
                let model = self.model.get_or_insert_with(|| Model::new(cols, rows));
                let changes = model.init(&values)?;
                log::debug!("INIT {}x{}: {} live cells", cols, rows, changes.born.len());
                Ok(Response::HereSome {
                    changes: vec![changes],
                })
            }
            Request::NeedSome { n } => {
                let model = self
                    .model
                    .as_mut()
                    .ok_or(HostError::ProtocolViolation("NEED_SOME before INIT"))?;
                let changes: Vec<ChangeSet> = (0..n).map(|_| model.next()).collect();
                log::debug!(
                    "NEED_SOME {}: now at generation {}",
                    n,
                    model.generation()
                );
                Ok(Response::HereSome { changes })
            }
        }
    }

    /// Serve requests until the request channel closes or a fatal error occurs.
    ///
    /// Each response carries the epoch of the request it answers.
    pub fn run(
        mut self,
        requests: Receiver<Envelope<Request>>,
        responses: Sender<Envelope<Response>>,
    ) {
        log::info!("Compute host started");
        while let Ok(Envelope { epoch, message }) = requests.recv() {
            match self.handle(message) {
                Ok(response) => {
                    let envelope = Envelope::new(epoch, response);
                    if log::log_enabled!(log::Level::Trace) {
                        if let Ok(text) = encode(&envelope) {
                            log::trace!("-> {}", text);
                        }
                    }
                    if responses.send(envelope).is_err() {
                        log::debug!("Response channel closed; stopping host");
                        break;
                    }
                }
                Err(e) => {
                    log::error!("Compute host stopping (epoch {}): {}", epoch, e);
                    break;
                }
            }
        }
        log::info!("Compute host stopped");
    }

    /// Run a fresh host on a dedicated background thread.
    pub fn spawn(
        requests: Receiver<Envelope<Request>>,
        responses: Sender<Envelope<Response>>,
    ) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("life-compute-host".into())
            .spawn(move || ComputeHost::new().run(requests, responses))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn blinker_init() -> Request {
        let mut values = vec![0; 49];
        for i in [23, 24, 25] {
            values[i] = 1;
        }
        Request::Init {
            cols: 7,
            rows: 7,
            values,
        }
    }

    fn changes(response: Response) -> Vec<ChangeSet> {
        let Response::HereSome { changes } = response;
        changes
    }

    #[test]
    fn test_init_replies_one_element_batch() {
        let mut host = ComputeHost::new();
        let batch = changes(host.handle(blinker_init()).unwrap());
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].born, vec![23, 24, 25]);
        assert_eq!(host.model().map(Model::size), Some(49));
    }

    #[test]
    fn test_need_some_before_init_is_violation() {
        let mut host = ComputeHost::new();
        let err = host.handle(Request::NeedSome { n: 1 }).unwrap_err();
        assert!(matches!(err, HostError::ProtocolViolation(_)));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let mut host = ComputeHost::new();
        let err = host
            .handle(Request::Init {
                cols: 3,
                rows: 3,
                values: vec![1; 4],
            })
            .unwrap_err();
        assert!(matches!(err, HostError::Shape(ModelError::ShapeMismatch { .. })));
        assert!(host.model().is_none());
    }

    #[test]
    fn test_need_some_returns_n() {
        let mut host = ComputeHost::new();
        host.handle(blinker_init()).unwrap();
        assert_eq!(changes(host.handle(Request::NeedSome { n: 7 }).unwrap()).len(), 7);
        assert!(changes(host.handle(Request::NeedSome { n: 0 }).unwrap()).is_empty());
    }

    #[test]
    fn test_batch_equivalence() {
        let mut batched = ComputeHost::new();
        let mut single = ComputeHost::new();
        let init = Request::Init {
            cols: 10,
            rows: 10,
            values: crate::schema::RandomFill::new(0.4, Some(11)).generate(10, 10),
        };
        batched.handle(init.clone()).unwrap();
        single.handle(init).unwrap();

        let five = changes(batched.handle(Request::NeedSome { n: 5 }).unwrap());
        let ones: Vec<ChangeSet> = (0..5)
            .flat_map(|_| changes(single.handle(Request::NeedSome { n: 1 }).unwrap()))
            .collect();
        assert_eq!(five, ones);
    }

    #[test]
    fn test_reinit_with_new_shape_replaces_engine() {
        let mut host = ComputeHost::new();
        host.handle(blinker_init()).unwrap();
        host.handle(Request::Init {
            cols: 2,
            rows: 2,
            values: vec![1, 0, 0, 1],
        })
        .unwrap();
        assert_eq!(host.model().map(Model::size), Some(4));
    }

    #[test]
    fn test_run_echoes_epoch() {
        let (req_tx, req_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let handle = ComputeHost::spawn(req_rx, resp_tx).unwrap();

        req_tx.send(Envelope::new(3, blinker_init())).unwrap();
        req_tx.send(Envelope::new(3, Request::NeedSome { n: 2 })).unwrap();
        drop(req_tx);

        let first = resp_rx.recv().unwrap();
        let second = resp_rx.recv().unwrap();
        assert_eq!(first.epoch, 3);
        assert_eq!(second.epoch, 3);
        assert_eq!(changes(second.message).len(), 2);

        handle.join().unwrap();
        assert!(resp_rx.recv().is_err());
    }

    #[test]
    fn test_run_stops_on_violation() {
        let (req_tx, req_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let handle = ComputeHost::spawn(req_rx, resp_tx).unwrap();

        req_tx.send(Envelope::new(0, Request::NeedSome { n: 1 })).unwrap();
        handle.join().unwrap();

        assert!(resp_rx.recv().is_err());
        assert!(req_tx.send(Envelope::new(0, blinker_init())).is_err());
    }
}
