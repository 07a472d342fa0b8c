//! Messages exchanged between the worker proxy and the compute host.
//!
//! The consumer side sends [`Request`]s; the host only ever answers with
//! [`Response::HereSome`]. Every message is wrapped in an [`Envelope`]
//! carrying the proxy's reset epoch, which the host echoes back so that
//! answers computed for a superseded population can be told apart.
//!
//! ```text
//! {"epoch":0,"type":"INIT","cols":3,"rows":1,"values":[0,1,0]}
//! {"epoch":0,"type":"NEED_SOME","n":4}
//! {"epoch":0,"type":"HERE_SOME","changes":[{"born":[1],"died":[],"survived":[]}]}
//! ```

use serde::{Deserialize, Serialize};

use crate::compute::ChangeSet;

/// Consumer-to-host messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Load a population. `values.len()` must equal `cols * rows`.
    #[serde(rename = "INIT")]
    Init {
        cols: usize,
        rows: usize,
        values: Vec<i64>,
    },
    /// Compute exactly `n` further generations.
    #[serde(rename = "NEED_SOME")]
    NeedSome { n: usize },
}

/// Host-to-consumer messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    /// Change-sets in generation order.
    #[serde(rename = "HERE_SOME")]
    HereSome { changes: Vec<ChangeSet> },
}

/// A message tagged with the reset epoch it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<M> {
    pub epoch: u64,
    #[serde(flatten)]
    pub message: M,
}

impl<M> Envelope<M> {
    pub fn new(epoch: u64, message: M) -> Self {
        Self { epoch, message }
    }
}

/// JSON codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Invalid envelope JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encode an envelope to its JSON wire form.
pub fn encode<M: Serialize>(envelope: &Envelope<M>) -> Result<String, CodecError> {
    Ok(serde_json::to_string(envelope)?)
}

/// Decode an envelope from its JSON wire form.
pub fn decode<M>(text: &str) -> Result<Envelope<M>, CodecError>
where
    M: for<'de> Deserialize<'de>,
{
    Ok(serde_json::from_str(text)?)
}
