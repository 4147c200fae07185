use crate::config::ModelParams;
use crate::simulation::{Category, Snapshot, WorldSnapshot};
use std::future::Future;
use thiserror::Error;

pub mod records;
pub mod http;
pub mod fetch;

pub use records::*;
pub use http::*;
pub use fetch::*;

pub const INIT_ENDPOINT: &str = "init";
pub const ADVANCE_ENDPOINT: &str = "update";

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request to '{endpoint}' failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("'{endpoint}' responded with HTTP {status}")]
    Status { endpoint: String, status: u16 },
    #[error("malformed response from '{endpoint}': {reason}")]
    Malformed { endpoint: String, reason: String },
    #[error("fetch task ended without reporting a result")]
    Cancelled,
}

/// Request/response access to the remote simulation process.
pub trait SimulationClient: Clone + Send + Sync + 'static {
    /// Builds a fresh model from `params`; returns the server's message.
    fn initialize(&self, params: &ModelParams) -> impl Future<Output = Result<String, RemoteError>> + Send;

    /// Advances the model one step; returns the step counter if reported.
    fn advance(&self) -> impl Future<Output = Result<Option<u64>, RemoteError>> + Send;

    fn fetch(&self, category: Category) -> impl Future<Output = Result<Snapshot, RemoteError>> + Send;

    fn get_name(&self) -> &'static str;
}

/// What a fetch cycle asks of the remote model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchKind {
    /// Read every category without stepping the model.
    Initial,
    /// Step the model, then read the listed categories.
    Advance(Vec<Category>),
}

impl FetchKind {
    pub fn categories(&self) -> &[Category] {
        match self {
            FetchKind::Initial => &Category::ALL,
            FetchKind::Advance(categories) => categories,
        }
    }

    pub fn advances(&self) -> bool {
        matches!(self, FetchKind::Advance(_))
    }
}

/// One logical "advance + fetch" operation. The first failing call fails the
/// whole cycle, so a caller never sees a partially fetched world.
pub async fn fetch_world<C: SimulationClient>(client: &C, kind: &FetchKind) -> Result<WorldSnapshot, RemoteError> {
    let step = if kind.advances() {
        client.advance().await?
    } else {
        None
    };

    let mut snapshots = Vec::with_capacity(kind.categories().len());
    for category in kind.categories() {
        snapshots.push(client.fetch(*category).await?);
    }

    Ok(WorldSnapshot::new(step, snapshots))
}
