use crate::simulation::WorldSnapshot;
use super::{fetch_world, FetchKind, RemoteError, SimulationClient};
use tokio::sync::oneshot::{self, error::TryRecvError};

pub type FetchOutcome = Result<WorldSnapshot, RemoteError>;

/// The frame driver's view of the asynchronous remote collaborator.
///
/// `request` starts a cycle, `poll` never blocks: it yields `None` while the
/// cycle is in flight and the outcome exactly once when it resolves.
pub trait SnapshotSource {
    fn request(&mut self, kind: FetchKind);
    fn poll(&mut self) -> Option<FetchOutcome>;
    fn in_flight(&self) -> bool;
    fn get_name(&self) -> &'static str;
}

/// Runs each fetch cycle as a task on the current tokio runtime and hands
/// the outcome back through a oneshot channel.
///
/// `request` must be called from within a runtime context.
pub struct TaskFetcher<C: SimulationClient> {
    client: C,
    pending: Option<oneshot::Receiver<FetchOutcome>>,
}

impl<C: SimulationClient> TaskFetcher<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            pending: None,
        }
    }
}

impl<C: SimulationClient> SnapshotSource for TaskFetcher<C> {
    fn request(&mut self, kind: FetchKind) {
        if self.pending.is_some() {
            log::debug!("Fetch already in flight, ignoring {:?} request", kind);
            return;
        }

        let (tx, rx) = oneshot::channel();
        let client = self.client.clone();
        tokio::spawn(async move {
            let outcome = fetch_world(&client, &kind).await;
            // The receiver is gone only if the driver was dropped.
            let _ = tx.send(outcome);
        });
        self.pending = Some(rx);
    }

    fn poll(&mut self) -> Option<FetchOutcome> {
        let rx = self.pending.as_mut()?;
        match rx.try_recv() {
            Ok(outcome) => {
                self.pending = None;
                Some(outcome)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => {
                self.pending = None;
                Some(Err(RemoteError::Cancelled))
            }
        }
    }

    fn in_flight(&self) -> bool {
        self.pending.is_some()
    }

    fn get_name(&self) -> &'static str {
        self.client.get_name()
    }
}
