//! Trigger Service
//!
//! Runs one apply-and-await session and reports it through a [`MessageSink`].
//!
//! Message contract:
//! - apply fails: a single `ERROR`, nothing is observed
//! - apply succeeds: `TRIGGERED`, then exactly one of `RUNNING`, `TIMEOUT`, `ERROR`
//!
//! Orchestrator calls block, so they run on the blocking pool. The session
//! opened for the apply is moved into the wait and dropped (released) at the
//! end of whichever step finishes last, or as soon as the client is gone.

use std::fmt;
use std::sync::Arc;

use anklet_client::workflow::{self, TriggerRequest};
use anklet_client::{ClientError, Connector};
use anklet_core::dto::session::SessionMessage;
use async_trait::async_trait;
use tokio::task::JoinError;
use tracing::{debug, info, warn};

/// The client can no longer receive messages
#[derive(Debug)]
pub struct SinkClosed;

/// Destination of session messages
#[async_trait]
pub trait MessageSink: Send {
    async fn deliver(&mut self, message: &SessionMessage) -> Result<(), SinkClosed>;
}

/// Service error type
#[derive(Debug)]
pub enum TriggerError {
    Apply(ClientError),
    Wait(ClientError),
    Worker(JoinError),
}

impl fmt::Display for TriggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerError::Apply(err) if err.is_backend() => write!(f, "Ankaios error: {}", err),
            TriggerError::Apply(err) => write!(f, "Apply error: {}", err),
            TriggerError::Wait(err) => write!(f, "Waiting error: {}", err),
            TriggerError::Worker(err) => write!(f, "Server error: {}", err),
        }
    }
}

impl From<TriggerError> for SessionMessage {
    fn from(err: TriggerError) -> Self {
        SessionMessage::error(err.to_string())
    }
}

/// Runs one trigger session
///
/// Returns the terminal message the client received, or `None` if the
/// client disconnected before it could be delivered.
pub async fn run_session<C, S>(
    connector: Arc<C>,
    request: TriggerRequest,
    sink: &mut S,
) -> Option<SessionMessage>
where
    C: Connector,
    S: MessageSink + ?Sized,
{
    let applied = {
        let request = request.clone();
        tokio::task::spawn_blocking(move || {
            let session = connector.connect()?;
            let instance = workflow::apply(&session, &request.workload, &request.agent)?;
            Ok::<_, ClientError>((session, instance))
        })
        .await
    };

    let (session, instance) = match applied {
        Ok(Ok(applied)) => applied,
        Ok(Err(err)) => {
            warn!("Failed to apply workload {}: {}", request.workload, err);
            return finish(sink, TriggerError::Apply(err).into()).await;
        }
        Err(err) => return finish(sink, TriggerError::Worker(err).into()).await,
    };

    info!("Triggered workload instance {}", instance);
    if sink.deliver(&SessionMessage::triggered(&instance)).await.is_err() {
        debug!("Client left after trigger of {}", instance);
        return None;
    }

    let waited = {
        let instance = instance.clone();
        let timeout = request.timeout;
        tokio::task::spawn_blocking(move || workflow::await_running(&session, &instance, timeout))
            .await
    };

    let message = match waited {
        Ok(Ok(outcome)) => SessionMessage::from_outcome(outcome, &instance),
        Ok(Err(err)) => {
            warn!("Failed while waiting for {}: {}", instance, err);
            TriggerError::Wait(err).into()
        }
        Err(err) => TriggerError::Worker(err).into(),
    };

    finish(sink, message).await
}

async fn finish<S: MessageSink + ?Sized>(sink: &mut S, message: SessionMessage) -> Option<SessionMessage> {
    debug_assert!(message.is_terminal());
    match sink.deliver(&message).await {
        Ok(()) => Some(message),
        Err(SinkClosed) => {
            debug!("Client left before the terminal message");
            None
        }
    }
}
