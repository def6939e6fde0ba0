//! Observer-driven activation.
//!
//! The gate owns the event queue while the machine is Cold and hands it to
//! a session while Hot. Events sent while Cold stay queued and are folded
//! in order once the next session starts.

use crate::core::{Effect, Event, State};
use crate::runtime::error::RuntimeError;
use crate::runtime::machine::MachineCore;
use crate::runtime::session::{Session, SessionEnd};
use std::future::pending;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Whether a machine is currently processing events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Events are queued; no jobs run.
    Cold,
    /// Events are folded and side effects run.
    Hot,
    /// The machine's scope ended or a side effect failed.
    Stopped,
}

#[derive(Debug)]
pub(crate) enum GateSignal {
    Attached,
    Detached,
}

pub(crate) struct ActivationGate<S, E, F> {
    core: Arc<MachineCore<S, E, F>>,
    events: Option<mpsc::UnboundedReceiver<E>>,
    session: Option<Session<E>>,
    observers: usize,
    cooldown: Option<Instant>,
    scope: CancellationToken,
    status: watch::Sender<Activation>,
}

impl<S, E, F> ActivationGate<S, E, F>
where
    S: State,
    E: Event,
    F: Effect,
{
    pub(crate) fn new(
        core: Arc<MachineCore<S, E, F>>,
        events: mpsc::UnboundedReceiver<E>,
        scope: CancellationToken,
        status: watch::Sender<Activation>,
    ) -> Self {
        Self {
            core,
            events: Some(events),
            session: None,
            observers: 0,
            cooldown: None,
            scope,
            status,
        }
    }

    pub(crate) async fn run(mut self, mut signals: mpsc::UnboundedReceiver<GateSignal>) {
        if self.core.grace_period.is_none() {
            self.activate();
        }

        loop {
            tokio::select! {
                biased;
                _ = self.scope.cancelled() => break,
                end = session_end(&mut self.session) => {
                    self.session = None;
                    if let Err(failure) = self.recover(end) {
                        self.fail(failure);
                        break;
                    }
                    self.set_status(Activation::Cold);
                }
                signal = signals.recv() => match signal {
                    Some(GateSignal::Attached) => self.attached(),
                    Some(GateSignal::Detached) => {
                        if let Err(failure) = self.detached().await {
                            self.fail(failure);
                            break;
                        }
                    }
                    None => break,
                },
                _ = sleep_until(self.cooldown) => {
                    self.cooldown = None;
                    debug!("grace period elapsed");
                    if let Err(failure) = self.deactivate().await {
                        self.fail(failure);
                        break;
                    }
                }
            }
        }

        if let Some(session) = self.session.take() {
            session.token.cancel();
            let _ = session.handle.await;
        }
        self.core.published.close();
        self.set_status(Activation::Stopped);
        info!("state machine stopped");
    }

    fn attached(&mut self) {
        self.observers += 1;
        self.cooldown = None;
        debug!(observers = self.observers, "observer attached");
        self.activate();
    }

    async fn detached(&mut self) -> Result<(), RuntimeError> {
        self.observers = self.observers.saturating_sub(1);
        debug!(observers = self.observers, "observer detached");

        match self.core.grace_period {
            Some(grace) if self.observers == 0 => {
                if grace.is_zero() {
                    self.deactivate().await
                } else {
                    self.cooldown = Some(Instant::now() + grace);
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    fn activate(&mut self) {
        let Some(events) = self.events.take() else {
            return;
        };
        self.session = Some(Session::start(Arc::clone(&self.core), events, &self.scope));
        self.set_status(Activation::Hot);
    }

    async fn deactivate(&mut self) -> Result<(), RuntimeError> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        session.token.cancel();
        let end = session.handle.await;
        self.recover(end)?;
        self.set_status(Activation::Cold);
        Ok(())
    }

    fn recover(&mut self, end: Result<SessionEnd<E>, JoinError>) -> Result<(), RuntimeError> {
        let end = end.map_err(|err| RuntimeError::TaskFailed(err.to_string()))?;
        self.events = Some(end.events);
        match end.failure {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    fn fail(&mut self, failure: RuntimeError) {
        error!(error = %failure, "state machine aborted");
        *self.core.failure.lock() = Some(Arc::new(failure));
        self.scope.cancel();
    }

    fn set_status(&self, activation: Activation) {
        let previous = self.status.send_replace(activation);
        if previous != activation {
            debug!(from = ?previous, to = ?activation, "activation changed");
        }
    }
}

async fn session_end<E>(session: &mut Option<Session<E>>) -> Result<SessionEnd<E>, JoinError> {
    match session {
        Some(session) => (&mut session.handle).await,
        None => pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => pending().await,
    }
}
