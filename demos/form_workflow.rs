//! A form that loads a value, lets the user edit it, and saves it.
//!
//! Loading fails on the first attempt and saving rejects a blank value, so
//! the run walks through both failure paths before it succeeds.
//!
//! Run with `RUST_LOG=strata=debug,form_workflow=info cargo run --example form_workflow`.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use strata::{
    event_enum, state_enum, state_machine, MachineScope, RuntimeConfig, RuntimeError, State,
    StateMachine, StateStream,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

state_enum! {
    enum Form {
        Loading { fail: bool },
        LoadFailed { reason: String },
        Editing { value: String },
        Saving { value: String },
        SaveFailed { value: String, reason: String },
        Saved,
    }
}

impl Form {
    fn value(&self) -> Option<&str> {
        match self {
            Self::Editing { value } | Self::Saving { value } | Self::SaveFailed { value, .. } => {
                Some(value)
            }
            _ => None,
        }
    }

    fn error(&self) -> Option<&str> {
        match self {
            Self::LoadFailed { reason } | Self::SaveFailed { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

event_enum! {
    enum FormEvent {
        Loaded(String),
        Failed(String),
        Retry,
        Update(String),
        Save,
        SaveSucceeded,
        Reset,
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Notice {
    Draft(String),
    Saved(String),
    Rejected(String),
}

type Scope = MachineScope<Form, FormEvent, Notice>;
type FormMachine = StateMachine<Form, FormEvent, Notice>;

async fn load(fail: bool) -> Result<String, String> {
    tokio::time::sleep(Duration::from_millis(300)).await;
    if fail {
        Err("backend unavailable".to_string())
    } else {
        Ok("Joost".to_string())
    }
}

async fn save(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("Field cannot be blank!".to_string());
    }
    tokio::time::sleep(Duration::from_millis(300)).await;
    Ok(())
}

/// Read states until one matches `done`.
async fn until(
    states: &mut StateStream<Form>,
    done: impl Fn(&Form) -> bool,
) -> anyhow::Result<Form> {
    while let Some(state) = states.recv().await {
        info!(state = state.name(), value = state.value(), error = state.error(), "state");
        if done(&state) {
            return Ok(state);
        }
    }
    anyhow::bail!("machine stopped")
}

fn form_machine(config: RuntimeConfig) -> Result<FormMachine, RuntimeError> {
    state_machine(Form::Loading { fail: true }, config, |graph| {
        graph
            .side_effect(|state: Form, _: Scope| async move {
                info!(state = state.name(), "entered");
            })
            .on_event("Reset", |_, _| Form::Loading { fail: true })
            .state("Loading", |s| {
                s.side_effect(|state: Form, scope: Scope| async move {
                    let fail = matches!(state, Form::Loading { fail: true });
                    match load(fail).await {
                        Ok(value) => scope.send(FormEvent::Loaded(value)),
                        Err(reason) => scope.send(FormEvent::Failed(reason)),
                    }
                })
                .on_event("Loaded", |scope, event| match event {
                    FormEvent::Loaded(value) => Form::Editing { value: value.clone() },
                    _ => scope.state().clone(),
                })
                .on_event("Failed", |scope, event| match event {
                    FormEvent::Failed(reason) => Form::LoadFailed { reason: reason.clone() },
                    _ => scope.state().clone(),
                })
            })
            .state("LoadFailed", |s| s.on_event("Retry", |_, _| Form::Loading { fail: false }))
            .nested_state("WithData", |data| {
                data.side_effect_keyed(
                    |state: &Form| state.value().map(str::to_owned),
                    |state: Form, scope: Scope| async move {
                        if let Some(value) = state.value() {
                            scope.trigger(Notice::Draft(value.to_owned()));
                        }
                    },
                )
                .state("Editing", |s| {
                    s.on_event("Update", |scope, event| match event {
                        FormEvent::Update(value) => Form::Editing { value: value.clone() },
                        _ => scope.state().clone(),
                    })
                    .on_event("Save", |scope, _| match scope.state() {
                        Form::Editing { value } => Form::Saving { value: value.clone() },
                        other => other.clone(),
                    })
                })
                .state("Saving", |s| {
                    s.side_effect(|state: Form, scope: Scope| async move {
                        let value = state.value().unwrap_or_default().to_owned();
                        match save(&value).await {
                            Ok(()) => scope.send(FormEvent::SaveSucceeded),
                            Err(reason) => scope.send(FormEvent::Failed(reason)),
                        }
                    })
                    .on_event("SaveSucceeded", |scope, _| {
                        if let Form::Saving { value } = scope.state() {
                            scope.trigger(Notice::Saved(value.clone()));
                        }
                        Form::Saved
                    })
                    .on_event("Failed", |scope, event| match (scope.state(), event) {
                        (Form::Saving { value }, FormEvent::Failed(reason)) => {
                            scope.trigger(Notice::Rejected(reason.clone()));
                            Form::SaveFailed {
                                value: value.clone(),
                                reason: reason.clone(),
                            }
                        }
                        (other, _) => other.clone(),
                    })
                })
                .state("SaveFailed", |s| {
                    s.on_event("Save", |scope, _| match scope.state() {
                        Form::SaveFailed { value, .. } => Form::Saving { value: value.clone() },
                        other => other.clone(),
                    })
                    .on_event("Update", |scope, event| match event {
                        FormEvent::Update(value) => Form::Editing { value: value.clone() },
                        _ => scope.state().clone(),
                    })
                })
            })
            .state("Saved", |s| s)
    })
}

/// Drive the form through a failed load, a rejected save and a successful
/// save. Returns every notice the consumer received.
async fn run(machine: FormMachine) -> anyhow::Result<Vec<Notice>> {
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let notices = machine.clone();
    let consumer = tokio::spawn(async move {
        notices
            .consume_effects(|notice| {
                match &notice {
                    Notice::Draft(value) => info!(%value, "draft stored"),
                    Notice::Saved(value) => info!(%value, "form saved"),
                    Notice::Rejected(reason) => warn!(%reason, "save rejected"),
                }
                sink.lock().push(notice);
            })
            .await;
    });

    let mut states = machine.observe();

    until(&mut states, |state| matches!(state, Form::LoadFailed { .. })).await?;
    machine.send(FormEvent::Retry)?;

    until(&mut states, |state| matches!(state, Form::Editing { .. })).await?;
    machine.send(FormEvent::Update(String::new()))?;
    machine.send(FormEvent::Save)?;

    until(&mut states, |state| matches!(state, Form::SaveFailed { .. })).await?;
    machine.send(FormEvent::Update("Strata".to_string()))?;
    machine.send(FormEvent::Save)?;

    until(&mut states, |state| *state == Form::Saved).await?;

    // Give the consumer a moment to drain before the scope ends.
    tokio::time::sleep(Duration::from_millis(50)).await;
    machine.shutdown().await;
    consumer.await?;

    let received = received.lock().clone();
    Ok(received)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = RuntimeConfig::default()
        .with_name("form")
        .while_observed(Duration::from_secs(5));

    let notices = run(form_machine(config)?).await?;
    info!(count = notices.len(), "workflow finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn workflow_runs_to_completion() {
        let machine = form_machine(RuntimeConfig::default().with_name("form")).unwrap();
        let notices = tokio::time::timeout(Duration::from_secs(60), run(machine.clone()))
            .await
            .expect("workflow finished")
            .unwrap();

        assert_eq!(machine.state(), Form::Saved);
        assert_eq!(notices.last(), Some(&Notice::Saved("Strata".to_string())));
        assert!(notices.contains(&Notice::Rejected("Field cannot be blank!".to_string())));
        assert!(notices.contains(&Notice::Draft("Joost".to_string())));
    }
}
