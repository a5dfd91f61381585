//! The live phase: a context plus the task running its script.

use std::sync::Arc;

use aurora_core::{LifecycleState, PhaseId};
use events::Event;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::context::{PhaseContext, PhaseServices};
use super::phase::PhaseScript;
use crate::interaction::PlayerInput;

pub struct PhaseInstance {
    ctx: Arc<PhaseContext>,
    inputs: mpsc::UnboundedSender<PlayerInput>,
    task: Option<JoinHandle<()>>,
}

impl PhaseInstance {
    /// Builds the context and spawns the script's `initialize`.
    pub fn start(script: Box<dyn PhaseScript>, services: PhaseServices) -> Self {
        let phase = script.phase();
        let (inputs, receiver) = mpsc::unbounded_channel();
        let ctx = PhaseContext::new(phase, services, receiver);

        if ctx.transition(LifecycleState::Initializing) {
            ctx.emit(Event::PhaseInitializing {
                phase: phase.value(),
            });
        }
        info!(phase = %phase, title = phase.info().title, "Phase initializing");

        let task = tokio::spawn(run_script(script, Arc::clone(&ctx)));

        Self {
            ctx,
            inputs,
            task: Some(task),
        }
    }

    pub fn phase(&self) -> PhaseId {
        self.ctx.phase()
    }

    pub fn state(&self) -> LifecycleState {
        self.ctx.state()
    }

    pub fn is_live(&self) -> bool {
        !self.ctx.is_destroyed()
    }

    pub fn context(&self) -> &Arc<PhaseContext> {
        &self.ctx
    }

    /// Whether the script task has returned.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Forwards player input to whatever gate the script is waiting on.
    pub fn send_input(&self, input: PlayerInput) -> bool {
        if self.ctx.is_destroyed() {
            return false;
        }
        self.inputs.send(input).is_ok()
    }

    pub fn teardown(&self) {
        self.ctx.teardown();
    }
}

impl Drop for PhaseInstance {
    fn drop(&mut self) {
        self.ctx.teardown();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for PhaseInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseInstance")
            .field("phase", &self.phase())
            .field("state", &self.state())
            .field("finished", &self.is_finished())
            .finish()
    }
}

async fn run_script(mut script: Box<dyn PhaseScript>, ctx: Arc<PhaseContext>) {
    let phase = ctx.phase();
    if ctx.transition(LifecycleState::Running) {
        ctx.emit(Event::PhaseRunning {
            phase: phase.value(),
        });
    }

    match script.initialize(&ctx).await {
        Ok(()) => debug!(phase = %phase, "Phase script finished"),
        Err(e) if e.is_cancelled() => debug!(phase = %phase, "Phase script stopped by teardown"),
        Err(e) => {
            error!(phase = %phase, error = %e, "Phase script failed");
            ctx.emit(Event::PhaseFailed {
                phase: phase.value(),
                message: e.to_string(),
            });
            ctx.hide_text();
            ctx.set_overlay(0.0);
        }
    }
}
