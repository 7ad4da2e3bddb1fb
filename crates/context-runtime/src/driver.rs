//! # Context Driver
//!
//! Runs one [`ExecutionContext`] on its own tokio task: pumps the transport
//! on a fixed interval, executes commands from the owner, and stops on the
//! shared shutdown signal.

use crate::context::{ContextReport, ExecutionContext};
use crate::error::RuntimeError;
use lt_03_trigger_automaton::{ContextPhase, Milestone};
use shared_types::TabId;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Instructions for a running context.
#[derive(Debug)]
pub enum ContextCommand {
    Milestone(Milestone),
    Hide,
    Show,
    /// Pump once, then reply with the current status.
    Inspect(oneshot::Sender<ContextStatus>),
    /// Stop this context only.
    Close,
}

/// Point-in-time view of a running context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextStatus {
    pub tab: TabId,
    pub phase: ContextPhase,
    pub visible: bool,
    pub transitions_applied: u64,
}

/// Owner's handle to a context task.
pub struct ContextHandle {
    tab: TabId,
    commands: mpsc::UnboundedSender<ContextCommand>,
    task: JoinHandle<ContextReport>,
}

impl ContextHandle {
    /// Move `context` onto its own task.
    pub fn spawn(
        context: ExecutionContext,
        pump_interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let tab = context.tab();
        let (commands, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(context, rx, shutdown, pump_interval));
        Self {
            tab,
            commands,
            task,
        }
    }

    #[must_use]
    pub fn tab(&self) -> TabId {
        self.tab
    }

    /// Queue a command.
    ///
    /// # Errors
    ///
    /// `RuntimeError::Closed` if the task has stopped.
    pub fn send(&self, command: ContextCommand) -> Result<(), RuntimeError> {
        self.commands
            .send(command)
            .map_err(|_| RuntimeError::Closed(self.tab))
    }

    pub fn milestone(&self, milestone: Milestone) -> Result<(), RuntimeError> {
        self.send(ContextCommand::Milestone(milestone))
    }

    /// Pump, then report status. Waiting on this also guarantees every
    /// command queued before it has run.
    pub async fn status(&self) -> Result<ContextStatus, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(ContextCommand::Inspect(tx))?;
        rx.await.map_err(|_| RuntimeError::Closed(self.tab))
    }

    /// Wait for the task to stop and collect its report.
    pub async fn join(self) -> Result<ContextReport, RuntimeError> {
        self.task.await.map_err(|e| {
            warn!(tab = %self.tab, error = %e, "Context task failed");
            RuntimeError::Closed(self.tab)
        })
    }
}

async fn run(
    mut context: ExecutionContext,
    mut commands: mpsc::UnboundedReceiver<ContextCommand>,
    mut shutdown: watch::Receiver<bool>,
    pump_interval: Duration,
) -> ContextReport {
    let tab = context.tab();
    let mut ticker = tokio::time::interval(pump_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                context.pump();
            }
            command = commands.recv() => match command {
                Some(ContextCommand::Close) | None => break,
                Some(command) => execute(&mut context, command),
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!(tab = %tab, "Shutdown signal received");
                    break;
                }
            }
        }
    }

    // Last chance to act on anything already delivered.
    context.pump();
    context.close()
}

fn execute(context: &mut ExecutionContext, command: ContextCommand) {
    match command {
        ContextCommand::Milestone(milestone) => {
            context.milestone(&milestone);
        }
        ContextCommand::Hide => context.hide(),
        ContextCommand::Show => {
            context.show();
        }
        ContextCommand::Inspect(reply) => {
            context.pump();
            let status = ContextStatus {
                tab: context.tab(),
                phase: context.phase(),
                visible: context.is_visible(),
                transitions_applied: context.transitions_applied(),
            };
            if reply.send(status).is_err() {
                debug!(tab = %context.tab(), "Status requester went away");
            }
        }
        ContextCommand::Close => {}
    }
}
