//! # Scripted Playthrough
//!
//! Drives every level to completion through real context tasks, the way a
//! player moving between tabs would:
//!
//! 1. Tabs 1-3 open and play in order.
//! 2. Tab 1 goes to the background before tab 3 carries the light back,
//!    and catches up when shown again.
//! 3. Tab 4 opens only after the bonus was picked up and absorbs it on load.
//! 4. Tab 5 finishes the game; every open tab shows the finale.

use crate::context::ContextReport;
use crate::driver::{ContextCommand, ContextHandle, ContextStatus};
use crate::error::RuntimeError;
use crate::host::Host;
use crate::sink::{CollaboratorSink, TracingSink};
use lt_03_trigger_automaton::levels::DARK_ROOM_EDGE_TILE;
use lt_03_trigger_automaton::Milestone;
use shared_types::{GameState, TabId};
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

/// Outcome of a playthrough.
#[derive(Debug, Clone)]
pub struct PlaythroughReport {
    /// Status of each context just before shutdown, by tab.
    pub statuses: Vec<ContextStatus>,
    /// Final report of each context, by tab.
    pub contexts: Vec<ContextReport>,
    /// Document after every context stopped.
    pub state: GameState,
}

/// Builds a sink for each context opened by the playthrough.
pub type SinkFactory = dyn Fn(TabId) -> Box<dyn CollaboratorSink>;

/// Run the scripted playthrough on `host`, logging side effects.
pub async fn run_playthrough(host: &Host) -> Result<PlaythroughReport, RuntimeError> {
    let sinks = |_: TabId| -> Box<dyn CollaboratorSink> { Box::new(TracingSink) };
    run_playthrough_with(host, &sinks).await
}

/// Run the scripted playthrough, delivering side effects to sinks from
/// `sinks`.
pub async fn run_playthrough_with(
    host: &Host,
    sinks: &SinkFactory,
) -> Result<PlaythroughReport, RuntimeError> {
    let pump_interval = Duration::from_millis(host.config().pump_interval_ms);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut session = Session {
        host,
        sinks,
        pump_interval,
        shutdown: shutdown_rx,
        handles: Vec::new(),
    };

    let one = session.open(TabId(1))?;
    session.play(one, [Milestone::TileReached(DARK_ROOM_EDGE_TILE)]).await?;

    let two = session.open(TabId(2))?;
    session.play(two, [Milestone::ItemCollected("flashlight".into())]).await?;

    let three = session.open(TabId(3))?;
    session
        .play(
            three,
            ["moon", "sun", "star"].map(|s| Milestone::SymbolFound(s.into())),
        )
        .await?;

    session.handles[one].send(ContextCommand::Hide)?;
    session.handles[one].status().await?;
    session.play(three, [Milestone::Backtracked { to: TabId(1) }]).await?;
    session.handles[one].send(ContextCommand::Show)?;
    session
        .play(
            one,
            [
                Milestone::ItemCollected("bonus-shard".into()),
                Milestone::ExitReached,
            ],
        )
        .await?;

    let four = session.open(TabId(4))?;
    session
        .play(
            four,
            ["c1", "c2", "c3"]
                .map(|s| Milestone::FragmentCollected(s.into()))
                .into_iter()
                .chain([Milestone::SequenceCompleted]),
        )
        .await?;

    let five = session.open(TabId(5))?;
    session
        .play(
            five,
            ["m1", "m2", "m3"]
                .map(|s| Milestone::FragmentCollected(s.into()))
                .into_iter()
                .chain([Milestone::SequenceCompleted]),
        )
        .await?;
    session.sync().await?;

    let statuses = session.sync().await?;
    info!(contexts = statuses.len(), "Playthrough finished, shutting down");

    // Receivers may already be gone if every task stopped on its own.
    let _ = shutdown_tx.send(true);
    let mut contexts = Vec::with_capacity(session.handles.len());
    for handle in session.handles {
        contexts.push(handle.join().await?);
    }

    Ok(PlaythroughReport {
        statuses,
        contexts,
        state: host.state(),
    })
}

struct Session<'a> {
    host: &'a Host,
    sinks: &'a SinkFactory,
    pump_interval: Duration,
    shutdown: watch::Receiver<bool>,
    handles: Vec<ContextHandle>,
}

impl Session<'_> {
    fn open(&mut self, tab: TabId) -> Result<usize, RuntimeError> {
        let context = self.host.open_with(tab, (self.sinks)(tab))?;
        self.handles
            .push(ContextHandle::spawn(context, self.pump_interval, self.shutdown.clone()));
        Ok(self.handles.len() - 1)
    }

    async fn play<I>(&self, index: usize, milestones: I) -> Result<(), RuntimeError>
    where
        I: IntoIterator<Item = Milestone>,
    {
        for milestone in milestones {
            self.handles[index].milestone(milestone)?;
            self.sync().await?;
        }
        Ok(())
    }

    /// Let every context act on what the others sent. Two passes: the
    /// first delivers, the second delivers whatever the first provoked.
    async fn sync(&self) -> Result<Vec<ContextStatus>, RuntimeError> {
        let mut statuses = Vec::new();
        for _ in 0..2 {
            statuses.clear();
            for handle in &self.handles {
                statuses.push(handle.status().await?);
            }
        }
        Ok(statuses)
    }
}
