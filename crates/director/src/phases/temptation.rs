use async_trait::async_trait;
use aurora_core::content::temptation::{self, Temptation};
use aurora_core::content::Line;
use aurora_core::PhaseId;
use serde_json::json;
use tracing::debug;

use super::{open_portal, payload, set_stage};
use crate::core::{PhaseContext, PhaseScript};
use crate::error::PhaseResult;
use crate::interaction::{Direction, GateOutcome, GatePolicy, Interaction, PlayerInput};
use crate::surfaces::{BoardView, ToastKind};

/// Square grid the player walks with the arrow keys.
///
/// There is no exit cell; the forest only ends when the player asks for help.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maze {
    size: usize,
    player: (usize, usize),
    moves: u32,
}

impl Maze {
    pub fn new(size: usize) -> Self {
        Self {
            size: size.max(1),
            player: (0, 0),
            moves: 0,
        }
    }

    /// Moves one cell. Returns `false` when the move would leave the grid.
    pub fn step(&mut self, direction: Direction) -> bool {
        let (dx, dy) = direction.delta();
        let x = self.player.0 as i64 + dx as i64;
        let y = self.player.1 as i64 + dy as i64;
        let limit = self.size as i64;
        if !(0..limit).contains(&x) || !(0..limit).contains(&y) {
            return false;
        }
        self.player = (x as usize, y as usize);
        self.moves += 1;
        true
    }

    /// Sends the player one cell back along both axes.
    pub fn regress(&mut self) {
        self.player = (
            self.player.0.saturating_sub(1),
            self.player.1.saturating_sub(1),
        );
    }

    pub fn position(&self) -> (usize, usize) {
        self.player
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn view(&self) -> BoardView {
        BoardView {
            size: self.size,
            player: self.player,
        }
    }
}

/// The maze of whispering voices.
#[derive(Debug)]
pub struct TemptationPhase {
    maze: Maze,
    asked_for_help: bool,
    wrong_turns: u32,
}

impl Default for TemptationPhase {
    fn default() -> Self {
        Self {
            maze: Maze::new(temptation::MAZE_SIZE),
            asked_for_help: false,
            wrong_turns: 0,
        }
    }
}

impl TemptationPhase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two voices, one after the other, then the choice. The wrong one
    /// costs ground.
    async fn listen(&mut self, ctx: &PhaseContext, voices: &Temptation) -> PhaseResult<()> {
        ctx.sfx("whisper");
        ctx.pause(temptation::WHISPER_LEAD_MS).await?;
        ctx.narrate(&Line::new(voices.voice, temptation::VOICE_HOLD_MS)).await?;
        ctx.pause(temptation::VOICE_GAP_MS).await?;
        ctx.narrate(&Line::new(voices.truth, temptation::TRUTH_HOLD_MS)).await?;

        let gate = Interaction::choice([temptation::FOLLOW_FIRST, temptation::FOLLOW_SECOND]);
        let outcome = ctx.gate(gate, GatePolicy::give_up()).await?;

        let wise = if voices.leads_to_progress { 0 } else { 1 };
        match outcome {
            GateOutcome::Responded(PlayerInput::Select(index)) if index == wise => {
                ctx.toast(temptation::PATH_OPENS, ToastKind::Success);
            }
            GateOutcome::Responded(PlayerInput::Select(_)) => {
                self.wrong_turns += 1;
                self.maze.regress();
                ctx.board(&self.maze.view());
                ctx.toast(temptation::WENT_ASTRAY, ToastKind::Error);
            }
            _ => {}
        }
        Ok(())
    }

    /// Walks the maze until every voice has spoken or the player asks for help.
    async fn wander(&mut self, ctx: &PhaseContext) -> PhaseResult<()> {
        let mut voices = temptation::TEMPTATIONS.iter();
        if let Some(first) = voices.next() {
            self.listen(ctx, first).await?;
        }
        let mut since_last = 0;

        loop {
            match ctx.gate(Interaction::Directional, GatePolicy::give_up()).await? {
                GateOutcome::Responded(PlayerInput::Move(direction)) => {
                    if !self.maze.step(direction) {
                        ctx.sfx("bump");
                        continue;
                    }
                    ctx.sfx("step");
                    ctx.board(&self.maze.view());
                    since_last += 1;
                    if since_last < temptation::MOVES_PER_TEMPTATION {
                        continue;
                    }
                    since_last = 0;
                    match voices.next() {
                        Some(next) => self.listen(ctx, next).await?,
                        None => return Ok(()),
                    }
                }
                GateOutcome::Responded(_) => {}
                GateOutcome::TimedOut | GateOutcome::GaveUp => {
                    self.asked_for_help = true;
                    return Ok(());
                }
            }
        }
    }
}

#[async_trait]
impl PhaseScript for TemptationPhase {
    fn phase(&self) -> PhaseId {
        PhaseId::TEMPTATION
    }

    async fn initialize(&mut self, ctx: &PhaseContext) -> PhaseResult<()> {
        set_stage(ctx);
        ctx.board(&self.maze.view());
        ctx.narrate_all(temptation::INTRO).await?;

        self.wander(ctx).await?;

        if !self.asked_for_help {
            ctx.narrate_all(temptation::NO_EXIT).await?;
            ctx.gate(
                Interaction::confirm(temptation::HELP_LABEL),
                GatePolicy::give_up(),
            )
            .await?;
            self.asked_for_help = true;
        }
        debug!(
            moves = self.maze.moves(),
            wrong_turns = self.wrong_turns,
            "Left the maze"
        );

        ctx.hide_board();
        ctx.narrate_all(temptation::RESCUE).await?;
        open_portal(ctx).await?;

        ctx.finish(payload(json!({
            "askedForHelp": self.asked_for_help,
            "wrongTurns": self.wrong_turns,
            "moves": self.maze.moves(),
        })))
        .await
    }
}
