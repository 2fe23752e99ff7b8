// Boundaries the engine talks to: something that paints cells, something that
// shows round messages, and something that shows scores.
//
// The implementations here are in-process: FrameBuffer and Scoreboard keep their
// state behind an Arc<RwLock<..>> so the control server can read what the
// session task last wrote.

use log::info;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::grid::Grid;
use crate::types::Cell;

/// Paints cells. `draw_all` follows a full clear, `draw_dirty` follows every tick.
pub trait RenderSink: Send {
    fn draw_cell(&mut self, x: i32, y: i32, color: Cell);

    fn draw_all(&mut self, grid: &Grid) {
        for index in 0..grid.len() {
            if let Some(c) = grid.coord_of(index) {
                self.draw_cell(c.x, c.y, grid.get(c.x, c.y));
            }
        }
    }

    fn draw_dirty(&mut self, indices: &[usize], grid: &Grid) {
        for &index in indices {
            if let Some(c) = grid.coord_of(index) {
                self.draw_cell(c.x, c.y, grid.get(c.x, c.y));
            }
        }
    }
}

/// Receives human-readable round events ("GO!", "Player 1 Dies!", ...)
pub trait MessageSink: Send {
    fn display_message(&mut self, text: &str);
}

/// Receives a player's score every time it changes
pub trait ScoreSink: Send + Sync {
    fn update_score(&self, player_id: usize, score: u32);
}

/// Discards every draw call
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl RenderSink for NullRenderer {
    fn draw_cell(&mut self, _x: i32, _y: i32, _color: Cell) {}
    fn draw_all(&mut self, _grid: &Grid) {}
    fn draw_dirty(&mut self, _indices: &[usize], _grid: &Grid) {}
}

/// Writes messages through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMessages;

impl MessageSink for LogMessages {
    fn display_message(&mut self, text: &str) {
        info!("{}", text);
    }
}

impl MessageSink for Vec<Box<dyn MessageSink>> {
    fn display_message(&mut self, text: &str) {
        for sink in self.iter_mut() {
            sink.display_message(text);
        }
    }
}

#[derive(Debug, Default)]
struct FrameState {
    width: i32,
    height: i32,
    pixels: Vec<u32>,
    full_redraws: u64,
    incremental_redraws: u64,
    cells_painted: u64,
}

/// Readable copy of a FrameBuffer
#[derive(Debug, Clone, Serialize)]
pub struct FrameView {
    pub width: i32,
    pub height: i32,
    /// One string per row, each pixel as `#RRGGBB` separated by spaces
    pub rows: Vec<String>,
    pub full_redraws: u64,
    pub incremental_redraws: u64,
    pub cells_painted: u64,
}

/// Mirrors the colours of the grid into shared memory
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    state: Arc<RwLock<FrameState>>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer::default()
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Cell> {
        let state = self.state.read();
        if x < 0 || y < 0 || x >= state.width || y >= state.height {
            return None;
        }
        state
            .pixels
            .get((y * state.width + x) as usize)
            .map(|&p| Cell::unpack(p))
    }

    pub fn cells_painted(&self) -> u64 {
        self.state.read().cells_painted
    }

    pub fn full_redraws(&self) -> u64 {
        self.state.read().full_redraws
    }

    pub fn incremental_redraws(&self) -> u64 {
        self.state.read().incremental_redraws
    }

    pub fn view(&self) -> FrameView {
        let state = self.state.read();
        let rows = if state.width > 0 {
            state
                .pixels
                .chunks(state.width as usize)
                .map(|row| {
                    row.iter()
                        .map(|&p| Cell::unpack(p).hex())
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect()
        } else {
            Vec::new()
        };

        FrameView {
            width: state.width,
            height: state.height,
            rows,
            full_redraws: state.full_redraws,
            incremental_redraws: state.incremental_redraws,
            cells_painted: state.cells_painted,
        }
    }
}

impl FrameState {
    fn paint(&mut self, x: i32, y: i32, color: Cell) {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return;
        }
        let index = (y * self.width + x) as usize;
        if let Some(pixel) = self.pixels.get_mut(index) {
            *pixel = color.without_flags().pack();
            self.cells_painted += 1;
        }
    }
}

impl RenderSink for FrameBuffer {
    fn draw_cell(&mut self, x: i32, y: i32, color: Cell) {
        self.state.write().paint(x, y, color);
    }

    fn draw_all(&mut self, grid: &Grid) {
        let mut state = self.state.write();
        state.width = grid.width();
        state.height = grid.height();
        state.pixels = grid.cells().iter().map(|c| c.without_flags().pack()).collect();
        state.cells_painted += grid.len() as u64;
        state.full_redraws += 1;
    }

    fn draw_dirty(&mut self, indices: &[usize], grid: &Grid) {
        let mut state = self.state.write();
        if state.width != grid.width() || state.height != grid.height() {
            // Never had a full draw for this geometry
            drop(state);
            self.draw_all(grid);
            return;
        }
        for &index in indices {
            if let Some(c) = grid.coord_of(index) {
                state.paint(c.x, c.y, grid.get(c.x, c.y));
            }
        }
        state.incremental_redraws += 1;
    }
}

const MESSAGE_HISTORY: usize = 32;

#[derive(Debug, Default)]
struct ScoreboardState {
    message: Option<String>,
    history: VecDeque<String>,
    scores: Vec<u32>,
}

/// Latest message, recent message history and per-player scores
#[derive(Debug, Clone, Default)]
pub struct Scoreboard {
    state: Arc<RwLock<ScoreboardState>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreboardView {
    pub message: Option<String>,
    pub history: Vec<String>,
    pub scores: Vec<u32>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Scoreboard::default()
    }

    pub fn message(&self) -> Option<String> {
        self.state.read().message.clone()
    }

    pub fn history(&self) -> Vec<String> {
        self.state.read().history.iter().cloned().collect()
    }

    pub fn score(&self, player_id: usize) -> Option<u32> {
        self.state.read().scores.get(player_id).copied()
    }

    pub fn view(&self) -> ScoreboardView {
        let state = self.state.read();
        ScoreboardView {
            message: state.message.clone(),
            history: state.history.iter().cloned().collect(),
            scores: state.scores.clone(),
        }
    }
}

impl MessageSink for Scoreboard {
    fn display_message(&mut self, text: &str) {
        let mut state = self.state.write();
        if state.history.len() == MESSAGE_HISTORY {
            state.history.pop_front();
        }
        state.history.push_back(text.to_string());
        state.message = Some(text.to_string());
    }
}

impl ScoreSink for Scoreboard {
    fn update_score(&self, player_id: usize, score: u32) {
        let mut state = self.state.write();
        if state.scores.len() <= player_id {
            state.scores.resize(player_id + 1, 0);
        }
        state.scores[player_id] = score;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_buffer_full_then_incremental() {
        let mut grid = Grid::new(3, 2, Cell::with_color(1, 2, 3));
        let mut fb = FrameBuffer::new();
        fb.draw_all(&grid);
        assert_eq!(fb.pixel(2, 1), Some(Cell::with_color(1, 2, 3)));

        grid.set(2, 1, Cell::new(1, 255, 0, 0));
        let dirty = grid.drain_dirty();
        fb.draw_dirty(&dirty, &grid);
        assert_eq!(fb.pixel(2, 1), Some(Cell::with_color(255, 0, 0)));
        assert_eq!(fb.full_redraws(), 1);
        assert_eq!(fb.incremental_redraws(), 1);
        assert_eq!(fb.cells_painted(), 7);
        assert_eq!(fb.view().rows[1], "#010203 #010203 #FF0000");
    }

    #[test]
    fn test_scoreboard_tracks_messages_and_scores() {
        let mut board = Scoreboard::new();
        board.display_message("GO!");
        board.display_message("Player 1 Dies!");
        board.update_score(2, 5);
        assert_eq!(board.message().as_deref(), Some("Player 1 Dies!"));
        assert_eq!(board.history(), vec!["GO!", "Player 1 Dies!"]);
        assert_eq!(board.score(2), Some(5));
        assert_eq!(board.score(0), Some(0));
        assert_eq!(board.score(3), None);
    }

    #[test]
    fn test_scoreboard_history_is_bounded() {
        let mut board = Scoreboard::new();
        for i in 0..(MESSAGE_HISTORY + 5) {
            board.display_message(&format!("m{}", i));
        }
        let history = board.history();
        assert_eq!(history.len(), MESSAGE_HISTORY);
        assert_eq!(history[0], "m5");
    }
}
