//! Character-grid surface for headless runs

use std::io::Write;

use super::frame::{Frame, Overlay, RenderSurface};

const LANE_COLS: usize = 6;
const DEFAULT_ROWS: usize = 24;

/// Draws frames as ASCII art
///
/// Every frame is rasterized so `last()` always reflects the latest state,
/// but only every `every`th frame is written out.
pub struct TextSurface<W: Write + Send> {
    out: W,
    rows: usize,
    every: u32,
    frames: u64,
    last: String,
}

impl TextSurface<std::io::Stdout> {
    pub fn stdout(every: u32) -> Self {
        Self::new(std::io::stdout(), every)
    }
}

impl<W: Write + Send> TextSurface<W> {
    pub fn new(out: W, every: u32) -> Self {
        Self {
            out,
            rows: DEFAULT_ROWS,
            every: every.max(1),
            frames: 0,
            last: String::new(),
        }
    }

    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = rows.max(4);
        self
    }

    /// Most recently rasterized frame
    pub fn last(&self) -> &str {
        &self.last
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn row_of(&self, frame: &Frame, y: f32) -> Option<usize> {
        if !(0.0..frame.height).contains(&y) {
            return None;
        }
        let row = ((y / frame.height) * self.rows as f32) as usize;
        Some(row.min(self.rows - 1))
    }

    fn rasterize(&self, frame: &Frame) -> String {
        let cols = frame.lanes.len() * LANE_COLS;
        let mut grid = vec![vec![' '; cols]; self.rows];

        for row in grid.iter_mut() {
            for lane in 1..frame.lanes.len() {
                row[lane * LANE_COLS - 1] = '|';
            }
        }

        if let Some(line) = self.row_of(frame, frame.judgement_line_y) {
            for cell in grid[line].iter_mut().filter(|c| **c == ' ') {
                *cell = '-';
            }
        }

        if let Some(flash) = frame.flash {
            if let Some(line) = self.row_of(frame, frame.judgement_line_y) {
                let start = flash.lane * LANE_COLS;
                for cell in &mut grid[line][start..start + LANE_COLS - 1] {
                    *cell = '*';
                }
            }
        }

        for tile in &frame.tiles {
            let bottom = tile.top + tile.height;
            if bottom <= 0.0 {
                continue;
            }
            let Some(first) = self.row_of(frame, tile.top.max(0.0)) else {
                continue;
            };
            // Bodies reaching past the bottom edge fill the last row
            let last = self.row_of(frame, bottom).unwrap_or(self.rows - 1);
            let start = tile.lane * LANE_COLS;
            for row in &mut grid[first..=last] {
                for cell in &mut row[start + 1..start + LANE_COLS - 2] {
                    *cell = '#';
                }
            }
        }

        let hud = &frame.hud;
        let mut out = format!(
            "score {}  best {}  combo {}{}\n",
            hud.score,
            hud.best,
            hud.combo,
            if hud.combo_scale > 1.0 { "!" } else { "" }
        );
        for label in &frame.float_texts {
            out.push_str(label.judgement.as_str());
            out.push(' ');
        }
        out.push('\n');
        for row in grid {
            out.extend(row);
            out.push('\n');
        }
        match frame.overlay {
            Some(Overlay::Paused) => out.push_str("== PAUSED ==\n"),
            Some(Overlay::GameOver) => out.push_str("== GAME OVER ==\n"),
            None => {}
        }
        out
    }
}

impl<W: Write + Send> RenderSurface for TextSurface<W> {
    fn present(&mut self, frame: &Frame) {
        self.last = self.rasterize(frame);
        self.frames += 1;
        if self.frames % self.every as u64 == 0 {
            if let Err(e) = self.out.write_all(self.last.as_bytes()).and_then(|_| self.out.flush()) {
                log::warn!("Text surface write failed: {e}");
            }
        }
    }
}
