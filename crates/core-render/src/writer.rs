//! Terminal writer: a short-lived command list flushed once per frame.
//!
//! Invariants:
//! * Commands preserve ordering; nothing is flushed mid-frame.
//! * Positions are absolute with a (0,0) origin.
//! * Attributes are reset before every style change and at the end of the
//!   frame, so no styling leaks into the next one.

use crate::{CellFlags, Frame};
use anyhow::Result;
use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Print, SetAttribute},
    terminal::{Clear, ClearType},
};
use std::io::{Write, stdout};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    MoveTo(u16, u16),
    /// Wipe the whole screen (after a resize).
    ClearAll,
    Style(CellFlags),
    Print(String),
}

#[derive(Default)]
pub struct Writer {
    cmds: Vec<Command>,
}

impl Writer {
    pub fn new() -> Self {
        Self { cmds: Vec::new() }
    }

    /// Row-major paint of every leader cell, coalescing runs with equal flags.
    pub fn from_frame(frame: &Frame) -> Self {
        let mut w = Self::new();
        let mut current = CellFlags::empty();
        for y in 0..frame.height {
            w.move_to(0, y);
            let mut run = String::new();
            for (cluster, _, flags, _) in frame.row_leaders(y) {
                if flags != current {
                    w.print(std::mem::take(&mut run));
                    w.style(flags);
                    current = flags;
                }
                run.push_str(cluster);
            }
            w.print(run);
        }
        if !current.is_empty() {
            w.style(CellFlags::empty());
        }
        w
    }

    pub fn move_to(&mut self, x: u16, y: u16) {
        self.cmds.push(Command::MoveTo(x, y));
    }

    pub fn style(&mut self, flags: CellFlags) {
        self.cmds.push(Command::Style(flags));
    }

    pub fn print<S: Into<String>>(&mut self, s: S) {
        let s: String = s.into();
        if !s.is_empty() {
            self.cmds.push(Command::Print(s));
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.cmds
    }

    /// Prepend a full clear; used for the first frame after a resize.
    pub fn with_clear(mut self) -> Self {
        self.cmds.insert(0, Command::ClearAll);
        self
    }

    pub fn flush(self) -> Result<()> {
        let mut out = stdout();
        self.flush_to(&mut out)
    }

    pub fn flush_to<W: Write>(self, out: &mut W) -> Result<()> {
        for c in self.cmds {
            match c {
                Command::MoveTo(x, y) => {
                    queue!(out, MoveTo(x, y))?;
                }
                Command::ClearAll => {
                    queue!(out, Clear(ClearType::All))?;
                }
                Command::Style(flags) => {
                    queue!(out, SetAttribute(Attribute::Reset))?;
                    if flags.contains(CellFlags::REVERSE) {
                        queue!(out, SetAttribute(Attribute::Reverse))?;
                    }
                    if flags.contains(CellFlags::BOLD) {
                        queue!(out, SetAttribute(Attribute::Bold))?;
                    }
                    if flags.contains(CellFlags::DIM) {
                        queue!(out, SetAttribute(Attribute::Dim))?;
                    }
                }
                Command::Print(s) => {
                    queue!(out, Print(s))?;
                }
            }
        }
        out.flush()?;
        Ok(())
    }
}
