// Copyright (c) 2026 rezky_nightky

use std::io::{stdout, Result, Stdout, Write};
use std::time::Duration;

use crossterm::{
    cursor, event,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, ExecutableCommand, QueueableCommand,
};

use crate::frame::{Cell, Frame};

#[derive(Default)]
struct Pen {
    fg: Option<Color>,
    bg: Option<Color>,
    bold: bool,
    pos: Option<(u16, u16)>,
}

pub struct Terminal {
    stdout: Stdout,
    size: Option<(u16, u16)>,
    run: String,
}

fn leave(out: &mut Stdout) {
    let _ = out.execute(SetAttribute(Attribute::Reset));
    let _ = out.execute(ResetColor);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}

impl Terminal {
    pub fn new() -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init: Result<()> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            let _ = out.execute(terminal::DisableLineWrap);
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()
        })();
        if let Err(e) = init {
            leave(&mut out);
            return Err(e);
        }
        Ok(Self {
            stdout: out,
            size: None,
            run: String::with_capacity(64),
        })
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        terminal::size()
    }

    pub fn poll_event(timeout: Duration) -> Result<bool> {
        event::poll(timeout)
    }

    pub fn read_event() -> Result<event::Event> {
        event::read()
    }

    fn apply(&mut self, pen: &mut Pen, cell: &Cell) -> Result<()> {
        if cell.fg != pen.fg {
            self.stdout
                .queue(SetForegroundColor(cell.fg.unwrap_or(Color::Reset)))?;
            pen.fg = cell.fg;
        }
        if cell.bg != pen.bg {
            self.stdout
                .queue(SetBackgroundColor(cell.bg.unwrap_or(Color::Reset)))?;
            pen.bg = cell.bg;
        }
        if cell.bold != pen.bold {
            self.stdout.queue(SetAttribute(if cell.bold {
                Attribute::Bold
            } else {
                Attribute::NormalIntensity
            }))?;
            pen.bold = cell.bold;
        }
        Ok(())
    }

    pub fn draw(&mut self, frame: &mut Frame) -> Result<()> {
        let dims = (frame.width, frame.height);
        let resized = self.size != Some(dims);
        if resized {
            self.stdout
                .queue(terminal::Clear(terminal::ClearType::All))?;
            self.size = Some(dims);
        }

        let total = frame.width as usize * frame.height as usize;
        let full = resized || frame.is_dirty_all() || frame.dirty_indices().len() * 3 >= total;

        let mut dirty: Vec<usize> = if full {
            (0..total).collect()
        } else {
            frame.dirty_indices().to_vec()
        };
        dirty.sort_unstable();

        self.stdout.queue(terminal::BeginSynchronizedUpdate)?;
        let mut pen = Pen::default();
        self.stdout.queue(ResetColor)?;

        let width = frame.width as usize;
        let mut i = 0;
        while i < dirty.len() {
            let start = dirty[i];
            let first = frame.cell_at_index(start);
            let (x0, y0) = ((start % width) as u16, (start / width) as u16);

            self.run.clear();
            self.run.push(first.ch);
            let mut j = i + 1;
            while j < dirty.len() {
                let idx = dirty[j];
                if idx != dirty[j - 1] + 1 || idx % width == 0 {
                    break;
                }
                let c = frame.cell_at_index(idx);
                if c.fg != first.fg || c.bg != first.bg || c.bold != first.bold {
                    break;
                }
                self.run.push(c.ch);
                j += 1;
            }

            if pen.pos != Some((x0, y0)) {
                self.stdout.queue(cursor::MoveTo(x0, y0))?;
            }
            self.apply(&mut pen, &first)?;
            self.stdout.queue(Print(self.run.as_str()))?;

            let next_x = x0 as usize + (j - i);
            pen.pos = (next_x < width).then_some((next_x as u16, y0));
            i = j;
        }

        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.queue(terminal::EndSynchronizedUpdate)?;
        self.stdout.flush()?;
        frame.clear_dirty();
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        leave(&mut self.stdout);
    }
}

pub fn restore_terminal_best_effort() {
    leave(&mut stdout());
}
