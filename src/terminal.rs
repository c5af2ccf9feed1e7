use anyhow::Context;
use crossterm::{
    cursor,
    terminal::{self, ClearType},
    ExecutableCommand,
};
use std::io::{stdout, Stdout, Write};

/// Raw mode + alternate screen for the lifetime of the guard.
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn new() -> anyhow::Result<Self> {
        terminal::enable_raw_mode().context("enable raw mode")?;
        // Constructed before the remaining steps so Drop restores on failure.
        let guard = Self { _private: () };

        let mut out = stdout();
        out.execute(terminal::EnterAlternateScreen)
            .context("enter alternate screen")?;
        out.execute(terminal::Clear(ClearType::All))
            .context("clear screen")?;
        out.execute(cursor::Hide).context("hide cursor")?;
        tracing::debug!("terminal ui entered");

        Ok(guard)
    }

    pub fn stdout() -> Stdout {
        stdout()
    }
}

/// Undo everything a painter may have left switched on: synchronized output,
/// disabled autowrap, colours.
fn reset_modes(out: &mut impl Write) {
    let _ = out.write_all(b"\x1b[?2026l\x1b[?7h\x1b[0m");
    let _ = out.flush();
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let mut out = stdout();
        reset_modes(&mut out);
        let _ = out.execute(cursor::Show);
        let _ = out.execute(terminal::LeaveAlternateScreen);
        tracing::debug!("terminal ui left");
    }
}
