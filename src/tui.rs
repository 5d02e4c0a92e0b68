use std::io::{self, Stdout};

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::App;
use crate::error::Result;
use crate::ui;

/// Terminal wrapper that owns raw mode, the alternate screen and mouse capture.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    mouse_enabled: bool,
}

impl Tui {
    /// Enter raw mode and the alternate screen. Mouse capture is needed for
    /// click and drag-to-reorder.
    pub fn new(enable_mouse: bool) -> Result<Self> {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen)?;
        if enable_mouse {
            execute!(stdout, EnableMouseCapture)?;
        }
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        tracing::debug!(mouse = enable_mouse, "terminal initialized");
        Ok(Self {
            terminal,
            mouse_enabled: enable_mouse,
        })
    }

    /// Draw one frame of the application.
    pub fn draw(&mut self, app: &mut App) -> Result<()> {
        self.terminal.draw(|frame| ui::render(app, frame))?;
        Ok(())
    }

    /// Restore the terminal to its original state.
    pub fn restore(&mut self) -> Result<()> {
        leave_terminal(self.mouse_enabled)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

fn leave_terminal(mouse_enabled: bool) -> io::Result<()> {
    if mouse_enabled {
        execute!(io::stdout(), DisableMouseCapture)?;
    }
    terminal::disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)
}

/// Install a panic hook that restores the terminal before printing panic info.
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Disabling capture that was never enabled is harmless.
        let _ = leave_terminal(true);
        tracing::error!(%panic_info, "panic");
        original_hook(panic_info);
    }));
}
