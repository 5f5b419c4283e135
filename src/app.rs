use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::loader::Loader;
use crate::script::Script;
use crate::ui::{TerminalGuard, TimelineScreen};

pub struct App {
    config: Config,
    loader: Loader,
    screen: TimelineScreen,
    should_quit: bool,
    /// Wall-clock time since mount at which the last step finished
    finished_at: Option<Duration>,
}

impl App {
    pub fn new(config: Config, script: Script) -> Result<Self> {
        let timing = config.timing.to_timing()?;
        let loader = Loader::mount(script, timing)?;
        let screen = TimelineScreen::new(&config.ui);

        Ok(Self {
            config,
            loader,
            screen,
            should_quit: false,
            finished_at: None,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut guard = TerminalGuard::enter()?;
        let started = Instant::now();
        let frame_rate = Duration::from_millis(self.config.ui.frame_rate_ms.max(1));

        while !self.should_quit {
            let elapsed = started.elapsed();
            self.loader.advance_to(elapsed);

            guard
                .terminal()
                .draw(|f| self.screen.draw(f, &mut self.loader, elapsed))?;

            // Wake for the next frame or the next timer, whichever is sooner
            let timeout = self
                .loader
                .next_deadline()
                .map(|deadline| deadline.saturating_sub(started.elapsed()).min(frame_rate))
                .unwrap_or(frame_rate);

            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }

            self.check_finished(started.elapsed());
        }

        // Tear down before the terminal goes away so no timer outlives the screen
        self.loader.unmount();
        guard.restore();

        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            _ => {}
        }
    }

    /// Quit after the configured linger once the sequence has halted
    fn check_finished(&mut self, elapsed: Duration) {
        let linger = self.config.ui.exit_after_finish_ms;
        if linger == 0 || !self.loader.is_halted() {
            return;
        }

        let finished_at = *self.finished_at.get_or_insert(elapsed);
        if elapsed.saturating_sub(finished_at) >= Duration::from_millis(linger) {
            tracing::info!("Exiting after research sequence finished");
            self.should_quit = true;
        }
    }
}
