use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::cell::Cell;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::api::{ApiError, ExecuteRequest, RuntimeApi};
use crate::config::AppConfig;
use crate::console::execution::{spawn_execution, ExecutionOutcome};
use crate::console::status::spawn_refresh;
use crate::console::{
    outcome_lines, Clock, OutputLine, OutputLog, StatusPanel, StatusPoller, StatusSnapshot,
    SubmitControl, Tab, Viewport,
};
use crate::theme::Theme;

/// How long a status message stays in the footer
const STATUS_MESSAGE_SECS: u64 = 3;

/// Rows moved by PageUp/PageDown in the output log
const SCROLL_PAGE: usize = 10;

/// Results delivered back to the UI loop from background tasks
#[derive(Debug)]
pub enum AppEvent {
    ExecutionFinished(ExecutionOutcome),
    StatusRefreshed(Result<StatusSnapshot, ApiError>),
}

pub struct App {
    pub tab: Tab,
    pub show_help: bool,
    pub should_quit: bool,

    // REPL tab
    pub input: String,
    pub submit: SubmitControl,
    pub output: OutputLog,

    // Status tab
    pub status_panel: StatusPanel,

    // Header / footer
    pub clock: Clock,
    pub base_url: String,
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,

    pub theme: Theme,

    /// Size of the output panel at the last draw, used for paging
    pub log_viewport: Cell<Viewport>,

    api: Arc<dyn RuntimeApi>,
    poller: StatusPoller,
    exec_timeout: f64,
    client_timeout: Duration,
    initial_refresh_delay: Duration,
    last_clock_tick: Instant,

    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    pub fn new(api: Arc<dyn RuntimeApi>, config: &AppConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let poller = StatusPoller::new(Arc::clone(&api), config.poll_interval(), events_tx.clone());

        Self {
            tab: Tab::default(),
            show_help: false,
            should_quit: false,

            input: String::new(),
            submit: SubmitControl::default(),
            output: OutputLog::new(config.max_output_lines),

            status_panel: StatusPanel::default(),

            clock: Clock::new(&config.clock_format),
            base_url: config.base_url.clone(),
            status_message: None,
            status_message_time: None,

            theme: Theme::from_config(config.theme.as_ref()),
            log_viewport: Cell::new(Viewport::new(SCROLL_PAGE, 0)),

            api,
            poller,
            exec_timeout: config.exec_timeout_secs,
            client_timeout: config.client_timeout(),
            initial_refresh_delay: config.initial_refresh_delay(),
            last_clock_tick: Instant::now(),

            events_tx,
            events_rx,
        }
    }

    /// Kick off background work. Must run inside the tokio runtime.
    pub fn start(&mut self, initial_tab: Tab) {
        spawn_refresh(
            Arc::clone(&self.api),
            self.initial_refresh_delay,
            self.events_tx.clone(),
        );
        self.select_tab(initial_tab);
    }

    /// Set a status message (auto-clears after a few seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    pub fn is_active(&self, tab: Tab) -> bool {
        self.tab == tab
    }

    pub fn poller_running(&self) -> bool {
        self.poller.is_running()
    }

    /// Make `tab` the only active tab. The status poller runs exactly while
    /// the status tab is showing.
    pub fn select_tab(&mut self, tab: Tab) {
        let previous = self.tab;
        self.tab = tab;

        if tab == Tab::Status {
            if previous == Tab::Status && self.poller.is_running() {
                // Re-selecting the open tab just refreshes
                self.refresh_status();
            } else {
                self.poller.start();
            }
        } else if previous == Tab::Status {
            self.poller.stop();
        }

        tracing::debug!("Selected tab {}", tab);
    }

    pub fn refresh_status(&mut self) {
        spawn_refresh(Arc::clone(&self.api), Duration::ZERO, self.events_tx.clone());
    }

    /// Submit the current input. Returns false when nothing was sent.
    pub fn submit(&mut self) -> bool {
        if !self.submit.enabled {
            return false;
        }

        let code = self.input.trim().to_string();
        if code.is_empty() {
            return false;
        }

        self.submit.begin();
        self.output.push(OutputLine::input(code.clone()));
        self.output.scroll_to_bottom();

        let request = ExecuteRequest::new(code).with_timeout(self.exec_timeout);
        spawn_execution(
            Arc::clone(&self.api),
            request,
            self.client_timeout,
            self.events_tx.clone(),
        );
        true
    }

    fn finish_execution(&mut self, outcome: ExecutionOutcome) {
        self.output.extend(outcome_lines(&outcome));

        match &outcome {
            Ok(resp) => {
                if let Some(ms) = resp.execution_time_ms {
                    self.set_status(format!("Executed in {:.1} ms", ms));
                }
                if let Some(id) = &resp.request_id {
                    tracing::debug!("Execution {} finished (success: {})", id, resp.success);
                }
            }
            Err(e) => tracing::warn!("Execution failed: {}", e),
        }

        self.output.scroll_to_bottom();
        self.submit.finish();
        self.input.clear();
    }

    pub fn clear_output(&mut self) {
        self.output.clear();
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ExecutionFinished(outcome) => self.finish_execution(outcome),
            AppEvent::StatusRefreshed(Ok(snapshot)) => {
                self.status_panel.apply(&snapshot, self.clock.display());
            }
            AppEvent::StatusRefreshed(Err(_)) => self.status_panel.apply_error(),
        }
    }

    /// Apply every event that is already waiting, without blocking
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }
    }

    /// Wait for the next background result
    #[cfg(test)]
    pub async fn next_event(&mut self) -> Option<AppEvent> {
        self.events_rx.recv().await
    }

    pub fn tick(&mut self) {
        if self.last_clock_tick.elapsed() >= Duration::from_secs(1) {
            self.clock.update();
            self.last_clock_tick = Instant::now();
        }

        if let Some(time) = self.status_message_time {
            if time.elapsed().as_secs() >= STATUS_MESSAGE_SECS {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Ok(());
        }

        if self.show_help {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Enter
            ) {
                self.show_help = false;
            }
            return Ok(());
        }

        // Tab switching works everywhere
        match key.code {
            KeyCode::Tab => {
                self.select_tab(self.tab.next());
                return Ok(());
            }
            KeyCode::BackTab => {
                self.select_tab(self.tab.prev());
                return Ok(());
            }
            KeyCode::F(n @ 1..=3) => {
                self.select_tab(Tab::ALL[n as usize - 1]);
                return Ok(());
            }
            _ => {}
        }

        match self.tab {
            Tab::Repl => self.handle_repl_key(key),
            Tab::Api | Tab::Status => self.handle_view_key(key),
        }
        Ok(())
    }

    fn handle_repl_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Enter if ctrl => {
                self.submit();
            }
            KeyCode::F(5) => {
                self.submit();
            }
            KeyCode::Char('e') if ctrl => {
                self.submit();
            }
            KeyCode::Char('l') if ctrl => self.clear_output(),
            KeyCode::Char('u') if ctrl => self.input.clear(),
            KeyCode::Char(_) if ctrl => {}
            KeyCode::Char(c) => self.input.push(c),
            KeyCode::Enter => self.input.push('\n'),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::PageUp => self.output.scroll_up(SCROLL_PAGE, self.log_viewport.get()),
            KeyCode::PageDown => self.output.scroll_down(SCROLL_PAGE, self.log_viewport.get()),
            KeyCode::End => self.output.scroll_to_bottom(),
            _ => {}
        }
    }

    fn handle_view_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('?') | KeyCode::Char('h') => self.show_help = true,
            KeyCode::Char('r') if self.tab == Tab::Status => {
                self.refresh_status();
                self.set_status("Refreshing status...");
            }
            _ => {}
        }
    }
}
