use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender, unbounded};
use crossterm::{
    event::{self, Event as CEvent, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::playback::{Backend, Driver, PlayerEvent, connect::ConnectDriver, preview::PreviewDriver};
use crate::playlists::Picker;
use crate::search::SearchBox;
use crate::server_api::ApiClient;
use crate::session::{ClipSource, GameController, Phase, PlaylistScope, SkipControl, SkipMode};
use crate::worker::{self, Command, Event};

use super::render;

const TRANSIENT_TTL: Duration = Duration::from_secs(3);

/// Everything `main` decides before the UI starts.
pub(crate) struct Options {
    pub(crate) server: String,
    pub(crate) backend: Backend,
    pub(crate) multi: bool,
    pub(crate) skip_mode: SkipMode,
    pub(crate) device: Option<String>,
    pub(crate) scope: Option<PlaylistScope>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Screen {
    Picker,
    Game,
}

/// Launch the TUI, spawn the network worker, and drive the event loop.
pub(crate) fn run_tui(opts: Options, log_rx: Receiver<String>) -> Result<()> {
    let api = ApiClient::new(&opts.server);
    let (cmd_tx, cmd_rx) = unbounded::<Command>();
    let (evt_tx, evt_rx) = unbounded::<Event>();
    std::thread::spawn(move || worker::worker_main(api, cmd_rx, evt_tx));

    let driver = match opts.backend {
        Backend::Preview => Driver::Preview(PreviewDriver::new(opts.device.as_deref())?),
        Backend::Connect => Driver::Connect(ConnectDriver::new()),
    };

    let mut app = App::new(opts, driver, cmd_tx, log_rx);
    app.boot();

    let mut term = init_terminal()?;
    let result = ui_loop(&mut term, &mut app, evt_rx);

    restore_terminal(&mut term)?;
    result
}

/// In-memory UI state for rendering + interaction.
pub(crate) struct App {
    pub(crate) server: String,
    pub(crate) backend: Backend,
    skip_mode: SkipMode,
    initial_scope: Option<PlaylistScope>,

    pub(crate) screen: Screen,
    pub(crate) picker: Picker,
    pub(crate) picker_loading: bool,
    pub(crate) picker_error: Option<String>,
    pub(crate) game: Option<GameController>,
    pub(crate) search: SearchBox,
    pub(crate) driver: Driver,
    cmd_tx: Sender<Command>,

    pub(crate) status: String,
    transient: Option<(String, Instant)>,
    pub(crate) playing: bool,
    pub(crate) device_label: Option<String>,
    pub(crate) confirm_skip: bool,

    pub(crate) logs_open: bool,
    pub(crate) logs: VecDeque<String>,
    pub(crate) logs_scroll: usize,
    log_rx: Receiver<String>,

    should_quit: bool,
}

impl App {
    fn new(opts: Options, driver: Driver, cmd_tx: Sender<Command>, log_rx: Receiver<String>) -> Self {
        let screen = if opts.scope.is_some() {
            Screen::Game
        } else {
            Screen::Picker
        };
        Self {
            server: opts.server,
            backend: opts.backend,
            skip_mode: opts.skip_mode,
            initial_scope: opts.scope,
            screen,
            picker: Picker::new(opts.multi),
            picker_loading: false,
            picker_error: None,
            game: None,
            search: SearchBox::new(),
            driver,
            cmd_tx,
            status: "Ready".into(),
            transient: None,
            playing: false,
            device_label: None,
            confirm_skip: false,
            logs_open: false,
            logs: VecDeque::new(),
            logs_scroll: 0,
            log_rx,
            should_quit: false,
        }
    }

    /// First commands: start straight away when a scope came from the CLI,
    /// else fetch the playlist list.
    fn boot(&mut self) {
        match self.initial_scope.take() {
            Some(scope) => self.start_game(scope),
            None => {
                self.picker_loading = true;
                self.cmd(Command::LoadPlaylists);
            }
        }
    }

    fn cmd(&self, command: Command) {
        self.cmd_tx.send(command).ok();
    }

    pub(crate) fn transient_text(&self) -> Option<&str> {
        self.transient.as_ref().map(|(text, _)| text.as_str())
    }

    fn set_transient(&mut self, text: String) {
        self.transient = Some((text, Instant::now()));
    }

    fn start_fail_hint(&self) -> &'static str {
        match self.backend {
            Backend::Preview => {
                "Failed to start game. The playlist may not have any tracks with previews."
            }
            Backend::Connect => {
                "Failed to start game. Playback needs a Premium account with an active device."
            }
        }
    }

    fn start_game(&mut self, scope: PlaylistScope) {
        self.screen = Screen::Game;
        self.search = SearchBox::new();
        self.playing = false;
        self.confirm_skip = false;
        if let Driver::Preview(d) = &mut self.driver {
            d.clear_media();
        }
        self.game = Some(GameController::new(scope.clone(), self.skip_mode));
        self.status = "Starting game...".into();
        self.cmd(Command::Start(scope));
    }

    fn to_picker(&mut self) {
        self.driver.stop();
        self.game = None;
        self.playing = false;
        self.confirm_skip = false;
        self.screen = Screen::Picker;
        if self.picker.playlists.is_empty() && !self.picker_loading {
            self.picker_loading = true;
            self.cmd(Command::LoadPlaylists);
        }
    }

    fn new_game(&mut self) {
        let Some(scope) = self.game.as_ref().map(|g| g.restart_scope()) else {
            self.to_picker();
            return;
        };
        self.start_game(scope);
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Playlists(result) => {
                self.picker_loading = false;
                match result {
                    Ok(list) if list.is_empty() => {
                        self.picker_error = Some(
                            "No playlists found. Create some playlists in your streaming account first."
                                .into(),
                        );
                    }
                    Ok(list) => {
                        self.picker_error = None;
                        self.picker.set_playlists(list);
                        self.status = "Pick a playlist".into();
                    }
                    Err(e) => {
                        tracing::warn!("playlist load failed: {e}");
                        self.picker_error =
                            Some("Failed to load playlists. Try logging in again.".into());
                    }
                }
            }
            Event::Started(result) => {
                let hint = self.start_fail_hint();
                let Some(game) = self.game.as_mut() else {
                    return;
                };
                game.on_started(result, hint);
                match game.phase() {
                    Phase::Active => {
                        self.status = "Game on. Play the clip and name the song.".into();
                        match (self.backend, game.source.clone()) {
                            (Backend::Preview, Some(ClipSource::PreviewUrl(url))) => {
                                self.cmd(Command::FetchPreview { url });
                            }
                            (Backend::Connect, _) => self.cmd(Command::FetchToken),
                            (Backend::Preview, _) => {
                                self.status = "Start response carried no preview URL".into();
                            }
                        }
                    }
                    Phase::Failed => self.status = "Could not start the game".into(),
                    _ => {}
                }
            }
            Event::GuessResult { track_name, result } => {
                let Some(game) = self.game.as_mut() else {
                    return;
                };
                let err = game.on_guess(&track_name, result);
                self.search.enabled = game.phase() == Phase::Active;
                if let Some(text) = err {
                    self.status = text;
                }
            }
            Event::SkipResult(result) => {
                let Some(game) = self.game.as_mut() else {
                    return;
                };
                if let Some(text) = game.on_skip(result) {
                    self.status = text;
                }
            }
            Event::SearchResults { generation, result } => {
                self.search.on_results(generation, result);
            }
            Event::Token(Ok(token)) => {
                if let Driver::Connect(d) = &mut self.driver {
                    d.connect(token);
                }
            }
            Event::Token(Err(e)) => {
                tracing::warn!("token fetch failed: {e}");
                self.set_transient("Auth error: could not fetch playback token".into());
            }
            Event::PreviewReady(Ok(path)) => {
                if let Driver::Preview(d) = &mut self.driver {
                    d.set_media(path);
                }
            }
            Event::PreviewReady(Err(e)) => {
                tracing::warn!("preview download failed: {e}");
                self.status = "Failed to fetch preview audio".into();
            }
            Event::LoggedOut => self.should_quit = true,
        }
    }

    fn handle_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Ready { device_id } => {
                self.device_label = Some(device_id);
                self.set_transient("Player ready!".into());
            }
            PlayerEvent::NotReady => {
                self.device_label = None;
                self.set_transient("Player offline".into());
            }
            PlayerEvent::InitError(m) => self.set_transient(format!("Error: {m}")),
            PlayerEvent::AuthError(m) => self.set_transient(format!("Auth error: {m}")),
            PlayerEvent::AccountError(m) => self.set_transient(m),
            PlayerEvent::PlaybackError(m) => {
                self.playing = false;
                self.set_transient(format!("Playback error: {m}"));
            }
            PlayerEvent::ClipStarted => self.playing = true,
            PlayerEvent::ClipFinished => self.playing = false,
        }
    }

    /// Per-frame housekeeping: transient expiry, due search requests, logs.
    fn tick(&mut self) {
        if let Some((_, at)) = &self.transient {
            if at.elapsed() >= TRANSIENT_TTL {
                self.transient = None;
            }
        }

        let game_active = self.game.as_ref().map(|g| g.phase()) == Some(Phase::Active);
        if self.screen == Screen::Game && game_active {
            if let Some((generation, query)) = self.search.poll(Instant::now()) {
                self.cmd(Command::Search { generation, query });
            }
        }

        self.drain_logs();
    }

    fn play_clip(&mut self) {
        if self.playing {
            return;
        }
        let Some(game) = self.game.as_ref() else {
            return;
        };
        if game.phase() != Phase::Active {
            return;
        }
        let Some(source) = game.source.clone() else {
            return;
        };
        let secs = game.clip_secs;
        if let Err(e) = self.driver.play_clip(&source, secs) {
            self.status = format!("{e:#}");
        }
    }

    fn submit_selected_guess(&mut self) {
        let Some(hit) = self.search.take_selected() else {
            return;
        };
        let Some(game) = self.game.as_mut() else {
            return;
        };
        let Some(session_id) = game.session_id.clone() else {
            return;
        };
        if !game.begin_guess() {
            return;
        }
        self.search.clear_input();
        self.search.enabled = false;
        self.cmd(Command::Guess {
            session_id,
            track_id: hit.id,
            track_name: hit.name,
        });
    }

    fn request_skip(&mut self) {
        let Some(game) = self.game.as_ref() else {
            return;
        };
        if game.skip_control() == SkipControl::Hidden {
            return;
        }
        if game.skip_needs_confirmation() {
            self.confirm_skip = true;
        } else {
            self.do_skip();
        }
    }

    fn do_skip(&mut self) {
        self.confirm_skip = false;
        let Some(game) = self.game.as_mut() else {
            return;
        };
        let Some(session_id) = game.session_id.clone() else {
            return;
        };
        if !game.begin_skip() {
            return;
        }
        self.cmd(Command::Skip { session_id });
    }

    fn quit(&mut self) {
        self.driver.stop();
        self.cmd(Command::Quit);
        self.should_quit = true;
    }

    fn toggle_logs(&mut self) {
        self.logs_open = !self.logs_open;
        if !self.logs_open {
            self.logs_scroll = 0;
        }
    }

    fn scroll_logs_up(&mut self) {
        let max = self.logs.len().saturating_sub(1);
        self.logs_scroll = (self.logs_scroll + 1).min(max);
    }

    fn scroll_logs_down(&mut self) {
        self.logs_scroll = self.logs_scroll.saturating_sub(1);
    }

    fn drain_logs(&mut self) {
        const LOG_CAP: usize = 500;
        while let Ok(line) = self.log_rx.try_recv() {
            if self.logs.len() >= LOG_CAP {
                self.logs.pop_front();
            }
            self.logs.push_back(line);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.logs_open {
            match key.code {
                KeyCode::Char('q') => self.quit(),
                KeyCode::Esc | KeyCode::Char('l') => self.toggle_logs(),
                KeyCode::Up => self.scroll_logs_up(),
                KeyCode::Down => self.scroll_logs_down(),
                _ => {}
            }
            return;
        }

        match self.screen {
            Screen::Picker => self.handle_picker_key(key),
            Screen::Game => self.handle_game_key(key),
        }
    }

    fn handle_picker_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.quit(),
            KeyCode::Up => self.picker.cursor_prev(),
            KeyCode::Down => self.picker.cursor_next(),
            KeyCode::Char(' ') => self.picker.toggle_current(),
            KeyCode::Enter | KeyCode::Char('s') => match self.picker.start_scope() {
                Some(scope) => self.start_game(scope),
                None => self.status = "Select at least one playlist".into(),
            },
            KeyCode::Char('r') => {
                self.picker_loading = true;
                self.cmd(Command::LoadPlaylists);
            }
            KeyCode::Char('l') => self.toggle_logs(),
            KeyCode::Char('L') => {
                self.status = "Logging out...".into();
                self.cmd(Command::Logout);
            }
            _ => {}
        }
    }

    fn handle_game_key(&mut self, key: KeyEvent) {
        if self.confirm_skip {
            match key.code {
                KeyCode::Char('y') => self.do_skip(),
                KeyCode::Char('n') | KeyCode::Esc => self.confirm_skip = false,
                _ => {}
            }
            return;
        }

        match self.game.as_ref().map(|g| g.phase()) {
            Some(Phase::Complete) => {
                match key.code {
                    KeyCode::Char('g') => self.new_game(),
                    KeyCode::Char('b') => self.to_picker(),
                    KeyCode::Char('q') => self.quit(),
                    _ => {}
                }
                return;
            }
            Some(Phase::Failed) => {
                match key.code {
                    KeyCode::Char('b') => self.to_picker(),
                    KeyCode::Char('q') => self.quit(),
                    _ => {}
                }
                return;
            }
            _ => {}
        }

        // Active/loading: the search box owns plain characters, controls
        // live behind Ctrl chords.
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('c') if ctrl => self.quit(),
            KeyCode::Char('p') if ctrl => self.play_clip(),
            KeyCode::Char('s') if ctrl => self.request_skip(),
            KeyCode::Char('l') if ctrl => self.toggle_logs(),
            KeyCode::Char('r') if ctrl => self.search.refocus(),
            KeyCode::Esc => self.search.hide(),
            KeyCode::Up => self.search.select_prev(),
            KeyCode::Down => self.search.select_next(),
            KeyCode::Enter => self.submit_selected_guess(),
            KeyCode::Backspace => self.search.backspace(Instant::now()),
            KeyCode::Char(c) if !ctrl => {
                self.search.refocus();
                self.search.push_char(c, Instant::now());
            }
            _ => {}
        }
    }
}

fn ui_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    evt_rx: Receiver<Event>,
) -> Result<()> {
    let tick = Duration::from_millis(33);
    let mut last_tick = Instant::now();

    loop {
        // Pump worker + player events.
        while let Ok(ev) = evt_rx.try_recv() {
            app.handle_event(ev);
        }
        let player_events: Vec<PlayerEvent> = app.driver.events().try_iter().collect();
        for ev in player_events {
            app.handle_player_event(ev);
        }

        app.tick();
        terminal.draw(|f| render::draw(f, app))?;

        if app.should_quit {
            return Ok(());
        }

        let timeout = tick.saturating_sub(last_tick.elapsed());
        if event::poll(timeout).context("poll terminal events")? {
            if let CEvent::Key(k) = event::read().context("read terminal event")? {
                app.handle_key(k);
            }
        }
        if app.should_quit {
            return Ok(());
        }

        if last_tick.elapsed() >= tick {
            last_tick = Instant::now();
        }
    }
}

fn init_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("create terminal")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use heardle_types::{CorrectSong, GuessResponse, StartGameResponse, TrackHit};

    fn test_app() -> (App, Receiver<Command>) {
        let (cmd_tx, cmd_rx) = unbounded();
        let (_log_tx, log_rx) = unbounded();
        let opts = Options {
            server: "http://127.0.0.1:8080".into(),
            backend: Backend::Connect,
            multi: false,
            skip_mode: SkipMode::Confirm,
            device: None,
            scope: Some(PlaylistScope::Single("pl1".into())),
        };
        let driver = Driver::Connect(ConnectDriver::new());
        let mut app = App::new(opts, driver, cmd_tx, log_rx);
        app.boot();
        (app, cmd_rx)
    }

    fn started_ok() -> Event {
        Event::Started(Ok(StartGameResponse {
            session_id: "s1".into(),
            audio_duration: 1,
            preview_url: None,
            track_uri: Some("partner:track:1".into()),
            skips_used: None,
            can_skip: None,
            playlist_id: None,
        }))
    }

    fn winning_guess(track_name: &str) -> Event {
        Event::GuessResult {
            track_name: track_name.into(),
            result: Ok(GuessResponse {
                is_correct: true,
                is_complete: true,
                won: Some(true),
                guesses_used: 1,
                audio_duration: 1,
                skips_used: None,
                can_skip: None,
                correct_song: Some(CorrectSong {
                    id: None,
                    name: track_name.into(),
                    artists: vec!["Artist X".into()],
                    preview_url: None,
                }),
            }),
        }
    }

    #[test]
    fn completed_game_sends_no_further_guess_requests() {
        let (mut app, cmd_rx) = test_app();
        app.handle_event(started_ok());
        app.search.on_results(
            0,
            Ok(vec![TrackHit {
                id: "t1".into(),
                name: "Song A".into(),
                artists: vec!["Artist X".into()],
            }]),
        );
        app.handle_event(winning_guess("Song A"));

        // Drain everything issued so far, then try to guess again.
        while cmd_rx.try_recv().is_ok() {}
        app.search.on_results(
            0,
            Ok(vec![TrackHit {
                id: "t2".into(),
                name: "Song B".into(),
                artists: vec![],
            }]),
        );
        app.submit_selected_guess();
        assert!(cmd_rx.try_recv().is_err());
    }

    #[test]
    fn start_failure_is_terminal_with_hint() {
        let (mut app, _cmd_rx) = test_app();
        app.handle_event(Event::Started(Err("API error: 400".into())));
        let game = app.game.as_ref().unwrap();
        assert_eq!(game.phase(), Phase::Failed);
        assert!(game.fail_message.as_deref().unwrap().contains("Premium"));
    }

    #[test]
    fn guess_failure_reenables_search_input() {
        let (mut app, _cmd_rx) = test_app();
        app.handle_event(started_ok());
        app.search.enabled = false;
        app.handle_event(Event::GuessResult {
            track_name: "Song A".into(),
            result: Err("timeout".into()),
        });
        assert!(app.search.enabled);
        assert_eq!(app.status, "Failed to submit guess");
    }

    #[test]
    fn confirm_mode_asks_before_skipping() {
        let (mut app, cmd_rx) = test_app();
        app.handle_event(started_ok());
        while cmd_rx.try_recv().is_ok() {}

        app.request_skip();
        assert!(app.confirm_skip);
        assert!(cmd_rx.try_recv().is_err());

        app.do_skip();
        assert!(matches!(cmd_rx.try_recv(), Ok(Command::Skip { .. })));
    }
}
