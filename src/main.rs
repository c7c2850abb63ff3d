pub mod ui;

use std::{
    collections::BTreeSet,
    error::Error,
    fs::{self, File},
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use examsim::{
    app_dirs::AppDirs,
    audio::PlaybackEvent,
    config::{Config, ConfigStore, FileConfigStore},
    content::{Answer, ContentKey, ContentStore, Module, QuestionKind, SectionSlot, Subject},
    error::{ContentError, SessionError},
    runtime::{AppEvent, CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
    session::{EndReason, ExamSessions, SectionSession, SessionEvent, SessionState},
    timer::format_clock,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const BUNDLED_CONTENT: &str = "sample";

/// timed IELTS practice in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal simulator for the IELTS listening, reading and writing sections, with per-section countdowns, live completion tracking and word counts."
)]
pub struct Cli {
    /// content document (JSON) with the subjects for every section
    #[clap(short = 'c', long)]
    content: Option<PathBuf>,

    /// exam module used for reading and writing task 1
    #[clap(short = 'm', long, value_enum)]
    module: Option<Module>,

    /// validate the content document, print subject counts and exit
    #[clap(long)]
    check: bool,

    /// print the subjects available for one exam part and exit
    #[clap(long, value_enum)]
    list: Option<SectionSlot>,
}

impl Cli {
    fn content_path(&self, config: &Config) -> Option<PathBuf> {
        self.content
            .clone()
            .or_else(|| config.content_path.clone())
            .or_else(|| AppDirs::content_path().filter(|p| p.exists()))
    }

    fn interactive(&self) -> bool {
        !self.check && self.list.is_none()
    }
}

fn load_content(path: Option<&PathBuf>, config: &Config) -> Result<ContentStore, ContentError> {
    let options = config.load_options();
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading content");
            ContentStore::from_path(path, options)
        }
        None => ContentStore::bundled(BUNDLED_CONTENT, options),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Choosing a section and subject.
    Browse,
    /// Working on the selected subject of the current section.
    Exam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub level: StatusLevel,
    pub text: String,
}

#[derive(Debug)]
pub struct App {
    pub exam: ExamSessions,
    pub store: ContentStore,
    pub content_path: Option<PathBuf>,
    pub slot: SectionSlot,
    pub state: AppState,
    pub subject_cursor: usize,
    pub question_cursor: usize,
    pub status: Option<Status>,
    pub should_quit: bool,
    config_store: Option<FileConfigStore>,
}

impl App {
    pub fn new(store: ContentStore, content_path: Option<PathBuf>, config: &Config) -> Self {
        Self {
            exam: ExamSessions::new(store.snapshot(), config),
            store,
            content_path,
            slot: SectionSlot::Listening,
            state: AppState::Browse,
            subject_cursor: 0,
            question_cursor: 0,
            status: None,
            should_quit: false,
            config_store: None,
        }
    }

    /// Remembers module changes in the given config file.
    pub fn with_config_store(mut self, store: FileConfigStore) -> Self {
        self.config_store = Some(store);
        self
    }

    pub fn session(&self) -> &SectionSession {
        self.exam.session(self.slot)
    }

    pub fn subjects(&self) -> &[Subject] {
        self.exam.subject_list(self.slot)
    }

    /// Answer slot under the cursor: a question id, or the task id for writing.
    pub fn current_slot_id(&self) -> Option<String> {
        let subject = self.session().subject()?;
        subject
            .slot_ids()
            .get(self.question_cursor)
            .map(|id| id.to_string())
    }

    pub fn on_tick(&mut self, elapsed: Duration) {
        self.exam.tick(elapsed);
        self.absorb_events();
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        match self.state {
            AppState::Browse => self.on_browse_key(key),
            AppState::Exam => self.on_exam_key(key),
        }
        self.absorb_events();
    }

    fn on_browse_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('l') if ctrl => self.reload_content(),
            KeyCode::Tab => {
                self.slot = self.slot.next();
                self.subject_cursor = 0;
            }
            KeyCode::Char('m') => {
                let module = self.exam.module().toggled();
                let result = self.exam.set_module(module);
                if self.report(result).is_some() {
                    self.subject_cursor = 0;
                    self.info(format!("Module: {module}"));
                    self.persist_module(module);
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.subject_cursor = self.subject_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.subject_cursor + 1 < self.subjects().len() {
                    self.subject_cursor += 1;
                }
            }
            KeyCode::Enter => self.open_subject(),
            _ => {}
        }
    }

    fn on_exam_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let state = self.session().state();
        match key.code {
            KeyCode::Esc => self.state = AppState::Browse,
            KeyCode::Char('e') if ctrl => {
                let result = self.exam.session_mut(self.slot).end();
                self.report(result);
            }
            KeyCode::Char('r') if ctrl => {
                let result = self.exam.session_mut(self.slot).reset();
                if self.report(result).is_some() {
                    self.question_cursor = 0;
                }
            }
            KeyCode::Char('p') if ctrl => self.toggle_audio(),
            KeyCode::Enter if state == SessionState::Idle => {
                let result = self.exam.session_mut(self.slot).start();
                self.report(result);
            }
            _ if state != SessionState::Running => {}
            KeyCode::Tab | KeyCode::Down => self.move_question(1),
            KeyCode::BackTab | KeyCode::Up => self.move_question(-1),
            KeyCode::Enter => {
                if self.session().subject().and_then(Subject::writing_task).is_some() {
                    self.edit_text(|text| text.push('\n'));
                } else {
                    self.move_question(1);
                }
            }
            KeyCode::Backspace => self.edit_text(|text| {
                text.pop();
            }),
            KeyCode::Char(c) if !ctrl => self.type_char(c),
            _ => {}
        }
    }

    fn open_subject(&mut self) {
        let Some(subject_id) = self.subjects().get(self.subject_cursor).map(|s| s.id.clone()) else {
            self.error(format!(
                "No subjects for {}",
                self.session().key().label()
            ));
            return;
        };
        if self.session().state() == SessionState::Idle {
            let result = self.exam.select(self.slot, &subject_id);
            if self.report(result).is_none() {
                return;
            }
            self.question_cursor = 0;
        }
        self.state = AppState::Exam;
    }

    fn move_question(&mut self, delta: isize) {
        let count = self
            .session()
            .subject()
            .map_or(0, |s| s.slot_ids().len());
        if count == 0 {
            return;
        }
        self.question_cursor = self
            .question_cursor
            .saturating_add_signed(delta)
            .min(count - 1);
    }

    fn current_kind(&self) -> Option<QuestionKind> {
        let id = self.current_slot_id()?;
        let question = self.session().subject()?.question(&id)?;
        Some(question.kind.clone())
    }

    fn type_char(&mut self, c: char) {
        match self.current_kind() {
            Some(kind) if kind.is_choice() => {
                if let Some(digit) = c.to_digit(10).filter(|d| *d > 0) {
                    self.choose(&kind, digit as usize - 1);
                }
            }
            _ => self.edit_text(|text| text.push(c)),
        }
    }

    fn choose(&mut self, kind: &QuestionKind, index: usize) {
        let Some(id) = self.current_slot_id() else {
            return;
        };
        let answer = match kind {
            QuestionKind::MultiChoice { .. } => {
                let mut picked = match self.session().answer(&id) {
                    Some(Answer::Choices(picked)) => picked.clone(),
                    _ => BTreeSet::new(),
                };
                if !picked.remove(&index) {
                    picked.insert(index);
                }
                Answer::Choices(picked)
            }
            _ => Answer::Choice(index),
        };
        let result = self.exam.session_mut(self.slot).submit_answer(&id, answer);
        self.report(result);
    }

    fn edit_text(&mut self, edit: impl FnOnce(&mut String)) {
        let Some(id) = self.current_slot_id() else {
            return;
        };
        let mut text = self
            .session()
            .answer(&id)
            .and_then(Answer::as_text)
            .unwrap_or_default()
            .to_string();
        edit(&mut text);
        let result = self
            .exam
            .session_mut(self.slot)
            .submit_answer(&id, Answer::Text(text));
        self.report(result);
    }

    fn toggle_audio(&mut self) {
        let playing = self.session().playback().is_some_and(|p| p.is_playing());
        let session = self.exam.session_mut(self.slot);
        let result = if playing {
            session.pause_audio()
        } else {
            session.play_audio()
        };
        self.report(result);
    }

    fn reload_content(&mut self) {
        let Some(path) = self.content_path.clone() else {
            self.error("Bundled content cannot be reloaded".to_string());
            return;
        };
        match self.store.reload_path(&path) {
            Ok(()) => {
                self.exam.replace_content(self.store.snapshot());
                self.subject_cursor = 0;
                self.info(format!("Reloaded {}", path.display()));
            }
            Err(err) => self.error(format!("Reload failed: {err}")),
        }
    }

    fn persist_module(&mut self, module: Module) {
        let Some(store) = &self.config_store else {
            return;
        };
        // re-read so command-line overrides stay out of the file
        let mut config = store.load();
        config.module = module;
        if let Err(err) = store.save(&config) {
            warn!(path = %store.path().display(), error = %err, "cannot save config");
            self.status = Some(Status {
                level: StatusLevel::Warn,
                text: format!("Module: {module} (not saved: {err})"),
            });
        }
    }

    fn absorb_events(&mut self) {
        for (slot, event) in self.exam.drain_events() {
            let section = self.exam.session(slot).key().label();
            match event {
                SessionEvent::TimeWarning { remaining } => self.status = Some(Status {
                    level: StatusLevel::Warn,
                    text: format!("{section}: {} minutes remaining", remaining.as_secs() / 60),
                }),
                SessionEvent::TimeUp => self.error(format!("{section}: time is up")),
                SessionEvent::Playback(PlaybackEvent::PartFinished { part }) => {
                    self.info(format!("{section}: part {part} finished"))
                }
                SessionEvent::Playback(PlaybackEvent::AllPartsFinished) => {
                    self.info(format!("{section}: recording finished"))
                }
                SessionEvent::StateChanged {
                    to: SessionState::Ended(EndReason::UserEnded),
                    ..
                } => {
                    if let Some(report) = self.exam.session(slot).report() {
                        let text = format!(
                            "{section} ended after {}. {}",
                            format_clock(report.time_used),
                            report.summary.label()
                        );
                        self.info(text);
                    }
                }
                SessionEvent::StateChanged { .. } | SessionEvent::AnswerRecorded { .. } => {}
            }
        }
    }

    /// Shows a failed command in the status line; returns `Some` on success.
    fn report<T>(&mut self, result: Result<T, SessionError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.error(err.to_string());
                None
            }
        }
    }

    fn info(&mut self, text: String) {
        self.status = Some(Status {
            level: StatusLevel::Info,
            text,
        });
    }

    fn error(&mut self, text: String) {
        self.status = Some(Status {
            level: StatusLevel::Error,
            text,
        });
    }
}

fn init_tracing(interactive: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("examsim=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if !interactive {
        builder.with_writer(io::stderr).init();
        return;
    }
    // the alternate screen owns the terminal, so logs go to a file
    let log_file = AppDirs::log_path().and_then(|path| {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok()?;
        }
        File::options().create(true).append(true).open(path).ok()
    });
    match log_file {
        Some(file) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        None => builder.with_writer(io::sink).init(),
    }
}

fn print_counts(store: &ContentStore) {
    for key in ContentKey::ALL {
        println!("{:<28} {}", key.path(), store.subjects_for(key).len());
    }
}

fn print_subjects(store: &ContentStore, key: ContentKey) {
    for subject in store.subjects_for(key) {
        println!("{}\t{}", subject.id, subject.title);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.interactive());

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    if let Some(module) = cli.module {
        config.module = module;
    }
    let content_path = cli.content_path(&config);

    let store = match load_content(content_path.as_ref(), &config) {
        Ok(store) => store,
        Err(err) => {
            warn!(error = %err, "content rejected");
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    if cli.check {
        print_counts(&store);
        return Ok(());
    }
    if let Some(slot) = cli.list {
        print_subjects(&store, slot.key(config.module));
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store, content_path, &config).with_config_store(config_store);
    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(config.tick_rate()),
    );
    let result = start_tui(&mut terminal, &mut app, &mut runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &mut Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    while !app.should_quit {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            AppEvent::Tick(elapsed) => app.on_tick(elapsed),
            AppEvent::Resize => {}
            AppEvent::Key(key) => app.on_key(key),
        }
    }
    info!("exiting");
    Ok(())
}
