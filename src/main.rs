use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::OpenOptions,
    io::{self, stdin},
    sync::Mutex,
    time::Duration,
};
use timestables::{
    app::{App, KeyAction},
    app_dirs::AppDirs,
    clock::SystemClock,
    config::{Config, ConfigStore, FileConfigStore},
    preferences::{
        BestTime, MemoryPreferenceStore, PreferenceStore, SqlitePreferenceStore, BEST_TIME_KEY,
    },
    question::RandomQuestions,
    quiz::Quiz,
    runtime::{QuizEvent, Runner},
    session::SessionConfig,
    util::format_secs,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Longest a loop step blocks when nothing is scheduled
const IDLE_WAIT_MS: u64 = 250;
const LOG_ENV: &str = "TIMESTABLES_LOG";

/// multiplication drill for the terminal: twenty questions, thirty seconds each
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Answer randomly drawn multiplication facts against the clock. Each question offers four choices; finish the round as fast as you can to set a new best time."
)]
pub struct Cli {
    /// number of questions per round
    #[clap(short = 'q', long = "questions", value_parser = clap::value_parser!(u32).range(1..))]
    question_count: Option<u32>,

    /// seconds allowed per question
    #[clap(short = 's', long = "seconds", value_parser = clap::value_parser!(u32).range(1..))]
    seconds_per_question: Option<u32>,

    /// how long the correct/wrong feedback stays up, in milliseconds
    #[clap(long)]
    result_delay_ms: Option<u64>,

    /// store the given options as the new defaults
    #[clap(long)]
    save_config: bool,

    /// print the best recorded time and exit
    #[clap(long, conflicts_with = "reset_best")]
    best: bool,

    /// forget the best recorded time and exit
    #[clap(long)]
    reset_best: bool,
}

impl Cli {
    /// Overlay command line options on the stored config
    fn merge_into(&self, mut cfg: Config) -> Config {
        if let Some(n) = self.question_count {
            cfg.question_count = n;
        }
        if let Some(s) = self.seconds_per_question {
            cfg.seconds_per_question = s;
        }
        if let Some(ms) = self.result_delay_ms {
            cfg.result_delay_ms = ms;
        }
        cfg
    }
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

/// Best time is best-effort: fall back to memory when the database is unusable
fn open_preferences() -> Box<dyn PreferenceStore> {
    match SqlitePreferenceStore::open_default() {
        Ok(store) => Box::new(store),
        Err(err) => {
            warn!(error = %err, "preference database unavailable, best time won't be kept");
            Box::new(MemoryPreferenceStore::new())
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let config_store = FileConfigStore::new();
    let config = cli.merge_into(config_store.load());
    if cli.save_config {
        config_store.save(&config)?;
        info!(path = %config_store.path().display(), "config saved");
    }

    // one-shot commands report a broken database instead of falling back
    if cli.best {
        let store = SqlitePreferenceStore::open_default()?;
        match BestTime::load(&store)?.seconds() {
            Some(best) => println!("best time: {}", format_secs(best)),
            None => println!("no best time recorded yet"),
        }
        return Ok(());
    }

    if cli.reset_best {
        SqlitePreferenceStore::open_default()?.remove(BEST_TIME_KEY)?;
        println!("best time cleared");
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let quiz = Quiz::new(
        SessionConfig::from(&config),
        Box::new(RandomQuestions::new()),
        open_preferences(),
        Box::new(SystemClock),
    );
    let mut app = App::new(quiz);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::terminal(Duration::from_millis(IDLE_WAIT_MS));

    loop {
        if app.take_changed() {
            terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        }

        match runner.step(app.quiz.time_until_due()) {
            QuizEvent::Tick => app.on_tick(),
            QuizEvent::Resize => app.mark_changed(),
            QuizEvent::Key(key) => {
                if app.handle_key(key) == KeyAction::Quit {
                    break;
                }
            }
        }
    }

    info!(
        score = app.quiz.score(),
        question = app.quiz.question_number(),
        "quit"
    );
    Ok(())
}
