use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use maze_solver_core::{
    Position,
    cycle::{CycleConfig, MazeCycle, SolveOutcome},
    map::Grid,
    maze::CellType,
};
use rand::{SeedableRng, rngs::StdRng};
use ratatui::{
    crossterm::{
        self,
        event::{self, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    collections::HashSet,
    fs::File,
    io::{self, Stdout},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

#[derive(Parser, Debug)]
#[command(version, about = "Carves random mazes and solves them with A*", long_about = None)]
struct Args {
    /// Maze width in cells (odd, at least 3)
    #[arg(long, default_value_t = 81)]
    width: usize,

    /// Maze height in cells (odd, at least 3)
    #[arg(long, default_value_t = 61)]
    height: usize,

    /// Random seed; mazes are drawn from OS entropy when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Seconds a solved maze stays up before a new one is carved
    #[arg(long, value_name = "SECS", default_value_t = 3.0)]
    reset_delay: f64,

    /// Screen refresh interval in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 50)]
    tick_rate: u64,

    /// Write logs to this file (interactive mode otherwise logs nothing)
    #[arg(long, value_name = "LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Run without a terminal UI and print one line per maze
    #[arg(long)]
    headless: bool,

    /// Number of mazes to generate and solve in headless mode
    #[arg(long, default_value_t = 1, requires = "headless")]
    cycles: u32,

    /// Print each maze with its path in headless mode
    #[arg(long, requires = "headless")]
    print: bool,
}

impl Args {
    fn cycle_config(&self) -> Result<CycleConfig> {
        let reset_delay = Duration::try_from_secs_f64(self.reset_delay)
            .with_context(|| format!("Invalid reset delay: {}", self.reset_delay))?;
        let config = CycleConfig {
            width: self.width,
            height: self.height,
            reset_delay,
        };
        config.validate()?;
        Ok(config)
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

struct App {
    /// The generate/solve/reset loop.
    cycle: MazeCycle<StdRng>,
    /// Flag to control the main loop.
    should_quit: bool,
}

impl App {
    fn new(config: CycleConfig, rng: StdRng) -> Result<Self> {
        Ok(App {
            cycle: MazeCycle::new(config, rng)?,
            should_quit: false,
        })
    }

    /// Handles one step of the loop: regenerate once the reset delay is over.
    fn tick(&mut self) -> Result<()> {
        if self.cycle.tick(Instant::now())? {
            info!("carved maze {}", self.cycle.generation());
        }
        Ok(())
    }

    fn solve(&mut self) -> Result<()> {
        if !self.cycle.is_solved() {
            info!("solving maze {}", self.cycle.generation());
        }
        self.cycle.solve(Instant::now())?;
        Ok(())
    }

    fn regenerate(&mut self) -> Result<()> {
        self.cycle.regenerate()?;
        info!("carved maze {} on request", self.cycle.generation());
        Ok(())
    }

    /// Sets the quit flag.
    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.cycle_config()?;
    init_logging(args.log_file.as_deref(), args.headless)?;

    if args.headless {
        return run_headless(config, args.rng(), args.cycles, args.print);
    }

    let mut app = App::new(config, args.rng())?;

    // Set up the terminal
    let mut terminal = setup_terminal()?;

    let result = run_app(&mut terminal, &mut app, Duration::from_millis(args.tick_rate));

    // Restore the terminal state even if the loop failed
    restore_terminal(&mut terminal)?;

    result
}

/// Installs `env_logger`, filtered by `RUST_LOG` (default `info`).
///
/// The TUI owns the screen, so interactive runs only log when a file is given.
fn init_logging(log_file: Option<&Path>, headless: bool) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        None if headless => {
            builder.target(env_logger::Target::Stderr);
        }
        None => return Ok(()),
    }
    builder.try_init()?;
    Ok(())
}

/// Generates and solves `cycles` mazes back to back, printing each result.
fn run_headless(config: CycleConfig, rng: StdRng, cycles: u32, print: bool) -> Result<()> {
    let mut cycle = MazeCycle::new(config, rng)?;
    for n in 1..=cycles {
        if n > 1 {
            cycle.regenerate()?;
        }
        let outcome = cycle.solve(Instant::now())?.clone();
        if print {
            println!(
                "{}",
                render_ascii(cycle.grid(), outcome.path(), config.start(), config.goal())
            );
        }
        println!("{}", summary_line(n, &outcome));
    }
    Ok(())
}

fn summary_line(n: u32, outcome: &SolveOutcome) -> String {
    match outcome.path_len() {
        Some(len) => format!("maze {n}: path length {len}"),
        None => format!("maze {n}: no path found"),
    }
}

/// Plain-text rendering: `#` walls, `o` path, `S` start, `G` goal.
fn render_ascii(
    grid: &Grid<CellType>,
    path: Option<&[Position]>,
    start: Position,
    goal: Position,
) -> String {
    let on_path: HashSet<Position> = path.into_iter().flatten().copied().collect();
    let mut rows = Vec::with_capacity(grid.height());
    for y in 0..grid.height() {
        let row: String = (0..grid.width())
            .map(|x| {
                let position = Position::new(x, y);
                if position == start {
                    'S'
                } else if position == goal {
                    'G'
                } else if on_path.contains(&position) {
                    'o'
                } else if grid[position] == CellType::Wall {
                    '#'
                } else {
                    ' '
                }
            })
            .collect();
        rows.push(row);
    }
    rows.join("\n")
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?; // Put terminal in raw mode
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into) // Map io::Error to anyhow::Error
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the TUI application.
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                        KeyCode::Char(' ') => app.solve()?,
                        KeyCode::Char('r') => app.regenerate()?,
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick()?;
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Area for the maze
            Constraint::Length(3), // Area for status/help
        ])
        .split(frame.area());

    render_maze(frame, main_layout[0], &app.cycle);

    let status = match app.cycle.outcome() {
        None => Line::from("Press SPACE to solve, 'r' to regenerate, 'q' or 'Esc' to quit."),
        Some(SolveOutcome::Found(path)) => Line::from(vec![
            Span::styled("Path length: ", Style::default().fg(Color::Green)),
            Span::raw(path.len().to_string()),
        ]),
        Some(SolveOutcome::NoPath) => {
            Line::from(Span::styled("No path found.", Style::default().fg(Color::Red)))
        }
    };
    let status_widget = Paragraph::new(status)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(status_widget, main_layout[1]);
}

/// Renders the maze and, once solved, its path onto the frame.
fn render_maze(frame: &mut Frame, area: Rect, cycle: &MazeCycle<StdRng>) {
    let grid = cycle.grid();
    let (start, goal) = (cycle.config().start(), cycle.config().goal());
    let on_path: HashSet<Position> = cycle
        .outcome()
        .and_then(SolveOutcome::path)
        .into_iter()
        .flatten()
        .copied()
        .collect();

    let mut lines: Vec<Line> = Vec::with_capacity(grid.height());
    for y in 0..grid.height() {
        let mut spans: Vec<Span> = Vec::with_capacity(grid.width());
        for x in 0..grid.width() {
            let position = Position::new(x, y);
            let span = if position == start {
                Span::styled("S", Style::default().fg(Color::Green).bold())
            } else if position == goal {
                Span::styled("G", Style::default().fg(Color::Red).bold())
            } else if on_path.contains(&position) {
                Span::styled("o", Style::default().fg(Color::Blue))
            } else {
                match grid[position] {
                    CellType::Wall => Span::styled("#", Style::default().fg(Color::DarkGray)),
                    CellType::Open => Span::raw(" "),
                }
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }

    let title = format!("Maze {}", cycle.generation());
    let maze_paragraph = Paragraph::new(lines)
        .block(Block::default().title(title).borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(maze_paragraph, area);
}
