//! Memory Match entry point
//!
//! The browser build is driven from JavaScript through `platform::web`.
//! Natively this runs a text-mode game on the terminal, saving progress to
//! a directory so a later run resumes it.

#[cfg(not(target_arch = "wasm32"))]
mod terminal {
    use std::io::{self, BufRead, Write};
    use std::path::PathBuf;
    use std::time::Instant;

    use anyhow::bail;
    use memory_match::persistence::FileStorage;
    use memory_match::platform::clock_seed;
    use memory_match::{
        Category, CategorySwitch, Game, GameConfig, GameEvent, GamePhase, MemoryStorage, Storage,
    };

    const HELP: &str = "\
memory-match - terminal memory card game

USAGE:
  memory-match [OPTIONS]

OPTIONS:
  --seed <N>          RNG seed (default: clock)
  --save-dir <DIR>    Where progress is saved (default: .memory-match)
  --config <FILE>     JSON game config overriding pools and levels
  --no-save           Play without saving progress
  -h, --help          Print help
";

    const COMMANDS: &str =
        "Commands: <card number> flip | c <category> switch | r reset | n new game | <enter> refresh | q quit";

    struct Args {
        seed: u64,
        save_dir: PathBuf,
        config: Option<PathBuf>,
        no_save: bool,
    }

    fn parse_args() -> anyhow::Result<Option<Args>> {
        let mut pargs = pico_args::Arguments::from_env();
        if pargs.contains(["-h", "--help"]) {
            print!("{HELP}");
            return Ok(None);
        }

        let args = Args {
            no_save: pargs.contains("--no-save"),
            seed: pargs.opt_value_from_str("--seed")?.unwrap_or_else(clock_seed),
            save_dir: pargs
                .opt_value_from_str("--save-dir")?
                .unwrap_or_else(|| PathBuf::from(".memory-match")),
            config: pargs.opt_value_from_str("--config")?,
        };

        let rest = pargs.finish();
        if !rest.is_empty() {
            bail!("unexpected arguments: {:?}", rest);
        }
        Ok(Some(args))
    }

    enum Command<'a> {
        Flip(u32),
        Category(&'a str),
        Reset,
        NewGame,
        Refresh,
        Help,
        Quit,
        Unknown,
    }

    fn parse_command(line: &str) -> Command<'_> {
        let line = line.trim();
        let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
        match head {
            "" => Command::Refresh,
            "q" | "quit" => Command::Quit,
            "r" | "reset" => Command::Reset,
            "n" | "new" => Command::NewGame,
            "h" | "help" | "?" => Command::Help,
            "c" | "category" => Command::Category(rest.trim()),
            _ => head.parse().map(Command::Flip).unwrap_or(Command::Unknown),
        }
    }

    /// Ask a yes/no question; anything but "y" is a no
    fn confirm(input: &mut impl BufRead, question: &str) -> io::Result<bool> {
        print!("{question} [y/N] ");
        io::stdout().flush()?;
        let mut answer = String::new();
        input.read_line(&mut answer)?;
        Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
    }

    fn draw<S: Storage>(game: &Game<S>) {
        let view = game.view();
        let state = view.state;

        println!();
        println!(
            "Level {}/{} | {} | Score {} | Correct {} | Incorrect {} | Progress {:.0}%",
            state.level,
            view.final_level,
            state.category,
            state.score,
            state.correct,
            state.incorrect,
            view.progress
        );
        if state.phase == GamePhase::Previewing {
            println!("Preview: {}s - memorize the cards!", state.preview_remaining);
        }

        let cols = view.grid.cols.max(1) as usize;
        for row in state.deck.chunks(cols) {
            let line: Vec<String> = row
                .iter()
                .map(|card| {
                    if card.is_flipped || card.is_matched {
                        format!("[{}]", card.symbol)
                    } else {
                        format!("[{:>2}]", card.id)
                    }
                })
                .collect();
            println!("  {}", line.join(" "));
        }
    }

    fn report(events: Vec<GameEvent>) {
        for event in events {
            match event {
                GameEvent::GameResumed { level, score } => {
                    println!("Game resumed: level {level}, score {score}")
                }
                GameEvent::MatchFound { symbol, .. } => println!("Match! {symbol}"),
                GameEvent::Mismatch { penalty, .. } if penalty > 0 => {
                    println!("No match (-{penalty})")
                }
                GameEvent::Mismatch { .. } => println!("No match"),
                GameEvent::LevelComplete { level } => {
                    println!("Level {level} complete! The next level starts shortly...")
                }
                GameEvent::GameComplete { score } => println!(
                    "Congratulations, you've completed every level! Final score: {score}. Type 'n' to play again."
                ),
                _ => {}
            }
        }
    }

    pub fn run() -> anyhow::Result<()> {
        let Some(args) = parse_args()? else {
            return Ok(());
        };

        let config = match &args.config {
            Some(path) => GameConfig::from_json(&std::fs::read_to_string(path)?)?,
            None => GameConfig::default(),
        };
        let storage: Box<dyn Storage> = if args.no_save {
            Box::new(MemoryStorage::new())
        } else {
            Box::new(FileStorage::open(&args.save_dir)?)
        };

        log::info!("Memory Match (native) starting with seed {}", args.seed);
        let mut game = Game::new(config, storage, args.seed)?;

        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut last = Instant::now();
        println!("{COMMANDS}");

        loop {
            // Catch the game clock up with real time
            let now = Instant::now();
            game.advance(now.duration_since(last).as_millis() as u64)?;
            last = now;

            report(game.drain_events());
            draw(&game);
            print!("> ");
            io::stdout().flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            let now = Instant::now();
            game.advance(now.duration_since(last).as_millis() as u64)?;
            last = now;

            match parse_command(&line) {
                Command::Flip(id) => {
                    if !game.handle_card_click(id) {
                        println!("Can't flip card {id} right now");
                    }
                }
                Command::Category(name) => match Category::from_str(name) {
                    Some(category) => match game.switch_category(category)? {
                        CategorySwitch::NeedsConfirmation => {
                            if confirm(
                                &mut input,
                                "Switching categories will reset your current progress. Continue?",
                            )? {
                                game.confirm_switch_category(category)?;
                            }
                        }
                        CategorySwitch::Unchanged => println!("Already playing {category}"),
                        CategorySwitch::Switched => {}
                    },
                    None => println!("Unknown category '{name}' (animals, symbols, foods)"),
                },
                Command::Reset => {
                    if confirm(&mut input, "Reset the game? All progress will be lost.")? {
                        game.reset()?;
                    }
                }
                Command::NewGame => {
                    if game.phase() == GamePhase::GameComplete {
                        game.play_again()?;
                    } else {
                        println!("The game isn't finished yet; use 'r' to reset");
                    }
                }
                Command::Refresh => {}
                Command::Help => println!("{COMMANDS}"),
                Command::Quit => break,
                Command::Unknown => println!("Unknown command. {COMMANDS}"),
            }
        }

        log::info!("Goodbye");
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(e) = terminal::run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start, this is just to satisfy the compiler
}
