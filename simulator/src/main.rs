use anyhow::Context;
use clap::{Parser, Subcommand};
use std::{path::PathBuf, time::Duration};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, info};
use wager_execution::{casino::blackjack::BlackjackView, Bet, BetOptions, GameRng, Session};
use wager_simulator::{Config, FileStore};
use wager_types::casino::{
    dollars, Card, DiceCall, Multiplier, Outcome, OutcomeDetail, Selection, Severity, BALANCE_KEY,
    HISTORY_KEY, STATS_KEY,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the saved balance, history and stats
    #[arg(long)]
    state_dir: Option<String>,

    /// Seed for reproducible play
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the current balance
    Balance,
    /// Show wagering statistics
    Stats,
    /// Show recent rounds, newest first
    History {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Ride the multiplier; press Enter to cash out
    Crash {
        #[arg(short, long)]
        bet: u64,
        #[arg(short, long)]
        auto_cashout: Option<Multiplier>,
    },
    /// Spin the wheel on one or more targets (red, black, green or 0-36)
    Roulette {
        #[arg(short, long)]
        bet: u64,
        #[arg(long = "on", required = true)]
        on: Vec<Selection>,
    },
    /// Play a hand: h to hit, s to stand, d to double down
    Blackjack {
        #[arg(short, long)]
        bet: u64,
    },
    /// Pull the lever
    Slots {
        #[arg(short, long)]
        bet: u64,
    },
    /// Bet on the sum of two dice
    Dice {
        #[arg(short, long)]
        bet: u64,
        #[arg(long)]
        call: DiceCall,
    },
    /// Reset balance, history and statistics
    Reset,
}

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse args
    let args = Args::parse();

    // Load config
    let mut config = match &args.config {
        Some(path) => Config::load(path).context("failed to load config")?,
        None => Config::default(),
    };
    if let Some(state_dir) = args.state_dir {
        config.state_dir = state_dir;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    let config = config.validate().context("invalid config")?;

    // Create logger
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_writer(std::io::stderr)
        .init();

    let store = FileStore::new(&config.state_dir);
    let rng = config.seed.map(GameRng::seeded).unwrap_or_default();
    let mut session = Session::with_store(store.clone(), rng)
        .with_context(|| format!("failed to load state from {}", store.dir().display()))?;
    debug!(state_dir = %store.dir().display(), seed = ?config.seed, "session ready");

    let mut input: Input = BufReader::new(tokio::io::stdin()).lines();
    let wagered = !matches!(
        args.command,
        Command::Balance | Command::Stats | Command::History { .. } | Command::Reset
    );
    match args.command {
        Command::Balance => println!("Balance: ${}", dollars(session.ledger().balance())),
        Command::Stats => print_stats(&session),
        Command::History { limit } => print_history(&session, limit),
        Command::Crash { bet, auto_cashout } => {
            play_crash(&mut session, bet, auto_cashout, config.tick_interval, &mut input).await?
        }
        Command::Roulette { bet, on } => {
            let bet = Bet::new(bet, BetOptions::Roulette { selections: on });
            let _ = session.start_round(bet);
        }
        Command::Blackjack { bet } => {
            play_blackjack(&mut session, bet, config.tick_interval, &mut input).await?
        }
        Command::Slots { bet } => {
            let _ = session.start_round(Bet::new(bet, BetOptions::Slots));
        }
        Command::Dice { bet, call } => {
            let _ = session.start_round(Bet::new(bet, BetOptions::Dice { call }));
        }
        Command::Reset => {
            session.reset();
            store.clear(&[BALANCE_KEY, HISTORY_KEY, STATS_KEY]);
            info!("state cleared");
            println!("Balance reset to ${}", dollars(session.ledger().balance()));
        }
    }

    announce(&mut session);
    if wagered {
        println!("Balance: ${}", dollars(session.ledger().balance()));
    }
    Ok(())
}

async fn play_crash(
    session: &mut Session,
    bet: u64,
    auto_cashout: Option<Multiplier>,
    tick_interval: Duration,
    input: &mut Input,
) -> anyhow::Result<()> {
    let options = BetOptions::Crash { auto_cashout };
    if session.start_round(Bet::new(bet, options)).is_err() {
        return Ok(());
    }
    println!("Round started. Press Enter to cash out.");

    let mut ticker = tokio::time::interval(tick_interval);
    let mut stdin_open = true;
    while session.crash_round().is_some() {
        tokio::select! {
            _ = ticker.tick() => {
                session.tick();
                if let Some(round) = session.crash_round() {
                    if round.ticks() % 10 == 0 {
                        println!("{}  (cash out: ${})", round.multiplier(), dollars(round.potential_win()));
                    }
                }
            }
            line = input.next_line(), if stdin_open => {
                match line.context("failed to read stdin")? {
                    Some(_) => {
                        let _ = session.cash_out();
                    }
                    None => stdin_open = false,
                }
            }
        }
    }

    let recent: Vec<String> = session.crash().history().map(|m| m.to_string()).collect();
    println!("Recent: {}", recent.join("  "));
    Ok(())
}

async fn play_blackjack(
    session: &mut Session,
    bet: u64,
    tick_interval: Duration,
    input: &mut Input,
) -> anyhow::Result<()> {
    let mut settled = match session.start_round(Bet::new(bet, BetOptions::Blackjack)) {
        Ok(outcome) => outcome,
        Err(_) => return Ok(()),
    };

    // Player turn
    while let Some(view) = session.blackjack_view() {
        if session.dealer_pending() {
            break;
        }
        print_table(&view);
        let prompt = if view.can_double {
            "[h]it, [s]tand, [d]ouble?"
        } else {
            "[h]it, [s]tand?"
        };
        println!("{prompt}");
        let result = match input.next_line().await.context("failed to read stdin")? {
            Some(line) => match line.trim() {
                "h" | "hit" => session.hit(),
                "s" | "stand" => session.stand(),
                "d" | "double" => session.double_down(),
                _ => continue,
            },
            // Stdin closed: stand
            None => session.stand(),
        };
        if let Ok(Some(outcome)) = result {
            settled = Some(outcome);
        }
        announce(session);
    }

    // Dealer turn, one card per tick
    let mut ticker = tokio::time::interval(tick_interval * 5);
    while session.dealer_pending() {
        if let Some(view) = session.blackjack_view() {
            print_table(&view);
        }
        ticker.tick().await;
        if let Some(outcome) = session.tick() {
            settled = Some(outcome);
        }
    }

    if let Some(lines) = settled.as_ref().and_then(final_hands) {
        println!("{}", lines.join("\n"));
    }
    Ok(())
}

/// Both hands as they stood when a blackjack round settled.
fn final_hands(outcome: &Outcome) -> Option<[String; 2]> {
    let OutcomeDetail::Blackjack {
        player,
        dealer,
        player_score,
        dealer_score,
        ..
    } = &outcome.detail
    else {
        return None;
    };
    Some([
        format!("Dealer: {} ({dealer_score})", hand(dealer)),
        format!("You:    {} ({player_score})", hand(player)),
    ])
}

fn print_table(view: &BlackjackView) {
    let dealer: Vec<String> = view
        .dealer
        .iter()
        .map(|card| card.map_or_else(|| "??".to_string(), |c| c.to_string()))
        .collect();
    let dealer_score = view
        .dealer_score
        .map_or_else(|| "?".to_string(), |s| s.to_string());
    println!("Dealer: {} ({dealer_score})", dealer.join(" "));
    println!("You:    {} ({})", hand(&view.player), view.player_score);
}

fn hand(cards: &[Card]) -> String {
    cards
        .iter()
        .map(Card::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_stats(session: &Session) {
    let ledger = session.ledger();
    let totals = ledger.totals();
    println!("Balance:       ${}", dollars(ledger.balance()));
    println!("Games played:  {}", totals.games_played);
    println!("Total wagered: ${}", dollars(totals.total_wagered));
    println!("Total won:     ${}", dollars(totals.total_won));
    println!("Net profit:    {}", signed(totals.net_profit()));
}

fn print_history(session: &Session, limit: usize) {
    let ledger = session.ledger();
    if ledger.history().len() == 0 {
        println!("No games played yet");
        return;
    }
    for entry in ledger.history().take(limit) {
        println!(
            "{:<10} ${:>8}  {:>8}  {}",
            entry.game.name(),
            dollars(entry.bet_amount),
            entry.multiplier.to_string(),
            signed(entry.profit)
        );
    }
}

fn signed(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "+" };
    format!("{sign}${}", dollars(amount.unsigned_abs()))
}

/// Print and clear pending notifications.
fn announce(session: &mut Session) {
    for event in session.drain_events() {
        let tag = match event.severity() {
            Severity::Success => "WIN",
            Severity::Error => "!!",
            Severity::Info => "--",
        };
        println!("[{tag}] {event}");
    }
}
