// Copyright (c) 2022, Mangekyou Network, Inc.
// SPDX-License-Identifier: Apache-2.0

use clap::{Parser, ValueEnum};
use dicebreak::config::GameConfig;
use dicebreak::error::DiceError;
use dicebreak::roll::{next_winning_nonce, upcoming_rolls, RollInput, WinCondition, ROLL_MODULUS};
use dicebreak::simulation::{self, AttackStrategy, SimulationConfig};
use dicebreak::types::{format_ether, parse_ether, Address, BlockHash, Wei};
use std::io::{Error, ErrorKind};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

#[derive(Parser)]
#[command(name = "dice-cli")]
#[command(about = "Predict blockhash dice rolls and replay the attack against an in-memory game.", long_about = None)]
enum Command {
    /// Compute the roll for one block hash, game address and nonce.
    Roll(RollArguments),

    /// List the upcoming rolls against one block and find the next winning nonce.
    Predict(PredictArguments),

    /// Run a seeded game between honest players and an attacker.
    Simulate(SimulateArguments),

    /// Print or check a game configuration.
    Config(ConfigArguments),
}

#[derive(Parser, Clone)]
struct RollArguments {
    /// Hex encoded hash of the previous block. Must be 32 bytes.
    #[clap(short, long)]
    block_hash: String,

    /// Hex encoded address of the game. Defaults to the reference deployment.
    #[clap(short, long)]
    game: Option<String>,

    /// Counter value consumed by the roll.
    #[clap(short, long)]
    nonce: u64,
}

#[derive(Parser, Clone)]
struct PredictArguments {
    /// Hex encoded hash of the previous block. Must be 32 bytes.
    #[clap(short, long)]
    block_hash: String,

    /// Hex encoded address of the game. Defaults to the reference deployment.
    #[clap(short, long)]
    game: Option<String>,

    /// First nonce to roll.
    #[clap(short, long, default_value_t = 0)]
    start_nonce: u64,

    /// How many nonces to scan.
    #[clap(short, long, default_value_t = 16)]
    count: usize,

    /// Winning faces, either `equals:<face>` or `at-most:<face>`.
    #[clap(short, long, default_value = "equals:0", value_parser = parse_win_condition)]
    win: WinCondition,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Strategy {
    OffChain,
    Contract,
}

impl From<Strategy> for AttackStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::OffChain => AttackStrategy::OffChain,
            Strategy::Contract => AttackStrategy::Contract,
        }
    }
}

#[derive(Parser, Clone, Default)]
struct SimulateArguments {
    /// JSON game configuration. Defaults to the built-in game.
    #[clap(long)]
    game_config: Option<PathBuf>,

    /// JSON simulation configuration.
    #[clap(long)]
    sim_config: Option<PathBuf>,

    /// Use the parameters of the original challenge deployment.
    #[clap(long, conflicts_with = "game_config")]
    original: bool,

    /// Entry fee in ether, for example `0.002`. Overrides the game configuration.
    #[clap(long, value_parser = parse_ether)]
    fee: Option<Wei>,

    #[clap(long)]
    rounds: Option<u32>,

    #[clap(long)]
    seed: Option<u64>,

    /// Number of honest players.
    #[clap(long)]
    players: Option<u32>,

    /// Chance that an honest wager lands between the attacker's read and its submission.
    #[clap(long)]
    interleave: Option<f64>,

    #[clap(long, value_enum)]
    strategy: Option<Strategy>,
}

#[derive(Parser, Clone, Default)]
struct ConfigArguments {
    /// Print the parameters of the original challenge deployment.
    #[clap(long)]
    original: bool,

    /// Validate a JSON game configuration instead of printing one.
    #[clap(long)]
    check: Option<PathBuf>,
}

fn main() {
    init_tracing();
    match execute(Command::parse()) {
        Ok(res) => {
            println!("{}", res);
            std::process::exit(exitcode::OK);
        }
        Err(e) => {
            println!("Error: {}", e);
            let code = match e.kind() {
                ErrorKind::InvalidData => exitcode::CONFIG,
                _ => exitcode::DATAERR,
            };
            std::process::exit(code);
        }
    }
}

/// Logs go to stderr so stdout only carries command output. `RUST_LOG`
/// overrides the default `warn` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let subscriber = Registry::default().with(filter).with(fmt_layer);
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install log subscriber: {}", e);
    }
}

fn parse_win_condition(s: &str) -> Result<WinCondition, String> {
    let (kind, face) = s
        .split_once(':')
        .ok_or_else(|| format!("expected equals:<face> or at-most:<face>, got {}", s))?;
    let face: u8 = face
        .parse()
        .map_err(|_| format!("invalid face {}", face))?;
    let condition = match kind {
        "equals" => WinCondition::Equals(face),
        "at-most" => WinCondition::AtMost(face),
        _ => return Err(format!("unknown win condition {}", kind)),
    };
    condition.validate().map_err(|e| e.to_string())?;
    Ok(condition)
}

fn parse_block_hash(s: &str) -> Result<BlockHash, Error> {
    s.parse()
        .map_err(|_| Error::new(ErrorKind::InvalidInput, "Invalid block hash."))
}

fn parse_game(s: Option<&str>) -> Result<Address, Error> {
    match s {
        Some(s) => s
            .parse()
            .map_err(|_| Error::new(ErrorKind::InvalidInput, "Invalid game address.")),
        None => Ok(GameConfig::default().game_address),
    }
}

fn config_error(e: DiceError) -> Error {
    match e {
        DiceError::InvalidConfig(_) | DiceError::Io(_) => Error::new(ErrorKind::InvalidData, e),
        _ => Error::new(ErrorKind::Other, e),
    }
}

fn load_simulation_config(arguments: &SimulateArguments) -> Result<SimulationConfig, Error> {
    let mut sim = match &arguments.sim_config {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|e| Error::new(ErrorKind::InvalidData, e))?;
            serde_json::from_str(&json).map_err(|e| Error::new(ErrorKind::InvalidData, e))?
        }
        None => SimulationConfig::default(),
    };
    if let Some(rounds) = arguments.rounds {
        sim.rounds = rounds;
    }
    if let Some(seed) = arguments.seed {
        sim.seed = seed;
    }
    if let Some(players) = arguments.players {
        sim.honest_players = players;
    }
    if let Some(interleave) = arguments.interleave {
        sim.interleave_probability = interleave;
    }
    if let Some(strategy) = arguments.strategy {
        sim.strategy = strategy.into();
    }
    sim.validate().map_err(config_error)?;
    Ok(sim)
}

fn execute(cmd: Command) -> Result<String, std::io::Error> {
    match cmd {
        Command::Roll(arguments) => {
            let block_hash = parse_block_hash(&arguments.block_hash)?;
            let game = parse_game(arguments.game.as_deref())?;
            let input = RollInput::new(block_hash, game, arguments.nonce);

            let mut result = "Digest: ".to_string();
            result.push_str(&hex::encode(input.digest()));
            result.push_str("\nRoll:   ");
            result.push_str(&input.roll().to_string());
            Ok(result)
        }

        Command::Predict(arguments) => {
            let block_hash = parse_block_hash(&arguments.block_hash)?;
            let game = parse_game(arguments.game.as_deref())?;

            let mut lines: Vec<String> = upcoming_rolls(block_hash, game, arguments.start_nonce)
                .take(arguments.count)
                .map(|(nonce, roll)| {
                    let marker = if arguments.win.is_win(roll) { " win" } else { "" };
                    format!("Nonce {}: {}{}", nonce, roll, marker)
                })
                .collect();
            match next_winning_nonce(
                block_hash,
                game,
                arguments.start_nonce,
                arguments.win,
                arguments.count,
            ) {
                Some(nonce) => lines.push(format!("Next winning nonce: {}", nonce)),
                None => lines.push(format!("No winning nonce in {} rolls", arguments.count)),
            }
            Ok(lines.join("\n"))
        }

        Command::Simulate(arguments) => {
            let mut game = match (&arguments.game_config, arguments.original) {
                (Some(path), _) => GameConfig::load(path).map_err(config_error)?,
                (None, true) => GameConfig::original_challenge(),
                (None, false) => GameConfig::default(),
            };
            if let Some(fee) = arguments.fee {
                game.entry_fee = fee;
                game.validate().map_err(config_error)?;
            }
            let sim = load_simulation_config(&arguments)?;
            let report = simulation::run(game, &sim).map_err(config_error)?;
            serde_json::to_string_pretty(&report).map_err(|e| Error::new(ErrorKind::Other, e))
        }

        Command::Config(arguments) => match arguments.check {
            Some(path) => {
                let config = GameConfig::load(&path).map_err(config_error)?;
                Ok(format!(
                    "Config is valid.\nGame:      {}\nEntry fee: {} ether\nWin:       {}\nOdds:      {}/{}",
                    config.game_address,
                    format_ether(config.entry_fee),
                    config.win_condition,
                    config.win_condition.winning_faces(),
                    ROLL_MODULUS
                ))
            }
            None => {
                let config = if arguments.original {
                    GameConfig::original_challenge()
                } else {
                    GameConfig::default()
                };
                config.to_json_pretty().map_err(config_error)
            }
        },
    }
}
