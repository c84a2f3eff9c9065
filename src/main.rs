use bevy::prelude::*;
use clap::Parser;
use colored::Colorize;
use serde::Serialize;

use physics_dice::dice3d::{
    handle_input, DiceError, DiceRollInputs, DiceRoller, DiceRollerPlugin, DiceRollerSystems,
    DiceSettings, DiceType, DieConfig, DieConfigSetting, RollInput, RollResult, StartingDice,
};

/// Frame rate the headless mode pretends to render at.
const HEADLESS_FPS: f32 = 60.0;

/// Physics dice roller
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dice to roll (e.g., "2d6", "1d20", "d8"). Can specify multiple.
    #[arg(short, long, value_parser = parse_dice_arg)]
    dice: Option<Vec<(usize, DiceType)>>,

    /// RON file with a list of dice (kind, colors, surface)
    #[arg(long)]
    dice_file: Option<String>,

    /// RON file overriding simulation settings
    #[arg(short, long)]
    settings: Option<String>,

    /// Impact sound volume (0.0 - 1.0)
    #[arg(long, default_value = "0.8")]
    volume: f32,

    /// Seed for a reproducible throw
    #[arg(long)]
    seed: Option<u64>,

    /// Simulate without a window and print the result
    #[arg(long)]
    headless: bool,

    /// With --headless, print the result as JSON
    #[arg(long, requires = "headless")]
    json: bool,
}

fn parse_dice_arg(s: &str) -> Result<(usize, DiceType), String> {
    let s = s.to_lowercase();

    // Handle formats: "2d6", "d20", "1d8"
    let (count_str, die_str) = if s.starts_with('d') {
        ("1", s.as_str())
    } else if let Some(pos) = s.find('d') {
        (&s[..pos], &s[pos..])
    } else {
        return Err(format!(
            "Invalid dice format: {}. Use format like '2d6' or 'd20'",
            s
        ));
    };

    let count: usize = count_str
        .parse()
        .map_err(|_| format!("Invalid count: {}", count_str))?;
    let die_type = die_str.parse::<DiceType>().map_err(|e| e.to_string())?;

    Ok((count, die_type))
}

fn load_settings(path: Option<&str>) -> Result<DiceSettings, DiceError> {
    match path {
        Some(path) => DiceSettings::load(path),
        None => Ok(DiceSettings::default()),
    }
}

fn build_dice(args: &Args) -> Result<Vec<DieConfig>, String> {
    let mut dice = Vec::new();

    if let Some(path) = &args.dice_file {
        dice.extend(DieConfigSetting::load_list(path).map_err(|e| e.to_string())?);
    }

    if let Some(dice_args) = &args.dice {
        for (count, die_type) in dice_args {
            for _ in 0..*count {
                dice.push(DieConfig::new(*die_type));
            }
        }
    }

    // Default to a single d20
    if dice.is_empty() && args.dice_file.is_none() {
        dice.push(DieConfig::new(DiceType::D20));
    }

    Ok(dice)
}

#[derive(Serialize)]
struct HeadlessReport<'a> {
    dice: Vec<&'static str>,
    values: &'a [u32],
    total: u32,
    session_id: u64,
}

/// Run the roller at a fixed frame rate until it resolves.
fn roll_headless(settings: DiceSettings, dice: &[DieConfig]) -> Option<RollResult> {
    let frame_dt = 1.0 / HEADLESS_FPS;
    // Timeout plus a couple of seconds of slack for spawning.
    let max_frames = ((settings.physics.max_roll_seconds + 2.0) * HEADLESS_FPS).ceil() as usize;

    let mut roller = DiceRoller::new(settings);
    let kinds: Vec<DiceType> = dice.iter().map(|d| d.kind).collect();
    let input = RollInput {
        kinds: &kinds,
        trigger: 1,
    };

    (0..max_frames).find_map(|_| roller.update(&input, frame_dt).result)
}

fn print_result(dice: &[DieConfig], result: &RollResult, json: bool) {
    if json {
        let report = HeadlessReport {
            dice: dice.iter().map(|d| d.kind.name()).collect(),
            values: &result.values,
            total: result.total(),
            session_id: result.session_id,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
        }
        return;
    }

    println!("{}", "Results:".cyan().bold());
    for (config, value) in dice.iter().zip(&result.values) {
        println!("  {}: {}", config.kind.name().cyan(), value);
    }
    println!(
        "{} {}",
        "TOTAL:".bright_green().bold(),
        result.total().to_string().bright_green().bold()
    );
}

fn main() {
    let args = Args::parse();

    // No log subscriber is installed yet, so report problems directly.
    let mut settings = match load_settings(args.settings.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!(
                "{} {}; using default settings",
                "Warning:".yellow().bold(),
                e
            );
            DiceSettings::default()
        }
    };
    if args.seed.is_some() {
        settings.seed = args.seed;
    }

    let dice = match build_dice(&args) {
        Ok(dice) => dice,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    if args.headless {
        match roll_headless(settings, &dice) {
            Some(result) => print_result(&dice, &result, args.json),
            None => {
                eprintln!("{} roll did not resolve", "Error:".red().bold());
                std::process::exit(1);
            }
        }
        return;
    }

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Physics Dice".into(),
                resolution: (1280_u32, 720_u32).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(DiceRollerPlugin::new(settings))
        .insert_resource(StartingDice(dice.clone()))
        .insert_resource(DiceRollInputs {
            configs: dice,
            trigger: 0,
            volume: args.volume,
        })
        .add_systems(Update, handle_input.before(DiceRollerSystems))
        .run();
}
