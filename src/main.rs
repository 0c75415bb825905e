//! Rulegen CLI - Mutate a seed ruleset from JSON configuration.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use rulegen::{
    evolution::{Mutation, RuleRng},
    schema::{GeneratorConfig, RuleSet, Vocabulary},
};

/// Contents of the seed file: the level's usable sprites and a starting
/// ruleset.
#[derive(Debug, Serialize, Deserialize)]
struct SeedFile {
    sprites: Vocabulary,
    rules: RuleSet,
}

impl SeedFile {
    fn example() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            sprites: Vocabulary::new(["avatar", "wall", "box", "goal"])?,
            rules: RuleSet::from_text(
                &["avatar wall > stepBack", "box avatar > bounceForward"],
                &[
                    "box goal > SpriteCounter stype=box win=True limit=0",
                    "avatar wall > Timeout win=False limit=500",
                ],
            )?,
        })
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        print_example_files();
        return;
    }

    if args.len() < 3 {
        eprintln!("Usage: {} <config.json> <seed.json> [generations]", args[0]);
        eprintln!();
        eprintln!("Mutate a seed ruleset and print every generation.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to generator configuration file");
        eprintln!("  seed.json    Path to sprites and starting ruleset");
        eprintln!("  generations  Number of mutation rounds (default: 10)");
        eprintln!();
        eprintln!("Example files are generated with --example flag.");
        std::process::exit(1);
    }

    let config_path = PathBuf::from(&args[1]);
    let seed_path = PathBuf::from(&args[2]);
    let generations: usize = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(10);

    let config = GeneratorConfig::load(&config_path).unwrap_or_else(|e| {
        eprintln!("Error loading config: {}", e);
        std::process::exit(1);
    });

    let seed_str = fs::read_to_string(&seed_path).unwrap_or_else(|e| {
        eprintln!("Error reading seed file: {}", e);
        std::process::exit(1);
    });

    let seed: SeedFile = serde_json::from_str(&seed_str).unwrap_or_else(|e| {
        eprintln!("Error parsing seed: {}", e);
        std::process::exit(1);
    });

    let mut rng = match config.random_seed {
        Some(s) => RuleRng::new(s),
        None => RuleRng::random(),
    };

    println!("Rulegen");
    println!("=======");
    println!("Sprites: {}", seed.sprites.as_slice().join(", "));
    println!(
        "Rules: {} interactions, {} terminations",
        seed.rules.interactions.len(),
        seed.rules.terminations.len()
    );
    println!("Generations: {}", generations);
    println!();

    let mut rules = seed.rules;
    let mut applied = 0;
    for generation in 1..=generations {
        let mutations = rng.mutate(&mut rules, &config.mutation, &seed.sprites);
        applied += mutations.iter().filter(|m| !m.is_skipped()).count();

        println!("Generation {}/{}:", generation, generations);
        for mutation in &mutations {
            println!("  {}", describe(mutation));
        }
        print_rules(&rules);
        println!();
    }

    println!("Applied {} mutations over {} generations", applied, generations);
}

fn describe(mutation: &Mutation) -> String {
    match mutation {
        Mutation::InsertParam { kind, rule, param } => {
            format!("+ {kind} #{rule}: {param}")
        }
        Mutation::InsertRule { kind, rule } => format!("+ {kind}: {rule}"),
        Mutation::DeleteParam { kind, rule, param } => {
            format!("- {kind} #{rule}: {param}")
        }
        Mutation::DeleteRule { kind, rule } => format!("- {kind}: {rule}"),
        Mutation::ModifyParam {
            kind,
            rule,
            from,
            to,
        }
        | Mutation::RenameRule {
            kind,
            rule,
            from,
            to,
        } => format!("~ {kind} #{rule}: {from} -> {to}"),
        Mutation::Skipped {
            kind,
            operator,
            reason,
        } => format!("  {kind} {operator:?} skipped ({reason})"),
    }
}

fn print_rules(rules: &RuleSet) {
    let (interactions, terminations) = rules.to_text();
    println!("  InteractionSet");
    for rule in &interactions {
        println!("    {}", rule);
    }
    println!("  TerminationSet");
    for rule in &terminations {
        println!("    {}", rule);
    }
}

fn print_example_files() {
    let config = GeneratorConfig {
        random_seed: Some(42),
        ..Default::default()
    };
    let seed = SeedFile::example().unwrap_or_else(|e| {
        eprintln!("Error building example seed: {}", e);
        std::process::exit(1);
    });

    let render = |value: serde_json::Result<String>| {
        value.unwrap_or_else(|e| {
            eprintln!("Error serializing example: {}", e);
            std::process::exit(1);
        })
    };

    println!("Example configuration (config.json):");
    println!("{}", render(serde_json::to_string_pretty(&config)));
    println!();
    println!("Example seed (seed.json):");
    println!("{}", render(serde_json::to_string_pretty(&seed)));
}
