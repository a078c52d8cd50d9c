//! AI dungeon master CLI.
//!
//! A line-oriented frontend over the two-agent engine:
//! - plain lines are sent as player actions,
//! - lines starting with `#` are commands (state, quit, help).

use chatdm_core::manager::ManagerError;
use chatdm_core::prompts::PromptTable;
use chatdm_core::GameMaster;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if std::env::var("OPENAI_API_KEY").is_err() {
        eprintln!("Error: OPENAI_API_KEY environment variable not set.");
        eprintln!("Please set it in .env file or with: export OPENAI_API_KEY=your_key_here");
        std::process::exit(1);
    }

    let client = Arc::new(openai::OpenAi::from_env()?);
    let prompts = PromptTable::default();
    let mut master = GameMaster::new(client, &prompts);

    println!("=== ChatDM ===");
    println!("Type your actions, one per line. #help for commands.");
    println!();

    let opening = master.start().await?;
    println!("{opening}");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('#') {
            match command.split_whitespace().next() {
                Some("quit") | Some("exit") => {
                    println!("Goodbye!");
                    break;
                }
                Some("state") => {
                    let world = master.world();
                    println!("[STATE]");
                    println!("  Room: {}", current_room_name(&master));
                    println!("  Inventory: {}", world.player_held_items.join(", "));
                    for room in &world.rooms {
                        for enemy in &room.enemies {
                            println!(
                                "  Enemy: {} (HP {}, {})",
                                enemy.name, enemy.health, enemy.status
                            );
                        }
                    }
                }
                Some("help") => {
                    println!("[HELP]");
                    println!("  #quit  - Exit the game");
                    println!("  #state - Show the current world state");
                    println!("  #help  - Show this help");
                    println!("  (anything else is sent as a player action)");
                }
                _ => {
                    println!("[ERROR] Unknown command. Type #help for help.");
                }
            }
            stdout.flush().ok();
            continue;
        }

        print!("[THINKING]");
        stdout.flush().ok();

        match master.player_turn(line).await {
            Ok(report) => {
                print!("\r           \r");
                println!("{}", report.narrative);
                println!();
            }
            Err(ManagerError::TurnInFlight) => {
                print!("\r           \r");
                println!("[BUSY] A turn is still being resolved.");
            }
            Err(e) => {
                print!("\r           \r");
                eprintln!("[ERROR] {e}");
            }
        }
        stdout.flush().ok();
    }

    Ok(())
}

fn current_room_name(master: &GameMaster) -> String {
    let world = master.world();
    usize::try_from(world.current_room_index)
        .ok()
        .and_then(|index| world.rooms.get(index))
        .map(|room| room.name.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}
