//////////////////////////
// main.rs
//////////////////////////

use std::io::{self, BufRead, Write};

use colored::*;

use chess_lobby::game::GameState;
use chess_lobby::server::start_server;
use chess_lobby::types::{AppliedMove, MoveFlags, Move, PromotionKind};

const DEFAULT_PORT: u16 = 3000;

fn parse_square(s: &str) -> Option<(usize, usize)> {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() != 2 {
        return None;
    }
    let col = match chars[0] {
        'a'..='h' => (chars[0] as u8 - b'a') as usize,
        _ => return None,
    };
    // rank 1 is the bottom of the printed board, row 7 internally
    let row = match chars[1] {
        '1'..='8' => 8 - (chars[1] as u8 - b'0') as usize,
        _ => return None,
    };
    Some((row, col))
}

fn parse_move_string(move_str: &str) -> Result<((usize, usize), (usize, usize)), &'static str> {
    let parts: Vec<&str> = move_str.split_whitespace().collect();
    if parts.len() == 2 {
        let from = parse_square(parts[0]).ok_or("Invalid 'from' square")?;
        let to = parse_square(parts[1]).ok_or("Invalid 'to' square")?;
        Ok((from, to))
    } else if move_str.len() == 4 {
        let from = parse_square(&move_str[0..2]).ok_or("Invalid 'from' square")?;
        let to = parse_square(&move_str[2..4]).ok_or("Invalid 'to' square")?;
        Ok((from, to))
    } else {
        Err("Invalid move format - use 'e2 e4' or 'e2e4'")
    }
}

fn prompt_promotion(lines: &mut impl Iterator<Item = io::Result<String>>) -> PromotionKind {
    loop {
        println!("Promote to? [q]ueen [r]ook [b]ishop k[n]ight:");
        let Some(Ok(input)) = lines.next() else {
            return PromotionKind::Queen;
        };
        match input.trim() {
            "q" | "queen" | "" => return PromotionKind::Queen,
            "r" | "rook" => return PromotionKind::Rook,
            "b" | "bishop" => return PromotionKind::Bishop,
            "n" | "knight" => return PromotionKind::Knight,
            _ => println!("{}", "Pick one of q, r, b, n".yellow()),
        }
    }
}

fn announce(flags: MoveFlags) {
    if flags.contains(MoveFlags::CASTLE) {
        println!("{}", "Castled!".cyan());
    }
    if flags.contains(MoveFlags::CHECKMATE) {
        println!("{}", "Checkmate!".bright_red().bold());
    } else if flags.contains(MoveFlags::CHECK) {
        println!("{}", "Check!".bright_yellow());
    }
}

fn play_hotseat() {
    let mut game = GameState::new();
    println!("{}", game);
    println!("Enter moves like 'e2 e4' or 'e2e4'. 'back' returns to the menu.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{} > ", game.turn());
        if io::stdout().flush().is_err() {
            return;
        }
        let Some(Ok(input)) = lines.next() else {
            return;
        };
        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input == "back" || input == "quit" {
            return;
        }

        let (from, to) = match parse_move_string(input) {
            Ok(squares) => squares,
            Err(msg) => {
                println!("{}", msg.yellow());
                continue;
            }
        };

        match game.apply_move(&Move::new(from, to)) {
            Ok(AppliedMove::Completed { flags }) => {
                println!("{}", game);
                announce(flags);
                if game.winner().is_some() {
                    return;
                }
            }
            Ok(AppliedMove::PromotionPending { .. }) => {
                let kind = prompt_promotion(&mut lines);
                match game.complete_promotion(kind) {
                    Ok(AppliedMove::Completed { flags }) => {
                        println!("{}", game);
                        announce(flags);
                        if game.winner().is_some() {
                            return;
                        }
                    }
                    Ok(AppliedMove::PromotionPending { .. }) => {}
                    Err(e) => println!("{}", e.to_string().red()),
                }
            }
            Err(e) => println!("{}", e.to_string().red()),
        }
    }
}

#[tokio::main]
async fn main() {
    println!("{}", "Chess Lobby".bright_white().bold());
    println!("Commands:");
    println!("  'play' - Start a local two-player game");
    println!("  'serve [port]' - Start the event relay (default port {})", DEFAULT_PORT);
    println!("  'quit' - Exit the program");

    loop {
        println!("\nEnter command:");
        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            break;
        }
        let input = input.trim();

        match input {
            "play" => play_hotseat(),
            cmd if cmd == "serve" || cmd.starts_with("serve ") => {
                let port = cmd
                    .trim_start_matches("serve")
                    .trim()
                    .parse::<u16>()
                    .unwrap_or(DEFAULT_PORT);
                start_server(port).await;
            }
            "quit" => break,
            "" => continue,
            _ => println!("Unknown command"),
        }
    }
    println!("Goodbye!");
}
