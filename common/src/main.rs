use rand::prelude::IndexedRandom;
use std::collections::HashSet;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use valentine::*;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- 1. Initialization ---
    let config = Config::from_args(std::env::args().skip(1))?;
    let mut rng = config.rng();
    let mut session = Session::new(&config, &mut rng);

    println!("--- Autonomous Valentine Bot ---");
    println!("Puzzle: {}, evasion: {}", config.puzzle, config.policy);
    println!("{}", session.puzzle().hint());
    print_grid(session.puzzle());
    thread::sleep(Duration::from_millis(500));

    // --- 2. Solve the captcha ---
    let mut move_count = 0;
    let mut rejected = HashSet::new();
    while !session.puzzle().is_solved() {
        move_count += 1;
        println!("\n--- Move #{} ---", move_count);

        match session.puzzle().clone() {
            Puzzle::Swap(puzzle) => {
                // Strategy: put the first misplaced tile home with one drag.
                let Some(target) = (0..TOTAL_CELLS).find(|&pos| !puzzle.is_correct(pos)) else {
                    break;
                };
                let Some(source) = puzzle.tiles().iter().position(|&id| id as usize == target)
                else {
                    anyhow::bail!("tile {target} missing from the grid");
                };

                let mut gesture = DragGesture::default();
                gesture.start(source, &puzzle);
                gesture.hover(Some(target));
                if let Some((a, b)) = gesture.finish(Some(target)) {
                    println!("Bot drags cell {} onto cell {}.", a, b);
                    session.swap(a, b);
                }
            }
            Puzzle::Select(puzzle) => {
                // Strategy: click unknown cells at random; decoys are refused.
                let candidates: Vec<usize> = (0..TOTAL_CELLS)
                    .filter(|pos| !puzzle.is_selected(*pos) && !rejected.contains(pos))
                    .collect();
                let Some(&pos) = candidates.choose(&mut rng) else {
                    println!("No cells left to try.");
                    break;
                };
                match session.toggle(pos) {
                    Some(Toggle::Rejected { hint }) => {
                        println!("Cell {} refused: {}", pos, hint);
                        rejected.insert(pos);
                    }
                    Some(toggle) => println!("Cell {} -> {:?}", pos, toggle),
                    None => break,
                }
            }
        }

        print_grid(session.puzzle());
        thread::sleep(Duration::from_millis(200));
    }

    if !session.verify() {
        anyhow::bail!("captcha could not be verified");
    }
    println!("{} Verified after {} moves.", session.puzzle().hint(), move_count);

    // --- 3. Chase the decline control ---
    println!("\n--- Response Screen ---");
    for attempt in 1..=5 {
        let target = Rect::at(session.placer().position(), session.layout().control).center();
        let trigger = Trigger::PointerEnter(Some(target));
        let Some(placement) = session.decline(trigger, &mut rng) else {
            break;
        };
        let pos = session.placer().position();
        println!(
            "Attempt {}: reaching for ({:.0}, {:.0}), decline jumps to ({:.0}, {:.0}) via {:?}",
            attempt, target.x, target.y, pos.x, pos.y, placement
        );
        thread::sleep(Duration::from_millis(200));
    }

    // --- 4. Final Result ---
    println!("\n--- Giving Up On \"No\" ---");
    match session.accept() {
        Some(message) => println!("{}", message),
        None => println!("The response screen never opened."),
    }
    Ok(())
}

fn print_grid(puzzle: &Puzzle) {
    print!("   ");
    for x in 0..GRID_SIZE {
        print!("{:^3}", x);
    }
    println!("\n  +{}", "---".repeat(GRID_SIZE));

    for y in 0..GRID_SIZE {
        print!("{:^2}|", y);
        for x in 0..GRID_SIZE {
            let pos = y * GRID_SIZE + x;
            let display = match puzzle {
                Puzzle::Swap(p) if p.is_correct(pos) => format!("[{}]", p.tiles()[pos]),
                Puzzle::Swap(p) => format!(" {} ", p.tiles()[pos]),
                Puzzle::Select(p) if p.is_selected(pos) => " ♥ ".to_string(),
                Puzzle::Select(_) => " ■ ".to_string(),
            };
            print!("{}", display);
        }
        println!();
    }
    if let Puzzle::Swap(p) = puzzle {
        println!("Moves: {}", p.moves());
    }
    println!();
}
