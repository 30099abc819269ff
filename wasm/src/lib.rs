use valentine as vt;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn create_swap_puzzle() -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let puzzle = vt::SwapPuzzle::generate(&mut rand::rng());
    puzzle.serialize().map_err(|e| e.to_string())
}

/// Returns the new state followed by one status byte: 0 ignored, 1 swapped, 2 solved.
#[wasm_bindgen]
pub fn swap_tiles(bts: Vec<u8>, a: usize, b: usize) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut puzzle = vt::SwapPuzzle::deserialize(&bts).map_err(|e| e.to_string())?;
    let status = match puzzle.attempt_swap(a, b) {
        vt::SwapOutcome::Ignored => 0,
        vt::SwapOutcome::Swapped => 1,
        vt::SwapOutcome::Solved => 2,
    };
    let mut xs = puzzle.serialize().map_err(|e| e.to_string())?;
    xs.push(status);
    Ok(xs)
}

/// `tiles[position] = tile id`.
#[wasm_bindgen]
pub fn get_tiles(bts: Vec<u8>) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let puzzle = vt::SwapPuzzle::deserialize(&bts).map_err(|e| e.to_string())?;
    Ok(puzzle.tiles().to_vec())
}

#[wasm_bindgen]
pub fn get_moves(bts: Vec<u8>) -> Result<u32, String> {
    console_error_panic_hook::set_once();

    let puzzle = vt::SwapPuzzle::deserialize(&bts).map_err(|e| e.to_string())?;
    Ok(puzzle.moves())
}

#[wasm_bindgen]
pub fn swap_hint(bts: Vec<u8>) -> Result<String, String> {
    console_error_panic_hook::set_once();

    let puzzle = vt::SwapPuzzle::deserialize(&bts).map_err(|e| e.to_string())?;
    Ok(puzzle.hint().to_string())
}

#[wasm_bindgen]
pub fn create_selection_puzzle() -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let puzzle = vt::SelectionPuzzle::generate(&mut rand::rng());
    puzzle.serialize().map_err(|e| e.to_string())
}

/// Returns the new state followed by one status byte: 0 rejected, 1 selected, 2 deselected.
#[wasm_bindgen]
pub fn toggle_cell(bts: Vec<u8>, pos: usize) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut puzzle = vt::SelectionPuzzle::deserialize(&bts).map_err(|e| e.to_string())?;
    let status = match puzzle.toggle(pos) {
        vt::Toggle::Rejected { .. } => 0,
        vt::Toggle::Selected => 1,
        vt::Toggle::Deselected => 2,
    };
    let mut xs = puzzle.serialize().map_err(|e| e.to_string())?;
    xs.push(status);
    Ok(xs)
}

/// One entry per cell: 0 decoy, 1 heart, 2 selected heart.
#[wasm_bindgen]
pub fn get_cells(bts: Vec<u8>) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let puzzle = vt::SelectionPuzzle::deserialize(&bts).map_err(|e| e.to_string())?;
    Ok((0..vt::TOTAL_CELLS)
        .map(|pos| match (puzzle.is_target(pos), puzzle.is_selected(pos)) {
            (true, true) => 2,
            (true, false) => 1,
            _ => 0,
        })
        .collect())
}

#[wasm_bindgen]
pub fn selection_hint(bts: Vec<u8>, rejected: bool) -> Result<String, String> {
    console_error_panic_hook::set_once();

    let puzzle = vt::SelectionPuzzle::deserialize(&bts).map_err(|e| e.to_string())?;
    if rejected {
        return Ok(vt::selection::NOT_A_HEART_HINT.to_string());
    }
    Ok(puzzle.hint().to_string())
}

/// Gate for the verify button of either puzzle kind.
#[wasm_bindgen]
pub fn validate(kind: &str, bts: Vec<u8>) -> Result<bool, String> {
    console_error_panic_hook::set_once();

    let kind = kind.parse::<vt::PuzzleKind>().map_err(|e| e.to_string())?;
    let solved = match kind {
        vt::PuzzleKind::Swap => vt::SwapPuzzle::deserialize(&bts).map(|p| p.is_solved()),
        vt::PuzzleKind::Select => vt::SelectionPuzzle::deserialize(&bts).map(|p| p.verify()),
    };
    solved.map_err(|e| e.to_string())
}

/// Decodes the puzzle photo into nine PNG fragments, indexed by tile id.
#[wasm_bindgen]
pub fn slice_image(bytes: Vec<u8>) -> Result<js_sys::Array, String> {
    console_error_panic_hook::set_once();

    let tiles = vt::tiles::slice_image(&bytes).map_err(|e| e.hint().to_string())?;
    let out = js_sys::Array::new();
    for tile in tiles {
        out.push(&js_sys::Uint8Array::from(tile.as_slice()));
    }
    Ok(out)
}

/// `[accept_x, accept_y, decline_x, decline_y]` for a freshly shown card.
#[wasm_bindgen]
pub fn initial_positions(container_w: f64, container_h: f64) -> Vec<f64> {
    console_error_panic_hook::set_once();

    let (accept, decline) = vt::evasion::initial_positions(
        vt::Size::new(container_w, container_h),
        vt::evasion::CONTROL_SIZE,
    );
    vec![accept.x, accept.y, decline.x, decline.y]
}

/// Relocates the decline control. The caller keeps the returned slot index
/// and position and passes them back on the next trigger.
///
/// Returns `[x, y, is_offset, slot_index]`; `slot_index` is -1 before the
/// first slot-based move.
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn place_decline(
    policy: &str,
    container_w: f64,
    container_h: f64,
    accept_x: f64,
    accept_y: f64,
    heading_bottom: f64,
    bottom_padding: f64,
    home_x: f64,
    home_y: f64,
    current_x: f64,
    current_y: f64,
    slot_index: i32,
    pointer_x: Option<f64>,
    pointer_y: Option<f64>,
) -> Result<Vec<f64>, String> {
    console_error_panic_hook::set_once();

    let policy = policy
        .parse::<vt::EvasionPolicy>()
        .map_err(|e| e.to_string())?;
    let control = vt::evasion::CONTROL_SIZE;
    let layout = vt::Layout::new(
        vt::Size::new(container_w, container_h),
        vt::Rect::new(accept_x, accept_y, control.w, control.h),
    )
    .with_heading(heading_bottom, bottom_padding);
    let mut placer = vt::Placer::from_parts(
        policy,
        vt::Point::new(home_x, home_y),
        vt::Point::new(current_x, current_y),
        usize::try_from(slot_index).ok(),
    );
    let pointer = pointer_x.zip(pointer_y).map(|(x, y)| vt::Point::new(x, y));

    let trigger = vt::Trigger::PointerEnter(pointer);
    let (p, is_offset) = match placer.place(&layout, trigger, &mut rand::rng()) {
        vt::Placement::Absolute(p) => (p, 0.0),
        vt::Placement::Offset(p) => (p, 1.0),
    };
    let slot = placer.slot_index().map_or(-1.0, |i| i as f64);
    Ok(vec![p.x, p.y, is_offset, slot])
}

#[wasm_bindgen]
pub fn accepted_message() -> String {
    vt::ACCEPTED_MESSAGE.to_string()
}
