use std::fmt::Write as _;

use architris_engine::{CellPos, ObjectiveRole, PieceKind, Snapshot, Tile, TileGrid, TileState};

fn glyph(tile: Tile) -> char {
    match tile.state() {
        TileState::Blocked => '=',
        TileState::Filled | TileState::Active => tile.kind().map_or('#', PieceKind::as_char),
        TileState::Empty => match tile.role() {
            ObjectiveRole::Required => 'o',
            ObjectiveRole::Buffer => ':',
            ObjectiveRole::Regular => '.',
        },
    }
}

/// Draws the grid top row first, with the ghost shown as `+` on empty cells.
pub fn render_grid(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    for (row, tiles) in (0..TileGrid::ROWS).rev().zip(snapshot.grid.rows().rev()) {
        out.push('|');
        for (col, &tile) in (0..TileGrid::COLUMNS).zip(tiles) {
            let pos = CellPos::new(col, row);
            let c = if tile.state().is_empty() && snapshot.ghost.contains(&pos) {
                '+'
            } else {
                glyph(tile)
            };
            out.push(c);
        }
        out.push_str("|\n");
    }
    out.push('+');
    out.extend((0..TileGrid::COLUMNS).map(|_| '-'));
    out.push_str("+\n");
    out
}

fn kinds(kinds: &[PieceKind]) -> String {
    kinds.iter().map(|kind| kind.as_char()).collect()
}

/// Grid plus the side panel: title, tip, hold, preview and objective state.
pub fn render(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    let heading = if snapshot.tutorial {
        format!("Tutorial: {}", snapshot.title)
    } else {
        snapshot.label.clone()
    };
    _ = writeln!(out, "{heading}");
    if let Some(tip) = &snapshot.tip {
        _ = writeln!(out, "Tip: {tip}");
    }
    out.push_str(&render_grid(snapshot));
    let held = snapshot.held.map_or('-', PieceKind::as_char);
    let hold_mark = if snapshot.hold_used { " (used)" } else { "" };
    _ = writeln!(out, "Hold: {held}{hold_mark}  Next: {}", kinds(&snapshot.upcoming));
    _ = writeln!(
        out,
        "Required: {}/{}  {}",
        snapshot.report.required_filled,
        snapshot.report.required_total,
        snapshot.buffer_status()
    );
    _ = writeln!(
        out,
        "Lines: {}  Speed: {:.1}  {}",
        snapshot.cleared_lines,
        snapshot.fall_speed,
        snapshot.ceiling_status()
    );
    _ = writeln!(out, "Time: {:.2}s", snapshot.elapsed.as_secs_f64());
    out
}
