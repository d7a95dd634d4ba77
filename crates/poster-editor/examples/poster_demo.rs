//! Scripted editing session over the built-in starter poster.
//!
//! Run with `cargo run -p poster-editor --example poster_demo`; set
//! `RUST_LOG=debug` to watch the per-action commits.

use log::info;
use poster_editor::input::PointerButton;
use poster_editor::session::EditorSession;

fn main() {
    env_logger::init();

    let mut session = EditorSession::new();
    session.load_default();
    info!(
        "loaded starter poster: {} identified elements",
        session.fragment.id_index.len()
    );

    // The hero image is the topmost element near the origin, because
    // bottom/right pinning resolves to (0, 0) here. Select it and drag
    // it into the corner the stylesheet intends.
    session.pointer_down(100.0, 100.0, PointerButton::Primary);
    session.pointer_up(100.0, 100.0);
    session.pointer_down(100.0, 100.0, PointerButton::Primary);
    session.pointer_move(440.0, 440.0);
    session.pointer_up(440.0, 440.0);
    if let Some(sel) = session.selection() {
        info!("moved <{}> to ({}, {})", sel.tag, sel.bounds.x, sel.bounds.y);
    }

    // Now the headline is hittable; retitle and recolor it
    session.pointer_down(60.0, 100.0, PointerButton::Primary);
    session.pointer_up(60.0, 100.0);
    session.apply_property("content", "Autumn Sale");
    session.apply_property("color", "#7c2d12");
    info!("properties now: {:?}", session.selected_properties());

    // One step back leaves the recolor undone but the retitle in place
    session.undo();
    info!(
        "after undo: can_undo={} can_redo={}",
        session.can_undo(),
        session.can_redo()
    );

    println!("{}", session.export_html());
}
