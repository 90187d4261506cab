use crate::constants::{ACTOR_BOX_SIZE, MAX_FRAME_DT};
use crate::movement::Actor;
use crate::types::Vec2;

/// Negative or non-finite frame times count as zero.
pub(super) fn clamp_frame_dt(dt: f32) -> f32 {
    if !dt.is_finite() {
        return 0.0;
    }
    dt.clamp(0.0, MAX_FRAME_DT)
}

/// Actor box against a box of the same size centered on `tile`.
pub(super) fn overlaps_tile(actor: &Actor, tile: Vec2) -> bool {
    let (cx, cy) = tile.center();
    (actor.x - cx).abs() < ACTOR_BOX_SIZE && (actor.y - cy).abs() < ACTOR_BOX_SIZE
}
