//! Seeded clutter obstacles scattered on map load.

use firebot_core::Rect;
use rand::Rng;

/// Upper bound on clutter obstacles added to a map.
pub const MAX_CLUTTER: usize = 8;

const CLUTTER_SIZE: f32 = 40.0;
const PLACEMENT_TRIES: u32 = 50;

/// Scatters up to `density * MAX_CLUTTER` square obstacles inside `interior`.
///
/// A candidate is kept only when its doubly padded footprint stays clear of
/// every existing and previously placed obstacle.
pub fn scatter_clutter<R>(
    interior: Rect,
    existing: &[Rect],
    density: f32,
    padding: f32,
    rng: &mut R,
) -> Vec<Rect>
where
    R: Rng + ?Sized,
{
    let density = if density.is_finite() {
        density.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let wanted = (density * MAX_CLUTTER as f32).round() as usize;
    let max_x = interior.right() - CLUTTER_SIZE;
    let max_y = interior.bottom() - CLUTTER_SIZE;
    if wanted == 0 || max_x <= interior.x() || max_y <= interior.y() {
        return Vec::new();
    }

    let mut placed: Vec<Rect> = Vec::with_capacity(wanted);
    for _ in 0..wanted {
        for _ in 0..PLACEMENT_TRIES {
            let candidate = Rect::new(
                rng.gen_range(interior.x()..max_x),
                rng.gen_range(interior.y()..max_y),
                CLUTTER_SIZE,
                CLUTTER_SIZE,
            );
            let footprint = candidate.expanded(padding * 2.0);
            let overlaps = existing
                .iter()
                .chain(placed.iter())
                .any(|obstacle| footprint.intersects(obstacle));
            if !overlaps {
                placed.push(candidate);
                break;
            }
        }
    }

    placed
}
