//! Floor plans compiled into the binary.

use firebot_core::{FloorPlan, MapId, Rect};

const WIDTH: f32 = 800.0;
const HEIGHT: f32 = 600.0;
const WALL: f32 = 20.0;

const BOUNDS: Rect = Rect::new(0.0, 0.0, WIDTH, HEIGHT);

const WALLS: [Rect; 4] = [
    Rect::new(0.0, 0.0, WIDTH, WALL),
    Rect::new(0.0, HEIGHT - WALL, WIDTH, WALL),
    Rect::new(0.0, 0.0, WALL, HEIGHT),
    Rect::new(WIDTH - WALL, 0.0, WALL, HEIGHT),
];

const KITCHEN: [Rect; 3] = [
    // island
    Rect::new(300.0, 250.0, 200.0, 100.0),
    Rect::new(20.0, 20.0, 200.0, 80.0),
    Rect::new(630.0, 20.0, 150.0, 80.0),
];

const LIVING_ROOM: [Rect; 4] = [
    // sofa, media unit, then the two plants by their bounding boxes
    Rect::new(250.0, 250.0, 300.0, 120.0),
    Rect::new(250.0, 20.0, 300.0, 60.0),
    Rect::new(40.0, 480.0, 80.0, 80.0),
    Rect::new(680.0, 480.0, 80.0, 80.0),
];

const OFFICE: [Rect; 4] = [
    Rect::new(100.0, 100.0, 200.0, 150.0),
    Rect::new(500.0, 100.0, 200.0, 150.0),
    Rect::new(100.0, 350.0, 200.0, 150.0),
    Rect::new(500.0, 350.0, 200.0, 150.0),
];

/// Identifiers of the built-in maps in presentation order.
pub const BUILTIN_MAPS: [&str; 3] = ["kitchen", "livingroom", "office"];

/// Builds every built-in floor plan, perimeter walls included.
pub(crate) fn builtin_plans() -> Vec<FloorPlan> {
    [
        ("kitchen", &KITCHEN[..]),
        ("livingroom", &LIVING_ROOM[..]),
        ("office", &OFFICE[..]),
    ]
    .into_iter()
    .map(|(id, furniture)| FloorPlan {
        id: MapId::new(id),
        bounds: BOUNDS,
        obstacles: WALLS.iter().chain(furniture).copied().collect(),
    })
    .collect()
}
