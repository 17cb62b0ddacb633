#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Firebot simulation engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, read a
//! [`SimulationView`] snapshot, and respond exclusively with new command
//! batches.

use std::{collections::VecDeque, fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Firebot patrol simulator ready.";

/// Operating mode selected by the user before the simulation starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    /// Collapsed patrol cycle that approaches fires along a straight line.
    Fire,
    /// Collapsed patrol cycle that approaches fires along planned waypoints.
    Navigation,
    /// Full mission sequence from idle through verification.
    Full,
}

impl OperatingMode {
    /// Lowercase identifier used by configuration files and the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fire => "fire",
            Self::Navigation => "navigation",
            Self::Full => "full",
        }
    }

    /// Reports whether the mode runs the full mission state machine.
    #[must_use]
    pub const fn runs_full_mission(self) -> bool {
        matches!(self, Self::Full)
    }

    /// Reports whether approaches consult the grid pathfinder.
    #[must_use]
    pub const fn plans_routes(self) -> bool {
        matches!(self, Self::Navigation | Self::Full)
    }

    /// State the controller falls back to when a fire disappears mid-approach.
    #[must_use]
    pub const fn patrol_state(self) -> ControllerState {
        match self {
            Self::Fire | Self::Navigation => ControllerState::Patrolling,
            Self::Full => ControllerState::Detect,
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authoritative controller states across both mission models.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControllerState {
    /// Waiting for the start dwell to elapse.
    Idle,
    /// Full mission: scanning the environment for fire.
    Detect,
    /// Full mission: travelling toward the detected fire.
    Navigate,
    /// Full mission: aligning the nozzle.
    Aim,
    /// Full mission: spraying the fire.
    Extinguish,
    /// Full mission: re-scanning for residual fire.
    Verify,
    /// Full mission: terminal state for the run.
    Complete,
    /// Collapsed cycle: roaming between random patrol points.
    Patrolling,
    /// Collapsed cycle: a fire was spotted and the approach is pending.
    Detected,
    /// Collapsed cycle: travelling toward the fire.
    Approaching,
    /// Collapsed cycle: spraying the fire.
    Extinguishing,
    /// Battery exhausted; only a recharge leaves this state.
    LowBattery,
}

impl ControllerState {
    /// Upper-case label presented by rendering surfaces.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Detect => "DETECT",
            Self::Navigate => "NAVIGATE",
            Self::Aim => "AIM",
            Self::Extinguish => "EXTINGUISH",
            Self::Verify => "VERIFY",
            Self::Complete => "COMPLETE",
            Self::Patrolling => "PATROLLING",
            Self::Detected => "DETECTED",
            Self::Approaching => "APPROACHING",
            Self::Extinguishing => "EXTINGUISHING",
            Self::LowBattery => "LOW_BATTERY",
        }
    }

    /// Movement behaviour associated with the state.
    #[must_use]
    pub const fn phase(self) -> MotionPhase {
        match self {
            Self::Detect | Self::Patrolling | Self::Detected => MotionPhase::Roam,
            Self::Navigate | Self::Approaching => MotionPhase::Approach,
            Self::Idle
            | Self::Aim
            | Self::Extinguish
            | Self::Verify
            | Self::Complete
            | Self::Extinguishing
            | Self::LowBattery => MotionPhase::Hold,
        }
    }

    /// Reports whether the controller is committed to a specific fire.
    #[must_use]
    pub const fn is_engaged(self) -> bool {
        matches!(
            self,
            Self::Navigate
                | Self::Aim
                | Self::Extinguish
                | Self::Detected
                | Self::Approaching
                | Self::Extinguishing
        )
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Movement behaviour the movement system applies for a controller state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MotionPhase {
    /// The robot stays where it is.
    Hold,
    /// The robot wanders between random patrol targets.
    Roam,
    /// The robot closes in on the active fire.
    Approach,
}

/// Severity attached to a narrative log line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Lifecycle notices such as start, stop and state changes.
    System,
    /// Conditions worth attention that do not stop the run.
    Warning,
    /// Fire alarms and aborted operations.
    Error,
    /// Informational progress.
    Info,
    /// Route planning and completion notices.
    Path,
}

impl LogLevel {
    /// Lowercase identifier of the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Info => "info",
            Self::Path => "path",
        }
    }
}

/// Continuous point on the floor plan expressed in map units.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    x: f32,
    y: f32,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Euclidean distance between two positions.
    #[must_use]
    pub fn distance_to(self, other: Position) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Copy of the position with a replaced horizontal coordinate.
    #[must_use]
    pub const fn with_x(self, x: f32) -> Self {
        Self { x, y: self.y }
    }

    /// Copy of the position with a replaced vertical coordinate.
    #[must_use]
    pub const fn with_y(self, y: f32) -> Self {
        Self { x: self.x, y }
    }
}

/// Axis-aligned rectangle expressed in map units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl Rect {
    /// Creates a rectangle from its upper-left corner and size.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Left edge.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Top edge.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Horizontal extent.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Vertical extent.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Geometric center of the rectangle.
    #[must_use]
    pub fn center(&self) -> Position {
        Position::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Half-open containment: the left and top edges are inside, the right
    /// and bottom edges are not.
    #[must_use]
    pub fn contains(&self, point: Position) -> bool {
        point.x() >= self.x
            && point.x() < self.right()
            && point.y() >= self.y
            && point.y() < self.bottom()
    }

    /// Closed containment including every edge.
    #[must_use]
    pub fn encloses(&self, point: Position) -> bool {
        point.x() >= self.x
            && point.x() <= self.right()
            && point.y() >= self.y
            && point.y() <= self.bottom()
    }

    /// Reports whether every edge of the rectangle is a finite coordinate.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.right().is_finite()
            && self.bottom().is_finite()
    }

    /// Rectangle grown by `margin` on every side. Negative margins shrink it.
    #[must_use]
    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            x: self.x - margin,
            y: self.y - margin,
            width: (self.width + margin * 2.0).max(0.0),
            height: (self.height + margin * 2.0).max(0.0),
        }
    }

    /// Reports whether two rectangles overlap with a non-empty intersection.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Padded obstacle set and navigable interior for the active floor plan.
///
/// Every collision and occupancy test in the engine funnels through
/// [`ObstacleField::is_blocked`], so the pathfinder, the movement model and
/// the free-point sampler agree on what counts as free space.
#[derive(Clone, Debug, PartialEq)]
pub struct ObstacleField {
    bounds: Rect,
    interior: Rect,
    obstacles: Vec<Rect>,
}

impl ObstacleField {
    /// Ingests raw obstacles, padding each by `padding` and shrinking the
    /// navigable interior by `interior_margin`.
    #[must_use]
    pub fn new(bounds: Rect, obstacles: &[Rect], padding: f32, interior_margin: f32) -> Self {
        Self {
            bounds,
            interior: bounds.expanded(-interior_margin),
            obstacles: obstacles
                .iter()
                .map(|obstacle| obstacle.expanded(padding))
                .collect(),
        }
    }

    /// Full extent of the floor plan.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Region the robot may occupy before obstacles are considered.
    #[must_use]
    pub const fn interior(&self) -> Rect {
        self.interior
    }

    /// Padded obstacle rectangles.
    #[must_use]
    pub fn obstacles(&self) -> &[Rect] {
        &self.obstacles
    }

    /// Reports whether the point lies outside the interior or inside any
    /// padded obstacle.
    #[must_use]
    pub fn is_blocked(&self, point: Position) -> bool {
        if !self.interior.encloses(point) {
            return true;
        }

        self.obstacles.iter().any(|obstacle| obstacle.contains(point))
    }
}

/// Identifier of a floor plan offered by a geometry provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MapId(String);

impl MapId {
    /// Creates a new map identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrowed string form of the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw floor-plan geometry handed to the world on map load.
#[derive(Clone, Debug, PartialEq)]
pub struct FloorPlan {
    /// Identifier of the map.
    pub id: MapId,
    /// Bounding rectangle of the map.
    pub bounds: Rect,
    /// Unpadded obstacle rectangles.
    pub obstacles: Vec<Rect>,
}

/// Source of floor-plan geometry.
pub trait GeometryProvider {
    /// Obstacles of the requested map, if the map exists.
    fn obstacles(&self, map: &MapId) -> Option<Vec<Rect>>;

    /// Bounding rectangle of the requested map, if the map exists.
    fn bounds(&self, map: &MapId) -> Option<Rect>;

    /// Identifiers of every map the provider knows about.
    fn map_ids(&self) -> Vec<MapId>;
}

/// Receiver of narrative log lines. Fire-and-forget; ordering is preserved by
/// the caller.
pub trait LogSink {
    /// Records a single line at the provided level.
    fn log(&mut self, level: LogLevel, message: &str);
}

/// Unique identifier assigned to a fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FireId(u32);

impl FireId {
    /// Creates a new fire identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Simulated fire occupying the single fire slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fire {
    /// Identity used to recognise stale timers.
    pub id: FireId,
    /// Location of the fire.
    pub position: Position,
    /// Simulated time at which the fire ignited.
    pub ignited_at: Duration,
    /// Synthesized detection confidence in the 0.0..=1.0 range.
    pub confidence: f32,
}

/// Reasons a fire leaves the fire slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FireClearReason {
    /// The robot finished spraying.
    Extinguished,
    /// The identity-guarded timeout elapsed.
    TimedOut,
    /// The simulation was stopped or its map replaced.
    Reset,
}

/// Ordered waypoint queue consumed front-to-back.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    waypoints: VecDeque<Position>,
}

impl Path {
    /// Creates a path from waypoints in traversal order.
    #[must_use]
    pub fn new(waypoints: Vec<Position>) -> Self {
        Self {
            waypoints: waypoints.into(),
        }
    }

    /// Next waypoint to visit.
    #[must_use]
    pub fn front(&self) -> Option<Position> {
        self.waypoints.front().copied()
    }

    /// Removes and returns the next waypoint.
    pub fn advance(&mut self) -> Option<Position> {
        self.waypoints.pop_front()
    }

    /// Number of remaining waypoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Reports whether no waypoints remain. An empty path that was returned
    /// by the planner means "no route".
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Iterator over the remaining waypoints in traversal order.
    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.waypoints.iter()
    }
}

/// Deferred callback kinds. Each carries the snapshot it must still match
/// when it comes due.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Timer {
    /// Fires only if the controller still occupies `state`.
    Dwell {
        /// State that scheduled the dwell.
        state: ControllerState,
    },
    /// Fires only if the fire slot still holds `fire`.
    FireTimeout {
        /// Fire the timeout was armed for.
        fire: FireId,
    },
}

/// Arrival reported by the movement system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Arrival {
    /// The robot reached its patrol target.
    PatrolPoint,
    /// The robot reached spraying distance of a fire.
    Fire {
        /// Fire the robot approached.
        fire: FireId,
    },
}

/// Linear battery drain model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryModel {
    /// Charge removed on every running tick.
    pub drain_per_tick: f32,
    /// Charge at or below which the controller is forced into low battery.
    pub low_threshold: f32,
}

impl Default for BatteryModel {
    fn default() -> Self {
        Self {
            drain_per_tick: 0.02,
            low_threshold: 20.0,
        }
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the obstacle field. Stops a running simulation first.
    LoadFloorPlan {
        /// Geometry of the new map.
        plan: FloorPlan,
    },
    /// Enables or disables the battery model.
    ConfigureBattery {
        /// Drain model to use, or `None` to disable it.
        model: Option<BatteryModel>,
    },
    /// Updates the robot's per-tick travel distance.
    SetSpeed {
        /// Distance travelled per tick in map units.
        speed: f32,
    },
    /// Selects the operating mode. Stops a running simulation first.
    SetMode {
        /// Mode to activate.
        mode: OperatingMode,
    },
    /// Starts the simulation. A no-op while already running.
    Start,
    /// Stops the simulation and invalidates outstanding timers.
    Stop,
    /// Refills the battery and releases the low-battery state.
    Recharge,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Teleports the robot to a position without collision checks.
    PlaceRobot {
        /// Destination of the robot.
        position: Position,
    },
    /// Moves the robot to a position produced by the movement model.
    MoveRobot {
        /// Destination of the robot.
        to: Position,
    },
    /// Replaces or clears the patrol target.
    SetPatrolTarget {
        /// New patrol target.
        target: Option<Position>,
    },
    /// Replaces or clears the route toward the active fire.
    AssignPath {
        /// New route; `None` marks the route as not requested.
        path: Option<Path>,
    },
    /// Drops the front waypoint of the active route.
    ConsumeWaypoint,
    /// Reports that the movement model observed an arrival.
    ReportArrival {
        /// What the robot arrived at.
        arrival: Arrival,
    },
    /// Moves the controller from `from` to `to` if it still occupies `from`.
    TransitionState {
        /// State the requester observed.
        from: ControllerState,
        /// State to enter.
        to: ControllerState,
    },
    /// Schedules a deferred callback.
    ScheduleTimer {
        /// Simulated time until the timer comes due.
        delay: Duration,
        /// Callback kind and its validity snapshot.
        timer: Timer,
    },
    /// Places a fire into the empty fire slot.
    SpawnFire {
        /// Location of the fire.
        position: Position,
        /// Synthesized detection confidence.
        confidence: f32,
    },
    /// Clears the fire slot if it still holds `fire`.
    ExpireFire {
        /// Fire whose timeout elapsed.
        fire: FireId,
    },
    /// Clears the fire slot unconditionally.
    ExtinguishFire,
    /// Emits a narrative log line.
    Announce {
        /// Severity of the line.
        level: LogLevel,
        /// Text of the line.
        message: String,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a new floor plan replaced the obstacle field.
    FloorPlanLoaded {
        /// Identifier of the loaded map.
        map: MapId,
        /// Number of obstacles ingested.
        obstacles: usize,
    },
    /// Announces that the operating mode changed.
    ModeChanged {
        /// Mode that became active.
        mode: OperatingMode,
    },
    /// Announces that the simulation began a new run.
    SimulationStarted {
        /// Mode the run uses.
        mode: OperatingMode,
    },
    /// Announces that the simulation stopped running.
    SimulationStopped,
    /// Reports that a start request was refused because no map is loaded.
    StartRejected,
    /// Confirms that the controller entered a state.
    StateEntered {
        /// State that became active.
        state: ControllerState,
        /// State that was active before.
        previous: ControllerState,
    },
    /// Reports that a timer came due and still matches its snapshot.
    TimerElapsed {
        /// The timer that elapsed.
        timer: Timer,
    },
    /// Confirms that the robot was placed without movement.
    RobotPlaced {
        /// New robot position.
        position: Position,
    },
    /// Confirms that the robot moved.
    RobotMoved {
        /// Position before moving.
        from: Position,
        /// Position after moving.
        to: Position,
    },
    /// Confirms that a route was assigned.
    PathAssigned {
        /// Number of waypoints in the route; zero means "no route".
        waypoints: usize,
    },
    /// Confirms an arrival observed by the movement model.
    Arrived {
        /// What the robot arrived at.
        arrival: Arrival,
    },
    /// Confirms that a fire entered the fire slot.
    FireSpawned {
        /// The new fire.
        fire: Fire,
    },
    /// Confirms that the fire slot was emptied.
    FireCleared {
        /// Fire that left the slot.
        fire: FireId,
        /// Why it left.
        reason: FireClearReason,
    },
    /// Reports that the battery fell to the low threshold.
    BatteryDepleted {
        /// Remaining charge.
        level: f32,
    },
    /// Confirms that the battery was refilled.
    Recharged,
    /// Narrative log line destined for the log sink.
    Logged {
        /// Severity of the line.
        level: LogLevel,
        /// Text of the line.
        message: String,
    },
}

/// Read-only snapshot of the simulation handed to systems.
#[derive(Clone, Copy, Debug)]
pub struct SimulationView<'a> {
    /// Whether the simulation is running.
    pub running: bool,
    /// Active operating mode.
    pub mode: OperatingMode,
    /// Active controller state.
    pub state: ControllerState,
    /// Number of ticks applied so far.
    pub tick: u64,
    /// Simulated time elapsed since the world was created.
    pub elapsed: Duration,
    /// Robot position.
    pub robot: Position,
    /// Current patrol target, if any.
    pub patrol_target: Option<Position>,
    /// Route toward the fire; `None` when no route was requested.
    pub path: Option<&'a Path>,
    /// Occupant of the fire slot.
    pub fire: Option<Fire>,
    /// Distance travelled per tick.
    pub speed: f32,
    /// Battery charge when the battery model is enabled.
    pub battery: Option<f32>,
    /// Obstacle field of the loaded map.
    pub field: Option<&'a ObstacleField>,
}

/// Per-tick snapshot consumed by rendering surfaces.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameSnapshot {
    /// Number of ticks applied so far.
    pub tick: u64,
    /// Simulated milliseconds elapsed.
    pub elapsed_ms: u64,
    /// Robot position.
    pub robot: Position,
    /// Fire position, if a fire exists.
    pub fire: Option<Position>,
    /// Whether the fire marker should be drawn.
    pub fire_visible: bool,
    /// Active controller state.
    pub state: ControllerState,
    /// Active operating mode.
    pub mode: OperatingMode,
    /// Battery charge when the battery model is enabled.
    pub battery: Option<f32>,
    /// Remaining route waypoints.
    pub waypoints: Vec<Position>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_containment_is_half_open() {
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert!(rect.contains(Position::new(10.0, 20.0)));
        assert!(rect.contains(Position::new(39.9, 59.9)));
        assert!(!rect.contains(Position::new(40.0, 30.0)));
        assert!(!rect.contains(Position::new(20.0, 60.0)));
    }

    #[test]
    fn obstacles_are_padded_on_ingestion() {
        let bounds = Rect::new(0.0, 0.0, 800.0, 600.0);
        let field = ObstacleField::new(bounds, &[Rect::new(300.0, 250.0, 200.0, 100.0)], 20.0, 30.0);

        assert_eq!(field.obstacles()[0], Rect::new(280.0, 230.0, 240.0, 140.0));
        assert!(field.is_blocked(Position::new(285.0, 240.0)));
        assert!(!field.is_blocked(Position::new(275.0, 240.0)));
    }

    #[test]
    fn interior_margin_blocks_the_map_edges() {
        let bounds = Rect::new(0.0, 0.0, 800.0, 600.0);
        let field = ObstacleField::new(bounds, &[], 20.0, 30.0);

        assert!(field.is_blocked(Position::new(29.0, 300.0)));
        assert!(!field.is_blocked(Position::new(30.0, 300.0)));
        assert!(!field.is_blocked(Position::new(770.0, 570.0)));
        assert!(field.is_blocked(Position::new(771.0, 300.0)));
    }

    #[test]
    fn infinite_extents_are_not_finite() {
        assert!(Rect::new(0.0, 0.0, 800.0, 600.0).is_finite());
        assert!(!Rect::new(0.0, 0.0, f32::INFINITY, 600.0).is_finite());
        assert!(!Rect::new(f32::NAN, 0.0, 10.0, 10.0).is_finite());
        assert!(!Rect::new(f32::MAX, 0.0, f32::MAX, 10.0).is_finite());
    }

    #[test]
    fn path_is_consumed_front_to_back() {
        let mut path = Path::new(vec![Position::new(1.0, 1.0), Position::new(2.0, 2.0)]);
        assert_eq!(path.advance(), Some(Position::new(1.0, 1.0)));
        assert_eq!(path.front(), Some(Position::new(2.0, 2.0)));
        assert_eq!(path.len(), 1);
        let _ = path.advance();
        assert!(path.is_empty());
    }

    #[test]
    fn patrol_state_follows_mode() {
        assert_eq!(OperatingMode::Fire.patrol_state(), ControllerState::Patrolling);
        assert_eq!(OperatingMode::Full.patrol_state(), ControllerState::Detect);
        assert!(OperatingMode::Navigation.plans_routes());
        assert!(!OperatingMode::Fire.plans_routes());
    }

    #[test]
    fn frame_snapshot_serializes_with_wire_vocabulary() {
        let frame = FrameSnapshot {
            tick: 4,
            elapsed_ms: 64,
            robot: Position::new(12.5, 40.0),
            fire: None,
            fire_visible: false,
            state: ControllerState::LowBattery,
            mode: OperatingMode::Navigation,
            battery: Some(18.0),
            waypoints: Vec::new(),
        };

        let value = serde_json::to_value(&frame).expect("snapshot serializes");
        assert_eq!(value["state"], "LOW_BATTERY");
        assert_eq!(value["mode"], "navigation");
        assert_eq!(value["robot"]["x"], 12.5);
        assert!(value["fire"].is_null());
    }

    #[test]
    fn low_battery_label_matches_rendering_vocabulary() {
        assert_eq!(ControllerState::LowBattery.label(), "LOW_BATTERY");
        assert_eq!(ControllerState::LowBattery.phase(), MotionPhase::Hold);
    }
}
