//! Per-mode controller strategies, selected once when a run starts.

use std::fmt;

use firebot_core::{Arrival, Command, ControllerState, LogLevel, SimulationView};

use super::Toolkit;

/// Uniform set of reactions every operating mode provides.
pub(crate) trait Mission: fmt::Debug {
    /// Entry actions of `state`.
    fn on_enter(
        &self,
        state: ControllerState,
        kit: &mut Toolkit,
        view: &SimulationView<'_>,
        out: &mut Vec<Command>,
    );

    /// A dwell scheduled by `state` elapsed while the controller still
    /// occupies it.
    fn on_timer(
        &self,
        state: ControllerState,
        kit: &mut Toolkit,
        view: &SimulationView<'_>,
        out: &mut Vec<Command>,
    );

    /// Per-tick upkeep while the simulation runs.
    fn on_tick(&self, kit: &mut Toolkit, view: &SimulationView<'_>, out: &mut Vec<Command>);

    /// The movement system observed an arrival.
    fn on_arrive(
        &self,
        arrival: Arrival,
        kit: &mut Toolkit,
        view: &SimulationView<'_>,
        out: &mut Vec<Command>,
    );

    /// A fire entered the fire slot.
    fn on_fire_spawned(
        &self,
        kit: &mut Toolkit,
        view: &SimulationView<'_>,
        out: &mut Vec<Command>,
    );

    /// The active fire expired before the robot put it out.
    fn on_fire_timed_out(
        &self,
        kit: &mut Toolkit,
        view: &SimulationView<'_>,
        out: &mut Vec<Command>,
    );
}

/// `IDLE → PATROLLING → DETECTED → APPROACHING → EXTINGUISHING → PATROLLING`.
#[derive(Debug)]
pub(crate) struct PatrolCycle {
    /// Whether approaches follow planned waypoints instead of a straight line.
    pub(crate) plan_routes: bool,
}

impl Mission for PatrolCycle {
    fn on_enter(
        &self,
        state: ControllerState,
        kit: &mut Toolkit,
        view: &SimulationView<'_>,
        out: &mut Vec<Command>,
    ) {
        match state {
            ControllerState::Idle => {
                Toolkit::dwell(kit.config.collapsed_idle_dwell, state, out);
            }
            ControllerState::Patrolling if view.fire.is_some() => {
                Toolkit::transition(state, ControllerState::Detected, out);
            }
            ControllerState::Detected => {
                Toolkit::dwell(kit.config.detected_dwell, state, out);
            }
            ControllerState::Approaching => {
                if !kit.begin_approach(self.plan_routes, view, out) {
                    Toolkit::transition(state, ControllerState::Patrolling, out);
                }
            }
            ControllerState::Extinguishing => {
                Toolkit::announce(LogLevel::System, "Extinguishing...", out);
                Toolkit::dwell(kit.config.extinguishing_dwell, state, out);
            }
            _ => {}
        }
    }

    fn on_timer(
        &self,
        state: ControllerState,
        _kit: &mut Toolkit,
        view: &SimulationView<'_>,
        out: &mut Vec<Command>,
    ) {
        match state {
            ControllerState::Idle => {
                Toolkit::transition(state, ControllerState::Patrolling, out);
            }
            ControllerState::Detected => {
                Toolkit::transition(state, ControllerState::Approaching, out);
            }
            ControllerState::Extinguishing => {
                if view.fire.is_none() {
                    return;
                }
                out.push(Command::ExtinguishFire);
                Toolkit::announce(LogLevel::Path, "Fire out. Resuming Patrol.", out);
                Toolkit::transition(state, ControllerState::Patrolling, out);
            }
            _ => {}
        }
    }

    fn on_tick(&self, kit: &mut Toolkit, view: &SimulationView<'_>, out: &mut Vec<Command>) {
        match view.state {
            ControllerState::Patrolling => kit.ensure_patrol_target(view, out),
            ControllerState::Approaching if view.fire.is_none() => {
                Toolkit::transition(view.state, ControllerState::Patrolling, out);
            }
            _ => {}
        }
    }

    fn on_arrive(
        &self,
        arrival: Arrival,
        kit: &mut Toolkit,
        view: &SimulationView<'_>,
        out: &mut Vec<Command>,
    ) {
        if let Arrival::Fire { .. } = arrival {
            kit.report_travel_time(view, out);
            Toolkit::transition(
                ControllerState::Approaching,
                ControllerState::Extinguishing,
                out,
            );
        }
    }

    fn on_fire_spawned(
        &self,
        _kit: &mut Toolkit,
        _view: &SimulationView<'_>,
        out: &mut Vec<Command>,
    ) {
        Toolkit::transition(ControllerState::Patrolling, ControllerState::Detected, out);
    }

    fn on_fire_timed_out(
        &self,
        _kit: &mut Toolkit,
        view: &SimulationView<'_>,
        out: &mut Vec<Command>,
    ) {
        if view.state.is_engaged() {
            Toolkit::transition(view.state, ControllerState::Patrolling, out);
        }
    }
}

/// `IDLE → DETECT → NAVIGATE → AIM → EXTINGUISH → VERIFY → COMPLETE`.
#[derive(Debug)]
pub(crate) struct FullMission;

impl Mission for FullMission {
    fn on_enter(
        &self,
        state: ControllerState,
        kit: &mut Toolkit,
        view: &SimulationView<'_>,
        out: &mut Vec<Command>,
    ) {
        match state {
            ControllerState::Idle => {
                Toolkit::announce(
                    LogLevel::System,
                    "[FSM] System initialized - awaiting fire event",
                    out,
                );
                Toolkit::dwell(kit.config.full_idle_dwell, state, out);
            }
            ControllerState::Detect if view.fire.is_some() => {
                Toolkit::transition(state, ControllerState::Navigate, out);
            }
            ControllerState::Navigate => {
                if !kit.begin_approach(true, view, out) {
                    Toolkit::transition(state, ControllerState::Detect, out);
                }
            }
            ControllerState::Aim => {
                Toolkit::announce(LogLevel::Info, "[AIM] Aligning nozzle to fire target", out);
                Toolkit::dwell(kit.config.aim_dwell, state, out);
            }
            ControllerState::Extinguish => {
                Toolkit::announce(LogLevel::System, "[ACT] CO₂ spray activated", out);
                Toolkit::dwell(kit.config.extinguish_dwell, state, out);
            }
            ControllerState::Verify => {
                Toolkit::announce(
                    LogLevel::Warning,
                    "[VERIFY] Re-scanning area for residual fire...",
                    out,
                );
                Toolkit::dwell(kit.config.verify_dwell, state, out);
            }
            ControllerState::Complete => {
                Toolkit::announce(LogLevel::Path, "[STATE] MISSION COMPLETE", out);
            }
            _ => {}
        }
    }

    fn on_timer(
        &self,
        state: ControllerState,
        _kit: &mut Toolkit,
        _view: &SimulationView<'_>,
        out: &mut Vec<Command>,
    ) {
        match state {
            ControllerState::Idle => {
                Toolkit::transition(state, ControllerState::Detect, out);
            }
            ControllerState::Aim => {
                Toolkit::announce(LogLevel::Path, "[AIM] Nozzle locked on target", out);
                Toolkit::transition(state, ControllerState::Extinguish, out);
            }
            ControllerState::Extinguish => {
                out.push(Command::ExtinguishFire);
                Toolkit::announce(LogLevel::Path, "[ACT] Spray cycle complete", out);
                Toolkit::transition(state, ControllerState::Verify, out);
            }
            ControllerState::Verify => {
                Toolkit::announce(
                    LogLevel::Path,
                    "[VERIFY] Area clear - no residual fire detected",
                    out,
                );
                Toolkit::transition(state, ControllerState::Complete, out);
            }
            _ => {}
        }
    }

    fn on_tick(&self, kit: &mut Toolkit, view: &SimulationView<'_>, out: &mut Vec<Command>) {
        match view.state {
            ControllerState::Detect => kit.ensure_patrol_target(view, out),
            ControllerState::Navigate if view.fire.is_none() => {
                Toolkit::transition(view.state, ControllerState::Detect, out);
            }
            _ => {}
        }
    }

    fn on_arrive(
        &self,
        arrival: Arrival,
        kit: &mut Toolkit,
        view: &SimulationView<'_>,
        out: &mut Vec<Command>,
    ) {
        if let Arrival::Fire { .. } = arrival {
            kit.report_travel_time(view, out);
            Toolkit::transition(ControllerState::Navigate, ControllerState::Aim, out);
        }
    }

    fn on_fire_spawned(
        &self,
        _kit: &mut Toolkit,
        _view: &SimulationView<'_>,
        out: &mut Vec<Command>,
    ) {
        Toolkit::transition(ControllerState::Detect, ControllerState::Navigate, out);
    }

    fn on_fire_timed_out(
        &self,
        _kit: &mut Toolkit,
        view: &SimulationView<'_>,
        out: &mut Vec<Command>,
    ) {
        if view.state.is_engaged() {
            Toolkit::transition(view.state, ControllerState::Detect, out);
        }
    }
}
