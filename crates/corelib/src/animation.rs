//! Procedural pose sources: the walk cycle and the poke reaction.
//!
//! [`AnimationState`] only holds what has to survive between frames (walk
//! phase, poke start). Angles are derived from it by pure functions, after
//! the state has been advanced for the frame.

use std::f64::consts::{PI, TAU};

use crate::clock::Clock;
use crate::pose::PoseAngles;

/// Leg swing frequency, cycles per second of walking.
pub const LEG_SWING_CYCLES_PER_SEC: f64 = 3.0;
/// Tail wag frequency relative to the leg swing.
pub const TAIL_WAG_CYCLES: f64 = 2.0;
/// Head bob frequency relative to the leg swing.
pub const HEAD_BOB_CYCLES: f64 = 0.5;

pub const MAX_LEG_ANGLE: f32 = 30.0;
pub const MAX_PAW_ANGLE: f32 = 15.0;
pub const TAIL_WAG_ANGLE: f32 = 20.0;
pub const HEAD_BOB_ANGLE: f32 = 5.0;

pub const POKE_DURATION_MS: f64 = 1000.0;
/// Upper bound on the time one tick may account for.
pub const MAX_TICK_MS: f64 = 200.0;

/// Clamp a frame delta to `[0, MAX_TICK_MS]`.
#[inline]
pub fn clamp_elapsed(elapsed_ms: f64) -> f64 {
    if elapsed_ms.is_nan() {
        return 0.0;
    }
    elapsed_ms.clamp(0.0, MAX_TICK_MS)
}

fn wave(amplitude: f32, radians: f64) -> f32 {
    amplitude * radians.sin() as f32
}

/// Walk-cycle angles at `phase` (in leg cycles).
///
/// Diagonal legs move together: left front with right back, and the other
/// pair half a cycle later.
pub fn walk_pose(phase: f64) -> PoseAngles {
    let p = phase * TAU;
    PoseAngles {
        head: wave(HEAD_BOB_ANGLE, p * HEAD_BOB_CYCLES),
        tail: wave(TAIL_WAG_ANGLE, p * TAIL_WAG_CYCLES),
        left_front_leg: wave(MAX_LEG_ANGLE, p),
        right_front_leg: wave(MAX_LEG_ANGLE, p + PI),
        left_front_paw: wave(MAX_PAW_ANGLE, p + PI / 2.0),
        right_front_paw: wave(MAX_PAW_ANGLE, p + PI * 1.5),
        left_back_leg: wave(MAX_LEG_ANGLE, p + PI),
        right_back_leg: wave(MAX_LEG_ANGLE, p),
    }
}

/// Drive signal of the poke reaction: two full oscillations over the
/// reaction, `progress` in `[0, 1]`.
#[inline]
pub fn poke_signal(progress: f64) -> f32 {
    (progress.clamp(0.0, 1.0) * 2.0 * TAU).sin() as f32
}

/// Startled pose for a given drive signal.
pub fn poke_pose(signal: f32) -> PoseAngles {
    PoseAngles {
        head: 10.0 * signal,
        tail: 60.0 + 20.0 * signal,
        left_front_leg: 20.0 * signal,
        right_front_leg: -20.0 * signal,
        left_front_paw: 30.0 * signal,
        right_front_paw: 30.0 * signal,
        left_back_leg: -10.0 * signal,
        right_back_leg: 10.0 * signal,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Poke {
    started_ms: f64,
}

impl Poke {
    fn progress(&self, now_ms: f64) -> Option<f64> {
        let elapsed = (now_ms - self.started_ms).max(0.0);
        (elapsed < POKE_DURATION_MS).then_some(elapsed / POKE_DURATION_MS)
    }
}

/// Persistent animation state of the single figure.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnimationState {
    walking: bool,
    walk_phase: f64,
    poke: Option<Poke>,
}

impl AnimationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_walking(&self) -> bool {
        self.walking
    }

    /// Enable or pause the walk cycle. The phase is kept while paused.
    pub fn set_walking(&mut self, walking: bool) {
        if self.walking != walking {
            log::debug!("walk cycle {}", if walking { "started" } else { "stopped" });
        }
        self.walking = walking;
    }

    pub fn walk_phase(&self) -> f64 {
        self.walk_phase
    }

    /// Start the poke reaction. Re-poking restarts it from the beginning.
    pub fn trigger_poke(&mut self, now_ms: f64) {
        log::debug!("poke at {now_ms:.1} ms");
        self.poke = Some(Poke { started_ms: now_ms });
    }

    pub fn is_poked(&self) -> bool {
        self.poke.is_some()
    }

    /// Whether a procedural source currently owns the pose.
    pub fn is_active(&self) -> bool {
        self.walking || self.poke.is_some()
    }

    /// Account for `elapsed_ms` of wall time ending at `now_ms`.
    pub fn advance(&mut self, elapsed_ms: f64, now_ms: f64) {
        if self.walking {
            self.walk_phase += clamp_elapsed(elapsed_ms) * 0.001 * LEG_SWING_CYCLES_PER_SEC;
        }
        if let Some(poke) = self.poke {
            if poke.progress(now_ms).is_none() {
                log::debug!("poke expired");
                self.poke = None;
            }
        }
    }

    /// Pose from the procedural sources, `None` when the manual controls
    /// should be used. The poke reaction overrides walking.
    pub fn pose(&self, now_ms: f64) -> Option<PoseAngles> {
        if let Some(progress) = self.poke.and_then(|p| p.progress(now_ms)) {
            return Some(poke_pose(poke_signal(progress)));
        }
        self.walking.then(|| walk_pose(self.walk_phase))
    }

    /// [`advance`](Self::advance) followed by [`pose`](Self::pose).
    pub fn update(&mut self, elapsed_ms: f64, now_ms: f64) -> Option<PoseAngles> {
        self.advance(elapsed_ms, now_ms);
        self.pose(now_ms)
    }
}

/// Binds an [`AnimationState`] to a clock and measures frame deltas.
#[derive(Debug)]
pub struct Animator<C> {
    clock: C,
    state: AnimationState,
    last_tick_ms: f64,
}

impl<C: Clock> Animator<C> {
    pub fn new(clock: C) -> Self {
        let last_tick_ms = clock.now_ms();
        Self {
            clock,
            state: AnimationState::new(),
            last_tick_ms,
        }
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn set_walking(&mut self, walking: bool) {
        if walking && !self.state.is_walking() {
            // no catch-up for the time spent paused
            self.last_tick_ms = self.clock.now_ms();
        }
        self.state.set_walking(walking);
    }

    pub fn toggle_walking(&mut self) -> bool {
        let walking = !self.state.is_walking();
        self.set_walking(walking);
        walking
    }

    pub fn poke(&mut self) {
        if !self.state.is_active() {
            self.last_tick_ms = self.clock.now_ms();
        }
        self.state.trigger_poke(self.clock.now_ms());
    }

    /// Advance to the clock's current time and derive this frame's pose.
    pub fn tick(&mut self) -> Option<PoseAngles> {
        let now = self.clock.now_ms();
        let elapsed = now - self.last_tick_ms;
        self.last_tick_ms = now;
        self.state.update(elapsed, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const EPS: f32 = 1e-4;

    #[test]
    fn front_legs_are_opposed_at_phase_zero() {
        let pose = walk_pose(0.0);
        assert!((pose.left_front_leg + pose.right_front_leg).abs() < EPS);
        assert!((pose.left_back_leg + pose.right_back_leg).abs() < EPS);
    }

    #[test]
    fn left_front_leg_peaks_at_quarter_cycle() {
        let pose = walk_pose(0.25);
        assert!((pose.left_front_leg - MAX_LEG_ANGLE).abs() < EPS);
        assert!((pose.right_front_leg + MAX_LEG_ANGLE).abs() < EPS);
        // paws lead their legs by a quarter cycle
        assert!(pose.left_front_paw.abs() < EPS);
    }

    #[test]
    fn paws_peak_at_phase_zero() {
        let pose = walk_pose(0.0);
        assert!((pose.left_front_paw - MAX_PAW_ANGLE).abs() < EPS);
        assert!((pose.right_front_paw + MAX_PAW_ANGLE).abs() < EPS);
    }

    #[test]
    fn walk_pose_is_periodic() {
        let a = walk_pose(0.37);
        let b = walk_pose(2.37);
        assert!((a.left_front_leg - b.left_front_leg).abs() < EPS);
        assert!((a.tail - b.tail).abs() < EPS);
        assert!((a.head - b.head).abs() < EPS);
    }

    #[test]
    fn elapsed_is_clamped() {
        assert_eq!(clamp_elapsed(5000.0), MAX_TICK_MS);
        assert_eq!(clamp_elapsed(-3.0), 0.0);
        assert_eq!(clamp_elapsed(f64::NAN), 0.0);
        assert_eq!(clamp_elapsed(16.0), 16.0);
    }

    #[test]
    fn phase_advances_only_while_walking() {
        let mut state = AnimationState::new();
        state.advance(100.0, 100.0);
        assert_eq!(state.walk_phase(), 0.0);

        state.set_walking(true);
        state.advance(100.0, 200.0);
        assert!((state.walk_phase() - 0.3).abs() < 1e-9);

        // a long stall only counts for the tick ceiling
        state.advance(10_000.0, 10_200.0);
        assert!((state.walk_phase() - 0.9).abs() < 1e-9);

        state.set_walking(false);
        state.advance(100.0, 10_300.0);
        assert!((state.walk_phase() - 0.9).abs() < 1e-9);
    }

    #[test]
    fn idle_state_has_no_procedural_pose() {
        let state = AnimationState::new();
        assert_eq!(state.pose(0.0), None);
        assert!(!state.is_active());
    }

    #[test]
    fn poke_starts_at_base_offsets() {
        let mut state = AnimationState::new();
        state.trigger_poke(1000.0);
        let pose = state.pose(1000.0).expect("poked");
        assert_eq!(pose.tail, 60.0);
        assert_eq!(pose.head, 0.0);
        assert_eq!(pose.left_front_leg, 0.0);
    }

    #[test]
    fn poke_overrides_walking_then_expires() {
        let mut state = AnimationState::new();
        state.set_walking(true);
        state.trigger_poke(0.0);

        let during = state.update(16.0, 125.0).expect("active");
        // progress 1/8 -> signal sin(pi/2) = 1
        assert!((during.tail - 80.0).abs() < EPS);
        assert!((during.head - 10.0).abs() < EPS);

        let after = state.update(16.0, 1000.0).expect("walking");
        assert!(!state.is_poked());
        assert_eq!(after, walk_pose(state.walk_phase()));
    }

    #[test]
    fn expired_poke_without_walk_returns_to_manual() {
        let mut state = AnimationState::new();
        state.trigger_poke(0.0);
        assert!(state.pose(999.0).is_some());
        assert_eq!(state.pose(1000.0), None);
        state.advance(16.0, 1500.0);
        assert!(!state.is_poked());
    }

    #[test]
    fn repoke_restarts_reaction() {
        let mut state = AnimationState::new();
        state.trigger_poke(0.0);
        state.trigger_poke(900.0);
        state.advance(16.0, 1200.0);
        assert!(state.is_poked());
        let pose = state.pose(900.0).expect("restarted");
        assert_eq!(pose.tail, 60.0);
    }

    #[test]
    fn animator_measures_deltas_from_clock() {
        let mut anim = Animator::new(ManualClock::new(0.0));
        assert_eq!(anim.tick(), None);

        anim.clock().advance(5000.0);
        anim.set_walking(true);
        anim.clock().advance(50.0);
        let pose = anim.tick().expect("walking");
        assert!((anim.state().walk_phase() - 0.15).abs() < 1e-9);
        assert_eq!(pose, walk_pose(0.15));

        assert!(!anim.toggle_walking());
        anim.poke();
        anim.clock().advance(250.0);
        let pose = anim.tick().expect("poked");
        // progress 1/4 -> signal sin(pi) ~ 0
        assert!((pose.tail - 60.0).abs() < EPS);
        anim.clock().advance(800.0);
        assert_eq!(anim.tick(), None);
    }
}
