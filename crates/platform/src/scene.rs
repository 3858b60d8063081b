//! Viewer state that outlives a single frame: camera, manual controls,
//! animation and frame timing.

use corelib::animation::Animator;
use corelib::camera::OrbitCamera;
use corelib::clock::{Clock, FpsCounter};
use corelib::rig;
use corelib::{Affine4, ManualPose, PoseAngles, Renderer};

pub struct Scene<C: Clock> {
    pub camera: OrbitCamera,
    /// The pose set by hand. Procedural animation never writes here.
    pub manual: ManualPose,
    /// What the controls display: the live pose while animating, else `manual`.
    shown: ManualPose,
    animator: Animator<C>,
    fps: FpsCounter,
    root: Affine4,
}

impl<C: Clock> Scene<C> {
    pub fn new(clock: C, start_walking: bool) -> Self {
        let mut animator = Animator::new(clock);
        animator.set_walking(start_walking);
        Self {
            camera: OrbitCamera::new(),
            manual: ManualPose::default(),
            shown: ManualPose::default(),
            animator,
            fps: FpsCounter::new(),
            root: rig::default_root(),
        }
    }

    pub fn is_walking(&self) -> bool {
        self.animator.state().is_walking()
    }

    /// True while the pose changes without input, so frames must keep coming.
    pub fn is_animating(&self) -> bool {
        self.animator.state().is_active()
    }

    pub fn toggle_walking(&mut self) -> bool {
        self.animator.toggle_walking()
    }

    pub fn poke(&mut self) {
        self.animator.poke();
    }

    pub fn fps(&self) -> Option<u32> {
        self.fps.fps()
    }

    pub fn shown(&self) -> ManualPose {
        self.shown
    }

    /// This frame's pose: the procedural one while a source is active, the
    /// manual one otherwise.
    pub fn frame_pose(&mut self) -> PoseAngles {
        match self.animator.tick() {
            Some(pose) => {
                self.shown.follow(&pose);
                pose
            }
            None => {
                self.shown = self.manual;
                self.manual.to_pose_angles()
            }
        }
    }

    /// Pose the figure and record it into `renderer`. The caller finishes
    /// the frame. Returns a newly published FPS value, if any.
    pub fn record<R: Renderer>(&mut self, renderer: &mut R, aspect: f32) -> Option<u32> {
        let pose = self.frame_pose();
        let global = self.camera.clip_transform(aspect);
        rig::record_figure(renderer, &global, &self.root, &pose);
        self.fps.frame(self.animator.clock().now_ms())
    }
}
