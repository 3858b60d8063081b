//! Joint angles for one frame.

/// All joint angles of the figure, in degrees.
///
/// Values are unconstrained; anything past a full turn simply wraps through
/// the trigonometry.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PoseAngles {
    pub head: f32,
    pub tail: f32,
    pub left_front_leg: f32,
    pub right_front_leg: f32,
    pub left_front_paw: f32,
    pub right_front_paw: f32,
    pub left_back_leg: f32,
    pub right_back_leg: f32,
}

/// The four controls the UI exposes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ManualPose {
    pub head: f32,
    pub tail: f32,
    pub leg: f32,
    pub paw: f32,
}

impl ManualPose {
    /// One leg control drives all four legs; one paw control both front paws.
    pub fn to_pose_angles(&self) -> PoseAngles {
        PoseAngles {
            head: self.head,
            tail: self.tail,
            left_front_leg: self.leg,
            right_front_leg: self.leg,
            left_front_paw: self.paw,
            right_front_paw: self.paw,
            left_back_leg: self.leg,
            right_back_leg: self.leg,
        }
    }

    /// Mirror a computed pose back into the controls (left side wins).
    pub fn follow(&mut self, pose: &PoseAngles) {
        self.head = pose.head;
        self.tail = pose.tail;
        self.leg = pose.left_front_leg;
        self.paw = pose.left_front_paw;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_leg_drives_all_legs() {
        let pose = ManualPose {
            head: 5.0,
            tail: -10.0,
            leg: 20.0,
            paw: 7.5,
        }
        .to_pose_angles();
        assert_eq!(pose.head, 5.0);
        assert_eq!(pose.tail, -10.0);
        for leg in [
            pose.left_front_leg,
            pose.right_front_leg,
            pose.left_back_leg,
            pose.right_back_leg,
        ] {
            assert_eq!(leg, 20.0);
        }
        assert_eq!(pose.left_front_paw, 7.5);
        assert_eq!(pose.right_front_paw, 7.5);
    }

    #[test]
    fn follow_takes_left_side() {
        let mut controls = ManualPose::default();
        controls.follow(&PoseAngles {
            head: 1.0,
            tail: 2.0,
            left_front_leg: 3.0,
            right_front_leg: -3.0,
            left_front_paw: 4.0,
            right_front_paw: -4.0,
            ..Default::default()
        });
        assert_eq!(
            controls,
            ManualPose {
                head: 1.0,
                tail: 2.0,
                leg: 3.0,
                paw: 4.0
            }
        );
    }
}
