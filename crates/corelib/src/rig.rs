//! Kinematic rig of the cat: fixed joint hierarchy plus the meshes hung on it.
//!
//! The topology never changes, so it is written out as two static tables:
//! [`JOINTS`] (frames that children inherit) and the mesh groups (visual
//! parts that inherit a joint frame but pass nothing on). A mesh's own
//! sizing scale is applied to a copy of its joint frame, never to the frame
//! itself.

use std::collections::HashSet;
use std::fmt;

use crate::palette;
use crate::pose::PoseAngles;
use crate::render::PrimitiveKind::{self, Cube, Cylinder, Sphere};
use crate::render::{Renderer, Rgba};
use crate::transform::Affine4;

const X_AXIS: [f32; 3] = [1.0, 0.0, 0.0];
const Y_AXIS: [f32; 3] = [0.0, 1.0, 0.0];
const Z_AXIS: [f32; 3] = [0.0, 0.0, 1.0];
const ORIGIN: [f32; 3] = [0.0, 0.0, 0.0];

/// Tail segments bend this much further than their parent at rest.
pub const TAIL_CURVE_DEG: f32 = 20.0;

/// Default placement of the figure: lifted half a unit.
pub fn default_root() -> Affine4 {
    let mut root = Affine4::IDENTITY;
    root.translate(0.0, 0.5, 0.0);
    root
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// Lateral sign: left limbs sit on +X.
    pub const fn sign(self) -> f32 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

const fn lateral(side: Side, x: f32) -> f32 {
    side.sign() * x
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Limb {
    Front(Side),
    Back(Side),
}

/// Frames that other parts attach to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Joint {
    Body,
    Head,
    TailBase,
    TailMiddle,
    TailTip,
    FrontUpperLeg(Side),
    FrontLowerLeg(Side),
    BackLeg(Side),
}

pub const JOINT_COUNT: usize = 11;

impl Joint {
    pub const fn index(self) -> usize {
        match self {
            Joint::Body => 0,
            Joint::Head => 1,
            Joint::TailBase => 2,
            Joint::TailMiddle => 3,
            Joint::TailTip => 4,
            Joint::FrontUpperLeg(Side::Left) => 5,
            Joint::FrontUpperLeg(Side::Right) => 6,
            Joint::FrontLowerLeg(Side::Left) => 7,
            Joint::FrontLowerLeg(Side::Right) => 8,
            Joint::BackLeg(Side::Left) => 9,
            Joint::BackLeg(Side::Right) => 10,
        }
    }
}

/// Visible body parts. Several meshes may share one part (the whiskers).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Part {
    Body,
    Head,
    Ear(Side),
    FaceMask,
    Eye(Side),
    Nose,
    Whiskers,
    Helmet,
    HelmetRing,
    TailBase,
    TailMiddle,
    TailTip,
    FrontUpperLeg(Side),
    FrontLowerLeg(Side),
    FrontPaw(Side),
    BackLeg(Side),
    BackPaw(Side),
    /// `step` is the lateral slot, -1, 0 or +1.
    Toe { limb: Limb, step: i8 },
}

impl Part {
    /// Toes are decoration and do not count as body parts.
    pub fn is_counted(&self) -> bool {
        !matches!(self, Part::Toe { .. })
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Part::Body => f.write_str("body"),
            Part::Head => f.write_str("head"),
            Part::Ear(s) => write!(f, "{}Ear", s.name()),
            Part::FaceMask => f.write_str("faceMask"),
            Part::Eye(s) => write!(f, "{}Eye", s.name()),
            Part::Nose => f.write_str("nose"),
            Part::Whiskers => f.write_str("whiskers"),
            Part::Helmet => f.write_str("helmet"),
            Part::HelmetRing => f.write_str("helmetRing"),
            Part::TailBase => f.write_str("tailBase"),
            Part::TailMiddle => f.write_str("tailMiddle"),
            Part::TailTip => f.write_str("tailTip"),
            Part::FrontUpperLeg(s) => write!(f, "{}UpperLeg", s.name()),
            Part::FrontLowerLeg(s) => write!(f, "{}LowerLeg", s.name()),
            Part::FrontPaw(s) => write!(f, "{}FrontPaw", s.name()),
            Part::BackLeg(s) => write!(f, "{}BackLeg", s.name()),
            Part::BackPaw(s) => write!(f, "{}BackPaw", s.name()),
            Part::Toe {
                limb: Limb::Front(s),
                step,
            } => write!(f, "{}FrontToe[{step}]", s.name()),
            Part::Toe {
                limb: Limb::Back(s),
                step,
            } => write!(f, "{}BackToe[{step}]", s.name()),
        }
    }
}

/// Where a joint's angle comes from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AngleSource {
    Head,
    /// `tail / divisor + curve`
    Tail { divisor: f32, curve: f32 },
    FrontLeg(Side),
    FrontPaw(Side),
    BackLeg(Side),
}

impl AngleSource {
    pub fn resolve(&self, pose: &PoseAngles) -> f32 {
        match *self {
            AngleSource::Head => pose.head,
            AngleSource::Tail { divisor, curve } => pose.tail / divisor + curve,
            AngleSource::FrontLeg(Side::Left) => pose.left_front_leg,
            AngleSource::FrontLeg(Side::Right) => pose.right_front_leg,
            AngleSource::FrontPaw(Side::Left) => pose.left_front_paw,
            AngleSource::FrontPaw(Side::Right) => pose.right_front_paw,
            AngleSource::BackLeg(Side::Left) => pose.left_back_leg,
            AngleSource::BackLeg(Side::Right) => pose.right_back_leg,
        }
    }
}

/// One row of the joint table: `parent * T(offset) * R(angle, axis)`.
#[derive(Clone, Copy, Debug)]
pub struct JointSpec {
    pub joint: Joint,
    /// `None` attaches to the root transform.
    pub parent: Option<Joint>,
    pub offset: [f32; 3],
    pub axis: [f32; 3],
    pub angle: Option<AngleSource>,
}

const fn joint(
    joint: Joint,
    parent: Joint,
    offset: [f32; 3],
    axis: [f32; 3],
    angle: AngleSource,
) -> JointSpec {
    JointSpec {
        joint,
        parent: Some(parent),
        offset,
        axis,
        angle: Some(angle),
    }
}

/// Joint hierarchy, parents listed before their children.
pub const JOINTS: [JointSpec; JOINT_COUNT] = [
    JointSpec {
        joint: Joint::Body,
        parent: None,
        offset: ORIGIN,
        axis: ORIGIN,
        angle: None,
    },
    joint(Joint::Head, Joint::Body, [0.0, 0.7, 0.0], Z_AXIS, AngleSource::Head),
    joint(
        Joint::TailBase,
        Joint::Body,
        [0.0, -0.1, -0.4],
        X_AXIS,
        AngleSource::Tail {
            divisor: 1.0,
            curve: 0.0,
        },
    ),
    joint(
        Joint::TailMiddle,
        Joint::TailBase,
        [0.0, 0.0, -0.3],
        X_AXIS,
        AngleSource::Tail {
            divisor: 2.0,
            curve: TAIL_CURVE_DEG,
        },
    ),
    joint(
        Joint::TailTip,
        Joint::TailMiddle,
        [0.0, 0.0, -0.3],
        X_AXIS,
        AngleSource::Tail {
            divisor: 3.0,
            curve: TAIL_CURVE_DEG,
        },
    ),
    front_upper_leg(Side::Left),
    front_upper_leg(Side::Right),
    front_lower_leg(Side::Left),
    front_lower_leg(Side::Right),
    back_leg(Side::Left),
    back_leg(Side::Right),
];

const fn front_upper_leg(side: Side) -> JointSpec {
    joint(
        Joint::FrontUpperLeg(side),
        Joint::Body,
        [lateral(side, 0.35), -0.2, 0.1],
        X_AXIS,
        AngleSource::FrontLeg(side),
    )
}

const fn front_lower_leg(side: Side) -> JointSpec {
    joint(
        Joint::FrontLowerLeg(side),
        Joint::FrontUpperLeg(side),
        [0.0, -0.35, 0.0],
        X_AXIS,
        AngleSource::FrontPaw(side),
    )
}

// Hind legs have a single joint; the paw hangs straight off it.
const fn back_leg(side: Side) -> JointSpec {
    joint(
        Joint::BackLeg(side),
        Joint::Body,
        [lateral(side, 0.25), -0.3, -0.2],
        X_AXIS,
        AngleSource::BackLeg(side),
    )
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation {
    pub angle_deg: f32,
    pub axis: [f32; 3],
}

/// A mesh placed in a joint frame: `frame * T(offset) * R... * S(scale)`.
#[derive(Clone, Copy, Debug)]
pub struct MeshSpec {
    pub part: Part,
    pub joint: Joint,
    pub kind: PrimitiveKind,
    pub color: Rgba,
    pub offset: [f32; 3],
    pub rotations: &'static [Rotation],
    pub scale: [f32; 3],
}

const fn mesh(
    part: Part,
    joint: Joint,
    kind: PrimitiveKind,
    color: Rgba,
    offset: [f32; 3],
    scale: [f32; 3],
) -> MeshSpec {
    turned(part, joint, kind, color, offset, &[], scale)
}

const fn turned(
    part: Part,
    joint: Joint,
    kind: PrimitiveKind,
    color: Rgba,
    offset: [f32; 3],
    rotations: &'static [Rotation],
    scale: [f32; 3],
) -> MeshSpec {
    MeshSpec {
        part,
        joint,
        kind,
        color,
        offset,
        rotations,
        scale,
    }
}

const TOE_SPACING: f32 = 0.05;
const TOE_SCALE: [f32; 3] = [0.04, 0.05, 0.08];

const fn toe(limb: Limb, step: i8, joint: Joint, drop: f32) -> MeshSpec {
    mesh(
        Part::Toe { limb, step },
        joint,
        Sphere,
        palette::CAT_POINTS,
        [step as f32 * TOE_SPACING, drop, 0.15],
        TOE_SCALE,
    )
}

const BODY_MESHES: [MeshSpec; 1] = [mesh(
    Part::Body,
    Joint::Body,
    Cube,
    palette::SPACE_SUIT,
    ORIGIN,
    [0.45, 0.6, 0.4],
)];

const WHISKER_SCALE: [f32; 3] = [0.15, 0.01, 0.01];

const HEAD_MESHES: [MeshSpec; 12] = [
    mesh(Part::Head, Joint::Head, Sphere, palette::CAT_HEAD, ORIGIN, [0.4, 0.35, 0.4]),
    turned(
        Part::Ear(Side::Left),
        Joint::Head,
        Cube,
        palette::CAT_POINTS,
        [-0.18, 0.25, 0.0],
        &[
            Rotation { angle_deg: 30.0, axis: Z_AXIS },
            Rotation { angle_deg: -15.0, axis: X_AXIS },
        ],
        [0.12, 0.2, 0.08],
    ),
    turned(
        Part::Ear(Side::Right),
        Joint::Head,
        Cube,
        palette::CAT_POINTS,
        [0.18, 0.25, 0.0],
        &[
            Rotation { angle_deg: -30.0, axis: Z_AXIS },
            Rotation { angle_deg: -15.0, axis: X_AXIS },
        ],
        [0.12, 0.2, 0.08],
    ),
    mesh(Part::FaceMask, Joint::Head, Sphere, palette::CAT_POINTS, [0.0, 0.05, 0.25], [0.25, 0.18, 0.15]),
    mesh(Part::Eye(Side::Left), Joint::Head, Sphere, palette::CAT_EYES, [-0.12, 0.05, 0.25], [0.08, 0.12, 0.05]),
    mesh(Part::Eye(Side::Right), Joint::Head, Sphere, palette::CAT_EYES, [0.12, 0.05, 0.25], [0.08, 0.12, 0.05]),
    mesh(Part::Nose, Joint::Head, Sphere, palette::CAT_NOSE, [0.0, -0.05, 0.28], [0.06, 0.04, 0.04]),
    turned(
        Part::Whiskers,
        Joint::Head,
        Cube,
        palette::WHISKERS,
        [-0.15, -0.05, 0.25],
        &[Rotation { angle_deg: 10.0, axis: Y_AXIS }],
        WHISKER_SCALE,
    ),
    mesh(Part::Whiskers, Joint::Head, Cube, palette::WHISKERS, [-0.15, -0.1, 0.25], WHISKER_SCALE),
    turned(
        Part::Whiskers,
        Joint::Head,
        Cube,
        palette::WHISKERS,
        [0.15, -0.05, 0.25],
        &[Rotation { angle_deg: -10.0, axis: Y_AXIS }],
        WHISKER_SCALE,
    ),
    mesh(Part::Whiskers, Joint::Head, Cube, palette::WHISKERS, [0.15, -0.1, 0.25], WHISKER_SCALE),
    turned(
        Part::HelmetRing,
        Joint::Head,
        Cylinder,
        palette::HELMET_RING,
        [0.0, -0.15, 0.0],
        &[Rotation { angle_deg: 90.0, axis: X_AXIS }],
        [0.55, 0.05, 0.55],
    ),
];

const TAIL_MESHES: [MeshSpec; 3] = [
    mesh(Part::TailBase, Joint::TailBase, Cylinder, palette::CAT_POINTS, ORIGIN, [0.1, 0.1, 0.3]),
    mesh(Part::TailMiddle, Joint::TailMiddle, Cylinder, palette::CAT_POINTS, ORIGIN, [0.09, 0.09, 0.3]),
    mesh(Part::TailTip, Joint::TailTip, Cylinder, palette::CAT_POINTS, ORIGIN, [0.07, 0.07, 0.25]),
];

const fn front_leg_meshes(side: Side) -> [MeshSpec; 6] {
    let limb = Limb::Front(side);
    let upper = Joint::FrontUpperLeg(side);
    let lower = Joint::FrontLowerLeg(side);
    [
        mesh(Part::FrontUpperLeg(side), upper, Cylinder, palette::CAT_POINTS, ORIGIN, [0.12, 0.35, 0.12]),
        mesh(Part::FrontLowerLeg(side), lower, Cylinder, palette::CAT_POINTS, ORIGIN, [0.1, 0.25, 0.1]),
        mesh(Part::FrontPaw(side), lower, Sphere, palette::CAT_POINTS, [0.0, -0.15, 0.05], [0.15, 0.1, 0.25]),
        toe(limb, -1, lower, -0.2),
        toe(limb, 0, lower, -0.2),
        toe(limb, 1, lower, -0.2),
    ]
}

const fn back_leg_meshes(side: Side) -> [MeshSpec; 5] {
    let limb = Limb::Back(side);
    let leg = Joint::BackLeg(side);
    [
        mesh(Part::BackLeg(side), leg, Cylinder, palette::CAT_POINTS, ORIGIN, [0.13, 0.35, 0.13]),
        mesh(Part::BackPaw(side), leg, Sphere, palette::CAT_POINTS, [0.0, -0.35, 0.05], [0.15, 0.1, 0.25]),
        toe(limb, -1, leg, -0.4),
        toe(limb, 0, leg, -0.4),
        toe(limb, 1, leg, -0.4),
    ]
}

const LEFT_FRONT_LEG: [MeshSpec; 6] = front_leg_meshes(Side::Left);
const RIGHT_FRONT_LEG: [MeshSpec; 6] = front_leg_meshes(Side::Right);
const LEFT_BACK_LEG: [MeshSpec; 5] = back_leg_meshes(Side::Left);
const RIGHT_BACK_LEG: [MeshSpec; 5] = back_leg_meshes(Side::Right);

// Translucent last so it blends over everything else.
const HELMET_MESHES: [MeshSpec; 1] = [mesh(
    Part::Helmet,
    Joint::Head,
    Sphere,
    palette::HELMET,
    ORIGIN,
    [1.3, 1.3, 1.3],
)];

/// Every mesh of the figure, in emission order.
pub static MESH_GROUPS: [&[MeshSpec]; 8] = [
    &BODY_MESHES,
    &HEAD_MESHES,
    &TAIL_MESHES,
    &LEFT_FRONT_LEG,
    &RIGHT_FRONT_LEG,
    &LEFT_BACK_LEG,
    &RIGHT_BACK_LEG,
    &HELMET_MESHES,
];

pub fn meshes() -> impl Iterator<Item = &'static MeshSpec> {
    MESH_GROUPS.iter().flat_map(|group| group.iter())
}

/// World frame of every joint for one pose.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JointFrames {
    frames: [Affine4; JOINT_COUNT],
}

impl JointFrames {
    /// Walk [`JOINTS`] from the root down.
    pub fn solve(root: &Affine4, pose: &PoseAngles) -> Self {
        let mut frames = [Affine4::IDENTITY; JOINT_COUNT];
        for spec in &JOINTS {
            let mut m = match spec.parent {
                Some(parent) => frames[parent.index()],
                None => *root,
            };
            let [x, y, z] = spec.offset;
            m.translate(x, y, z);
            if let Some(source) = spec.angle {
                let [ax, ay, az] = spec.axis;
                m.rotate(source.resolve(pose), ax, ay, az);
            }
            frames[spec.joint.index()] = m;
        }
        Self { frames }
    }

    #[inline]
    pub fn get(&self, joint: Joint) -> &Affine4 {
        &self.frames[joint.index()]
    }
}

/// One primitive to draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawInstruction {
    pub part: Part,
    pub kind: PrimitiveKind,
    pub world: Affine4,
    pub color: Rgba,
}

/// All primitives of a posed figure.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawList {
    items: Vec<DrawInstruction>,
}

impl DrawList {
    pub fn iter(&self) -> std::slice::Iter<'_, DrawInstruction> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Instructions of one part, in emission order.
    pub fn part(&self, part: Part) -> impl Iterator<Item = &DrawInstruction> + '_ {
        self.items.iter().filter(move |d| d.part == part)
    }

    /// Number of distinct counted body parts.
    pub fn part_count(&self) -> usize {
        self.items
            .iter()
            .filter(|d| d.part.is_counted())
            .map(|d| d.part)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Emit every instruction into `renderer`.
    pub fn submit<R: Renderer + ?Sized>(&self, renderer: &mut R) {
        for d in &self.items {
            renderer.emit(d.kind, &d.world, d.color);
        }
    }
}

impl<'a> IntoIterator for &'a DrawList {
    type Item = &'a DrawInstruction;
    type IntoIter = std::slice::Iter<'a, DrawInstruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Pose the figure: world transform, primitive and color of every mesh.
pub fn build(root: &Affine4, pose: &PoseAngles) -> DrawList {
    let frames = JointFrames::solve(root, pose);
    let items = meshes()
        .map(|spec| {
            let mut m = *frames.get(spec.joint);
            let [x, y, z] = spec.offset;
            m.translate(x, y, z);
            for r in spec.rotations {
                let [ax, ay, az] = r.axis;
                m.rotate(r.angle_deg, ax, ay, az);
            }
            let [sx, sy, sz] = spec.scale;
            m.scale(sx, sy, sz);
            DrawInstruction {
                part: spec.part,
                kind: spec.kind,
                world: m,
                color: spec.color,
            }
        })
        .collect();
    DrawList { items }
}

/// Start a frame with `global` and emit every part. The caller ends the
/// frame, so a back end can paint more on top first.
pub fn record_figure<R: Renderer>(
    renderer: &mut R,
    global: &Affine4,
    root: &Affine4,
    pose: &PoseAngles,
) -> DrawList {
    let list = build(root, pose);
    renderer.begin_frame(global);
    list.submit(renderer);
    log::debug!("recorded {} parts ({} primitives)", list.part_count(), list.len());
    list
}
