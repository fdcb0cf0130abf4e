// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reserved node names.
//!
//! Model files tag window panes, mirrors, lights, mannequin body parts and
//! articulation joints through node names starting with
//! [`SPECIAL_SHAPE_PREFIX`]. Every recognised prefix is a variant of
//! [`SpecialPrefix`], spelled exactly as asset libraries write it.
//!
//! Indexed joints are named `<prefix><N>` (`sweethome3d_hinge_1`,
//! `sweethome3d_opening_on_hinge_1`, ...). A joint whose transformation
//! depends on another joint is named
//! `<prefix><N>_and_<sub prefix><M>`.

/// Common prefix of every reserved name
pub const SPECIAL_SHAPE_PREFIX: &str = "sweethome3d_";

/// Separator between a joint name and the joint it depends on
pub const SUB_TRANSFORMATION_SEPARATOR: &str = "_and_";

/// Suffix of the pickable transform groups built around joints
pub const DEFORMABLE_TRANSFORM_GROUP_SUFFIX: &str = "_transformation";

/// Prefix of the materials used to draw model edges
pub const EDGE_COLOR_MATERIAL_PREFIX: &str = "edge_color";

/// Reserved node-name prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialPrefix {
    WindowPane,
    WindowMirror,
    Light,
    MannequinAbdomen,
    MannequinChest,
    MannequinPelvis,
    MannequinNeck,
    MannequinHead,
    MannequinLeftShoulder,
    MannequinLeftArm,
    MannequinLeftElbow,
    MannequinLeftForearm,
    MannequinLeftWrist,
    MannequinLeftHand,
    MannequinLeftHip,
    MannequinLeftThigh,
    MannequinLeftKnee,
    MannequinLeftLeg,
    MannequinLeftAnkle,
    MannequinLeftFoot,
    MannequinRightShoulder,
    MannequinRightArm,
    MannequinRightElbow,
    MannequinRightForearm,
    MannequinRightWrist,
    MannequinRightHand,
    MannequinRightHip,
    MannequinRightThigh,
    MannequinRightKnee,
    MannequinRightLeg,
    MannequinRightAnkle,
    MannequinRightFoot,
    MannequinAbdomenChest,
    MannequinAbdomenPelvis,
    Ball,
    ArmOnBall,
    Hinge,
    OpeningOnHinge,
    WindowPaneOnHinge,
    WindowMirrorOnHinge,
    UniqueRail,
    Rail,
    OpeningOnRail,
    WindowPaneOnRail,
    WindowMirrorOnRail,
}

impl SpecialPrefix {
    /// Every reserved prefix
    pub const ALL: [SpecialPrefix; 45] = [
        SpecialPrefix::WindowPane,
        SpecialPrefix::WindowMirror,
        SpecialPrefix::Light,
        SpecialPrefix::MannequinAbdomen,
        SpecialPrefix::MannequinChest,
        SpecialPrefix::MannequinPelvis,
        SpecialPrefix::MannequinNeck,
        SpecialPrefix::MannequinHead,
        SpecialPrefix::MannequinLeftShoulder,
        SpecialPrefix::MannequinLeftArm,
        SpecialPrefix::MannequinLeftElbow,
        SpecialPrefix::MannequinLeftForearm,
        SpecialPrefix::MannequinLeftWrist,
        SpecialPrefix::MannequinLeftHand,
        SpecialPrefix::MannequinLeftHip,
        SpecialPrefix::MannequinLeftThigh,
        SpecialPrefix::MannequinLeftKnee,
        SpecialPrefix::MannequinLeftLeg,
        SpecialPrefix::MannequinLeftAnkle,
        SpecialPrefix::MannequinLeftFoot,
        SpecialPrefix::MannequinRightShoulder,
        SpecialPrefix::MannequinRightArm,
        SpecialPrefix::MannequinRightElbow,
        SpecialPrefix::MannequinRightForearm,
        SpecialPrefix::MannequinRightWrist,
        SpecialPrefix::MannequinRightHand,
        SpecialPrefix::MannequinRightHip,
        SpecialPrefix::MannequinRightThigh,
        SpecialPrefix::MannequinRightKnee,
        SpecialPrefix::MannequinRightLeg,
        SpecialPrefix::MannequinRightAnkle,
        SpecialPrefix::MannequinRightFoot,
        SpecialPrefix::MannequinAbdomenChest,
        SpecialPrefix::MannequinAbdomenPelvis,
        SpecialPrefix::Ball,
        SpecialPrefix::ArmOnBall,
        SpecialPrefix::Hinge,
        SpecialPrefix::OpeningOnHinge,
        SpecialPrefix::WindowPaneOnHinge,
        SpecialPrefix::WindowMirrorOnHinge,
        SpecialPrefix::UniqueRail,
        SpecialPrefix::Rail,
        SpecialPrefix::OpeningOnRail,
        SpecialPrefix::WindowPaneOnRail,
        SpecialPrefix::WindowMirrorOnRail,
    ];

    /// Parts that must all be present for a model to be rigged as a mannequin
    pub const MANNEQUIN_PARTS: [SpecialPrefix; 29] = [
        SpecialPrefix::MannequinAbdomen,
        SpecialPrefix::MannequinChest,
        SpecialPrefix::MannequinPelvis,
        SpecialPrefix::MannequinNeck,
        SpecialPrefix::MannequinHead,
        SpecialPrefix::MannequinLeftShoulder,
        SpecialPrefix::MannequinLeftArm,
        SpecialPrefix::MannequinLeftElbow,
        SpecialPrefix::MannequinLeftForearm,
        SpecialPrefix::MannequinLeftWrist,
        SpecialPrefix::MannequinLeftHand,
        SpecialPrefix::MannequinLeftHip,
        SpecialPrefix::MannequinLeftThigh,
        SpecialPrefix::MannequinLeftKnee,
        SpecialPrefix::MannequinLeftLeg,
        SpecialPrefix::MannequinLeftAnkle,
        SpecialPrefix::MannequinLeftFoot,
        SpecialPrefix::MannequinRightShoulder,
        SpecialPrefix::MannequinRightArm,
        SpecialPrefix::MannequinRightElbow,
        SpecialPrefix::MannequinRightForearm,
        SpecialPrefix::MannequinRightWrist,
        SpecialPrefix::MannequinRightHand,
        SpecialPrefix::MannequinRightHip,
        SpecialPrefix::MannequinRightThigh,
        SpecialPrefix::MannequinRightKnee,
        SpecialPrefix::MannequinRightLeg,
        SpecialPrefix::MannequinRightAnkle,
        SpecialPrefix::MannequinRightFoot,
    ];

    /// The reserved name prefix
    pub const fn as_str(self) -> &'static str {
        match self {
            SpecialPrefix::WindowPane => "sweethome3d_window_pane",
            SpecialPrefix::WindowMirror => "sweethome3d_window_mirror",
            SpecialPrefix::Light => "sweethome3d_light",
            SpecialPrefix::MannequinAbdomen => "sweethome3d_mannequin_abdomen",
            SpecialPrefix::MannequinChest => "sweethome3d_mannequin_chest",
            SpecialPrefix::MannequinPelvis => "sweethome3d_mannequin_pelvis",
            SpecialPrefix::MannequinNeck => "sweethome3d_mannequin_neck",
            SpecialPrefix::MannequinHead => "sweethome3d_mannequin_head",
            SpecialPrefix::MannequinLeftShoulder => "sweethome3d_mannequin_left_shoulder",
            SpecialPrefix::MannequinLeftArm => "sweethome3d_mannequin_left_arm",
            SpecialPrefix::MannequinLeftElbow => "sweethome3d_mannequin_left_elbow",
            SpecialPrefix::MannequinLeftForearm => "sweethome3d_mannequin_left_forearm",
            SpecialPrefix::MannequinLeftWrist => "sweethome3d_mannequin_left_wrist",
            SpecialPrefix::MannequinLeftHand => "sweethome3d_mannequin_left_hand",
            SpecialPrefix::MannequinLeftHip => "sweethome3d_mannequin_left_hip",
            SpecialPrefix::MannequinLeftThigh => "sweethome3d_mannequin_left_thigh",
            SpecialPrefix::MannequinLeftKnee => "sweethome3d_mannequin_left_knee",
            SpecialPrefix::MannequinLeftLeg => "sweethome3d_mannequin_left_leg",
            SpecialPrefix::MannequinLeftAnkle => "sweethome3d_mannequin_left_ankle",
            SpecialPrefix::MannequinLeftFoot => "sweethome3d_mannequin_left_foot",
            SpecialPrefix::MannequinRightShoulder => "sweethome3d_mannequin_right_shoulder",
            SpecialPrefix::MannequinRightArm => "sweethome3d_mannequin_right_arm",
            SpecialPrefix::MannequinRightElbow => "sweethome3d_mannequin_right_elbow",
            SpecialPrefix::MannequinRightForearm => "sweethome3d_mannequin_right_forearm",
            SpecialPrefix::MannequinRightWrist => "sweethome3d_mannequin_right_wrist",
            SpecialPrefix::MannequinRightHand => "sweethome3d_mannequin_right_hand",
            SpecialPrefix::MannequinRightHip => "sweethome3d_mannequin_right_hip",
            SpecialPrefix::MannequinRightThigh => "sweethome3d_mannequin_right_thigh",
            SpecialPrefix::MannequinRightKnee => "sweethome3d_mannequin_right_knee",
            SpecialPrefix::MannequinRightLeg => "sweethome3d_mannequin_right_leg",
            SpecialPrefix::MannequinRightAnkle => "sweethome3d_mannequin_right_ankle",
            SpecialPrefix::MannequinRightFoot => "sweethome3d_mannequin_right_foot",
            SpecialPrefix::MannequinAbdomenChest => "sweethome3d_mannequin_abdomen_chest",
            SpecialPrefix::MannequinAbdomenPelvis => "sweethome3d_mannequin_abdomen_pelvis",
            SpecialPrefix::Ball => "sweethome3d_ball_",
            SpecialPrefix::ArmOnBall => "sweethome3d_arm_on_ball_",
            SpecialPrefix::Hinge => "sweethome3d_hinge_",
            SpecialPrefix::OpeningOnHinge => "sweethome3d_opening_on_hinge_",
            SpecialPrefix::WindowPaneOnHinge => "sweethome3d_window_pane_on_hinge_",
            SpecialPrefix::WindowMirrorOnHinge => "sweethome3d_window_mirror_on_hinge_",
            SpecialPrefix::UniqueRail => "sweethome3d_unique_rail",
            SpecialPrefix::Rail => "sweethome3d_rail_",
            SpecialPrefix::OpeningOnRail => "sweethome3d_opening_on_rail_",
            SpecialPrefix::WindowPaneOnRail => "sweethome3d_window_pane_on_rail_",
            SpecialPrefix::WindowMirrorOnRail => "sweethome3d_window_mirror_on_rail_",
        }
    }

    /// Returns true if `name` starts with this prefix
    #[inline]
    pub fn matches(self, name: &str) -> bool {
        name.starts_with(self.as_str())
    }

    /// Name of the joint with the given index, like `sweethome3d_hinge_2`
    pub fn indexed(self, index: usize) -> String {
        format!("{}{}", self.as_str(), index)
    }

    /// Returns true if `name` is tagged with this prefix followed by `index`.
    ///
    /// The index must not be followed by another digit, so that
    /// `sweethome3d_hinge_1` doesn't match `sweethome3d_hinge_12`.
    pub fn matches_indexed(self, name: &str, index: usize) -> bool {
        matches_indexed(name, self.as_str(), index)
    }

    /// Name of the pickable transform group built for this prefix
    pub fn deformable_group_name(self) -> String {
        deformable_group_name(self.as_str())
    }
}

impl std::fmt::Display for SpecialPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true if `name` is `prefix` followed by `index` and no other digit
pub fn matches_indexed(name: &str, prefix: &str, index: usize) -> bool {
    let Some(rest) = name.strip_prefix(prefix) else {
        return false;
    };
    let digits = index.to_string();
    match rest.strip_prefix(digits.as_str()) {
        Some(tail) => !tail.starts_with(|c: char| c.is_ascii_digit()),
        None => false,
    }
}

/// Name given to the pickable transform group of a joint
pub fn deformable_group_name(prefix: &str) -> String {
    format!("{prefix}{DEFORMABLE_TRANSFORM_GROUP_SUFFIX}")
}

/// Returns true if `name` is the name of a pickable transform group
#[inline]
pub fn is_deformable_group_name(name: &str) -> bool {
    name.ends_with(DEFORMABLE_TRANSFORM_GROUP_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_are_reserved() {
        for prefix in SpecialPrefix::ALL {
            assert!(prefix.as_str().starts_with(SPECIAL_SHAPE_PREFIX), "{prefix}");
        }
        assert_eq!(SpecialPrefix::WindowPaneOnHinge.as_str(), "sweethome3d_window_pane_on_hinge_");
        assert_eq!(SpecialPrefix::MannequinRightFoot.as_str(), "sweethome3d_mannequin_right_foot");
    }

    #[test]
    fn test_indexed_matching() {
        let hinge = SpecialPrefix::Hinge;
        assert_eq!(hinge.indexed(3), "sweethome3d_hinge_3");
        assert!(hinge.matches_indexed("sweethome3d_hinge_1", 1));
        assert!(hinge.matches_indexed("sweethome3d_hinge_1_frame", 1));
        assert!(hinge.matches_indexed("sweethome3d_hinge_1_and_opening_on_hinge_2", 1));
        assert!(!hinge.matches_indexed("sweethome3d_hinge_12", 1));
        assert!(!hinge.matches_indexed("sweethome3d_hinge_2", 1));
        assert!(!hinge.matches_indexed("sweethome3d_opening_on_hinge_1", 1));
    }

    #[test]
    fn test_deformable_group_name() {
        let name = SpecialPrefix::MannequinNeck.deformable_group_name();
        assert_eq!(name, "sweethome3d_mannequin_neck_transformation");
        assert!(is_deformable_group_name(&name));
        assert!(!is_deformable_group_name("sweethome3d_mannequin_neck"));
    }
}
