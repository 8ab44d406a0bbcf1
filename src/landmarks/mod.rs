// Landmark record model: the fixed joint set and per-frame pose records.
// Joint ordering is stable for the life of a run; CSV columns and skeleton
// drawing both index into the same ordering.

/// Number of tracked joints per person
pub const JOINT_COUNT: usize = 33;

/// One tracked body point slot. The discriminant is the landmark index the
/// capability reports it at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Joint {
    Nose = 0,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl Joint {
    /// All joints in index order
    pub const ALL: [Joint; JOINT_COUNT] = [
        Joint::Nose,
        Joint::LeftEyeInner,
        Joint::LeftEye,
        Joint::LeftEyeOuter,
        Joint::RightEyeInner,
        Joint::RightEye,
        Joint::RightEyeOuter,
        Joint::LeftEar,
        Joint::RightEar,
        Joint::MouthLeft,
        Joint::MouthRight,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftPinky,
        Joint::RightPinky,
        Joint::LeftIndex,
        Joint::RightIndex,
        Joint::LeftThumb,
        Joint::RightThumb,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
        Joint::LeftHeel,
        Joint::RightHeel,
        Joint::LeftFootIndex,
        Joint::RightFootIndex,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Joint-to-joint connection segments for skeleton drawing
pub const SKELETON_CONNECTIONS: [(Joint, Joint); 35] = [
    // Face
    (Joint::Nose, Joint::LeftEyeInner),
    (Joint::LeftEyeInner, Joint::LeftEye),
    (Joint::LeftEye, Joint::LeftEyeOuter),
    (Joint::LeftEyeOuter, Joint::LeftEar),
    (Joint::Nose, Joint::RightEyeInner),
    (Joint::RightEyeInner, Joint::RightEye),
    (Joint::RightEye, Joint::RightEyeOuter),
    (Joint::RightEyeOuter, Joint::RightEar),
    (Joint::MouthLeft, Joint::MouthRight),
    // Arms
    (Joint::LeftShoulder, Joint::RightShoulder),
    (Joint::LeftShoulder, Joint::LeftElbow),
    (Joint::LeftElbow, Joint::LeftWrist),
    (Joint::LeftWrist, Joint::LeftPinky),
    (Joint::LeftWrist, Joint::LeftIndex),
    (Joint::LeftWrist, Joint::LeftThumb),
    (Joint::LeftPinky, Joint::LeftIndex),
    (Joint::RightShoulder, Joint::RightElbow),
    (Joint::RightElbow, Joint::RightWrist),
    (Joint::RightWrist, Joint::RightPinky),
    (Joint::RightWrist, Joint::RightIndex),
    (Joint::RightWrist, Joint::RightThumb),
    (Joint::RightPinky, Joint::RightIndex),
    // Torso
    (Joint::LeftShoulder, Joint::LeftHip),
    (Joint::RightShoulder, Joint::RightHip),
    (Joint::LeftHip, Joint::RightHip),
    // Legs
    (Joint::LeftHip, Joint::LeftKnee),
    (Joint::LeftKnee, Joint::LeftAnkle),
    (Joint::RightHip, Joint::RightKnee),
    (Joint::RightKnee, Joint::RightAnkle),
    (Joint::LeftAnkle, Joint::LeftHeel),
    (Joint::LeftHeel, Joint::LeftFootIndex),
    (Joint::LeftAnkle, Joint::LeftFootIndex),
    (Joint::RightAnkle, Joint::RightHeel),
    (Joint::RightHeel, Joint::RightFootIndex),
    (Joint::RightAnkle, Joint::RightFootIndex),
];

/// One joint observation. x/y are normalized to the frame (roughly [0,1]);
/// z is a capability-scaled depth estimate, not metric; visibility is a
/// confidence score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub visibility: f32,
}

/// All joint slots for one detected person. Always exactly JOINT_COUNT
/// entries; a joint the capability produced no data for is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseLandmarks {
    points: [Option<LandmarkPoint>; JOINT_COUNT],
}

impl PoseLandmarks {
    pub fn new(points: [Option<LandmarkPoint>; JOINT_COUNT]) -> Self {
        Self { points }
    }

    /// Build from an index-ordered sequence. Entries past JOINT_COUNT are
    /// ignored; trailing slots of a short sequence stay `None`.
    pub fn from_ordered<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Option<LandmarkPoint>>,
    {
        let mut points = [None; JOINT_COUNT];
        for (slot, point) in points.iter_mut().zip(iter) {
            *slot = point;
        }
        Self { points }
    }

    pub fn get(&self, joint: Joint) -> Option<LandmarkPoint> {
        self.points[joint.index()]
    }

    /// Joint observations in index order
    pub fn iter(&self) -> impl Iterator<Item = Option<LandmarkPoint>> + '_ {
        self.points.iter().copied()
    }

    /// Mean visibility over populated joints; 0.0 when nothing is populated
    pub fn mean_visibility(&self) -> f32 {
        let mut sum = 0.0;
        let mut count = 0u32;
        for point in self.points.iter().flatten() {
            sum += point.visibility;
            count += 1;
        }
        if count == 0 {
            0.0
        } else {
            sum / count as f32
        }
    }
}

/// The per-frame detection outcome: no person, or one person's joint slots
#[derive(Debug, Clone, PartialEq)]
pub enum LandmarkRecord {
    Absent,
    Present(PoseLandmarks),
}

impl LandmarkRecord {
    pub fn is_absent(&self) -> bool {
        matches!(self, LandmarkRecord::Absent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_ordering_is_dense() {
        for (i, joint) in Joint::ALL.iter().enumerate() {
            assert_eq!(joint.index(), i, "Joint::ALL must be in index order");
        }
        assert_eq!(Joint::ALL.len(), JOINT_COUNT);
    }

    #[test]
    fn test_connections_reference_valid_joints() {
        for (a, b) in SKELETON_CONNECTIONS {
            assert!(a.index() < JOINT_COUNT);
            assert!(b.index() < JOINT_COUNT);
            assert_ne!(a, b, "degenerate connection");
        }
    }

    #[test]
    fn test_from_ordered_truncates_long_input() {
        let point = LandmarkPoint {
            x: 0.5,
            y: 0.5,
            z: 0.0,
            visibility: 1.0,
        };
        let landmarks = PoseLandmarks::from_ordered((0..50).map(|_| Some(point)));
        assert_eq!(landmarks.iter().count(), JOINT_COUNT);
        assert!(landmarks.iter().all(|p| p.is_some()));
    }

    #[test]
    fn test_from_ordered_pads_short_input() {
        let point = LandmarkPoint {
            x: 0.1,
            y: 0.2,
            z: 0.0,
            visibility: 0.9,
        };
        let landmarks = PoseLandmarks::from_ordered(vec![Some(point), None, Some(point)]);
        assert_eq!(landmarks.iter().count(), JOINT_COUNT);
        assert_eq!(landmarks.get(Joint::Nose), Some(point));
        assert_eq!(landmarks.get(Joint::LeftEyeInner), None);
        assert_eq!(landmarks.get(Joint::LeftEye), Some(point));
        // Everything past the supplied entries stays the no-data sentinel
        assert_eq!(landmarks.get(Joint::RightFootIndex), None);
    }

    #[test]
    fn test_mean_visibility() {
        let p = |v: f32| {
            Some(LandmarkPoint {
                x: 0.0,
                y: 0.0,
                z: 0.0,
                visibility: v,
            })
        };
        let landmarks = PoseLandmarks::from_ordered(vec![p(0.2), None, p(0.8)]);
        assert!((landmarks.mean_visibility() - 0.5).abs() < 1e-6);

        let empty = PoseLandmarks::from_ordered(std::iter::empty());
        assert_eq!(empty.mean_visibility(), 0.0);
    }
}
