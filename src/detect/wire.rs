// Detector wire format: normalization of both historical reply shapes into
// the uniform landmark record. Nothing outside this module sees raw replies.

use serde::Deserialize;

use crate::config::SubjectPolicy;
use crate::landmarks::{LandmarkPoint, LandmarkRecord, PoseLandmarks};

/// One landmark observation as the detector reports it. `null` entries in
/// the landmark list mean the detector produced no data for that slot.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WireLandmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    #[serde(default)]
    pub visibility: Option<f32>,
    #[serde(default)]
    pub presence: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct WirePerson {
    pub landmarks: Vec<Option<WireLandmark>>,
}

#[derive(Debug, Deserialize)]
pub struct StructuredReply {
    pub people: Vec<WirePerson>,
}

/// The capability has shipped two reply shapes over its lifetime: a
/// structured container of per-person landmark lists, and an older bare
/// landmark array covering at most one person. Both decode here; each
/// variant has its own conversion below.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DetectorReply {
    Structured(StructuredReply),
    Flat(Vec<Option<WireLandmark>>),
}

impl WireLandmark {
    fn into_point(self) -> LandmarkPoint {
        LandmarkPoint {
            x: self.x,
            y: self.y,
            z: self.z,
            // Older detector builds report presence instead of visibility
            visibility: self.visibility.or(self.presence).unwrap_or(0.0),
        }
    }
}

/// Normalize a decoded reply into the landmark record, applying the subject
/// policy when more than one person is reported.
pub fn normalize(reply: DetectorReply, policy: SubjectPolicy) -> LandmarkRecord {
    let people: Vec<PoseLandmarks> = match reply {
        DetectorReply::Flat(landmarks) => {
            if landmarks.is_empty() {
                return LandmarkRecord::Absent;
            }
            vec![convert_person(landmarks)]
        }
        DetectorReply::Structured(reply) => reply
            .people
            .into_iter()
            .map(|person| convert_person(person.landmarks))
            .collect(),
    };

    if people.is_empty() {
        return LandmarkRecord::Absent;
    }

    let subject = match policy {
        SubjectPolicy::First => people.into_iter().next().unwrap(),
        SubjectPolicy::BestPresence => people
            .into_iter()
            .max_by(|a, b| {
                a.mean_visibility()
                    .partial_cmp(&b.mean_visibility())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap(),
    };

    LandmarkRecord::Present(subject)
}

fn convert_person(landmarks: Vec<Option<WireLandmark>>) -> PoseLandmarks {
    PoseLandmarks::from_ordered(landmarks.into_iter().map(|lm| lm.map(WireLandmark::into_point)))
}
