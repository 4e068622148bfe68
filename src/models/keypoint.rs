use serde::{Deserialize, Serialize};

/// Flat tuple form of a keypoint: `(x, y, size, angle, response, octave, class_id)`
pub type KeypointTuple = (f32, f32, f32, f32, f32, i32, i32);

/// Scale-invariant interest point
///
/// `octave` packs the pyramid octave in the low byte and the scale layer in
/// the next byte. Serialized in [`KeypointTuple`] form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "KeypointTuple", into = "KeypointTuple")]
pub struct Keypoint {
    /// Column in region coordinates
    pub x: f32,
    /// Row in region coordinates
    pub y: f32,
    /// Diameter of the meaningful neighborhood
    pub size: f32,
    /// Dominant orientation in degrees, [0, 360)
    pub angle: f32,
    /// Detector response (absolute DoG contrast)
    pub response: f32,
    /// Packed octave and layer
    pub octave: i32,
    /// Object class, -1 when unused
    pub class_id: i32,
}

impl Keypoint {
    /// Create a keypoint at (x, y) with the given size and no orientation
    pub fn new(x: f32, y: f32, size: f32) -> Self {
        Self {
            x,
            y,
            size,
            angle: 0.0,
            response: 0.0,
            octave: 0,
            class_id: -1,
        }
    }

    /// Pack octave and layer indices the same way detection does
    pub fn pack_octave(octave: usize, layer: usize) -> i32 {
        (octave as i32 & 0xFF) | ((layer as i32 & 0xFF) << 8)
    }

    /// Unpacked (octave, layer)
    pub fn octave_layer(&self) -> (usize, usize) {
        let octave = (self.octave & 0xFF) as usize;
        let layer = ((self.octave >> 8) & 0xFF) as usize;
        (octave, layer)
    }

    /// Convert to the flat persisted form
    pub fn to_tuple(&self) -> KeypointTuple {
        (
            self.x,
            self.y,
            self.size,
            self.angle,
            self.response,
            self.octave,
            self.class_id,
        )
    }

    /// Rebuild from the flat persisted form
    pub fn from_tuple(t: KeypointTuple) -> Self {
        Self {
            x: t.0,
            y: t.1,
            size: t.2,
            angle: t.3,
            response: t.4,
            octave: t.5,
            class_id: t.6,
        }
    }
}

impl From<KeypointTuple> for Keypoint {
    fn from(t: KeypointTuple) -> Self {
        Self::from_tuple(t)
    }
}

impl From<Keypoint> for KeypointTuple {
    fn from(kp: Keypoint) -> Self {
        kp.to_tuple()
    }
}
