use glam::Vec2;

/// Device orientation in degrees: `alpha` about Z, `beta` about X, `gamma` about Y.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrientationSample {
    pub alpha: f32,
    pub beta: f32,
    pub gamma: f32,
}

impl OrientationSample {
    pub fn new(alpha: f32, beta: f32, gamma: f32) -> Self {
        Self { alpha, beta, gamma }
    }

    /// Portrait when the device is tilted more front-to-back than sideways.
    pub fn posture(&self) -> Posture {
        if self.beta.abs() > self.gamma.abs() {
            Posture::Portrait
        } else {
            Posture::Landscape
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Posture {
    Portrait,
    Landscape,
}

impl Posture {
    pub fn label(self) -> &'static str {
        match self {
            Posture::Portrait => "portrait",
            Posture::Landscape => "landscape",
        }
    }
}

/// A light-source sample from either input modality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightSample {
    /// Pointer position in viewport coordinates.
    Pointer(Vec2),
    Orientation(OrientationSample),
}

/// One pending slot per modality. A newer sample overwrites an older,
/// unapplied one.
#[derive(Debug, Clone, Default)]
pub struct PendingSamples {
    pointer: Option<Vec2>,
    orientation: Option<OrientationSample>,
    /// Samples overwritten before they were drained.
    coalesced: u64,
}

impl PendingSamples {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: LightSample) {
        let replaced = match sample {
            LightSample::Pointer(p) => self.pointer.replace(p).is_some(),
            LightSample::Orientation(o) => self.orientation.replace(o).is_some(),
        };
        if replaced {
            self.coalesced += 1;
        }
    }

    /// Take both slots, pointer first.
    pub fn drain(&mut self) -> (Option<Vec2>, Option<OrientationSample>) {
        (self.pointer.take(), self.orientation.take())
    }

    pub fn clear(&mut self) {
        self.pointer = None;
        self.orientation = None;
    }

    pub fn is_empty(&self) -> bool {
        self.pointer.is_none() && self.orientation.is_none()
    }

    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}
