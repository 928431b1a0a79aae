use crate::foundation::math::rotation_angle;

/// One rotated frame of a revolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationStep {
    /// 0-based loop index.
    pub index: u32,
    /// Rotation applied to the rotor copy, in radians.
    pub angle: f64,
}

/// The angles a `steps`-frame revolution rotates through.
///
/// Frame 0 is the unrotated base frame, so only `steps - 1` rotated steps exist; a step count
/// below 2 yields none.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RotationSchedule {
    steps: i32,
}

impl RotationSchedule {
    /// Schedule for `steps` frames. Any value is accepted.
    pub fn new(steps: i32) -> Self {
        Self { steps }
    }

    /// Requested frame count.
    pub fn steps(self) -> i32 {
        self.steps
    }

    /// Number of copy/rotate/merge cycles: `max(steps - 1, 0)`.
    pub fn cycles(self) -> u32 {
        u32::try_from(self.steps.saturating_sub(1)).unwrap_or(0)
    }

    /// Rotated steps in order.
    pub fn iter(self) -> impl Iterator<Item = RotationStep> {
        (0..self.cycles()).map(move |index| RotationStep {
            index,
            angle: rotation_angle(index, self.steps),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/schedule.rs"]
mod tests;
