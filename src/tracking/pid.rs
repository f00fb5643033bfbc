/// Proportional, integral and derivative gains of one control axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    pub p: f32,
    /// Carried for completeness; no controller in this crate accumulates an integral term.
    pub i: f32,
    pub d: f32,
}

impl PidGains {
    pub const fn new(p: f32, i: f32, d: f32) -> Self {
        Self { p, i, d }
    }

    /// Returns the gains multiplied by `factor`.
    pub fn scaled(self, factor: f32) -> Self {
        Self {
            p: self.p * factor,
            i: self.i * factor,
            d: self.d * factor,
        }
    }
}

/// A discrete PD controller with symmetric output saturation.
///
/// ```text
/// output = clamp(Kp·e + Kd·(e − e_prev), −limit, limit)
/// ```
///
/// The clamped output is truncated toward zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdAxis {
    pub gains: PidGains,
    pub limit: i32,
}

impl PdAxis {
    pub const fn new(gains: PidGains, limit: i32) -> Self {
        Self { gains, limit }
    }

    pub fn output(&self, error: f32, previous: f32) -> i32 {
        let raw = self.gains.p * error + self.gains.d * (error - previous);
        let limit = self.limit as f32;
        // NaN saturates to 0 in the cast
        raw.clamp(-limit, limit) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AXIS: PdAxis = PdAxis::new(PidGains::new(0.15, 0.0, 0.15), 50);

    #[test]
    fn proportional_and_derivative() {
        // 0.15·100 + 0.15·(100 − 40) = 24
        assert_eq!(AXIS.output(100.0, 40.0), 24);
        assert_eq!(AXIS.output(0.0, 0.0), 0);
    }

    #[test]
    fn truncates_toward_zero() {
        // 0.15·10 = 1.5
        assert_eq!(AXIS.output(10.0, 10.0), 1);
        assert_eq!(AXIS.output(-10.0, -10.0), -1);
    }

    #[test]
    fn saturates_at_limit() {
        assert_eq!(AXIS.output(640.0, 0.0), 50);
        assert_eq!(AXIS.output(-640.0, 0.0), -50);
        assert_eq!(AXIS.output(-640.0, -640.0), -50);
    }

    #[test]
    fn integral_gain_is_ignored() {
        let with_i = PdAxis::new(PidGains::new(0.15, 10.0, 0.15), 50);
        assert_eq!(with_i.output(100.0, 40.0), AXIS.output(100.0, 40.0));
    }

    #[test]
    fn scaled_gains() {
        let gains = PidGains::new(0.15, 0.1, 0.15).scaled(2.0);
        assert_eq!(gains, PidGains::new(0.3, 0.2, 0.3));
    }
}
