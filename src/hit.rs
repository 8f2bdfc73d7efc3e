use crate::digi::Digi;

/// A time measurement reconstructed from one or two digis of a diamond.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    /// Address of the diamond (not of the individual channels).
    pub address: u32,
    /// Hit time [ns].
    pub time: f64,
    /// Hit time uncertainty [ns].
    pub time_error: f64,
    /// Number of channels contributing to the hit (1 or 2).
    pub nof_channels: u8,
}

impl Hit {
    /// Creates a hit from a single digi. The time error is the time
    /// resolution of the diamond.
    pub fn from_digi(address: u32, digi: &Digi, time_res: f64) -> Self {
        Self {
            address,
            time: digi.time,
            time_error: time_res,
            nof_channels: 1,
        }
    }
    /// Creates a hit from two digis on neighbouring channels.
    ///
    /// The time is the charge-weighted mean of both digi times. If both
    /// charges are zero the plain mean is used instead.
    ///
    /// The time error is always `0.0`: there is no error model for two-digi
    /// hits yet.
    ///
    /// # Examples
    ///
    /// ```
    /// use bmon::digi::Digi;
    /// use bmon::hit::Hit;
    ///
    /// let left = Digi::new(0, 10.0, 3.0);
    /// let right = Digi::new(0, 14.0, 1.0);
    /// let hit = Hit::from_digi_pair(0, &left, &right);
    /// assert_eq!(hit.time, 11.0);
    /// assert_eq!(hit.nof_channels, 2);
    /// ```
    pub fn from_digi_pair(address: u32, left: &Digi, right: &Digi) -> Self {
        let (q_left, q_right) = (f64::from(left.charge), f64::from(right.charge));
        let weights = q_left + q_right;
        let time = if weights == 0.0 {
            0.5 * (left.time + right.time)
        } else {
            (left.time * q_left + right.time * q_right) / weights
        };

        Self {
            address,
            time,
            time_error: 0.0,
            nof_channels: 2,
        }
    }
}
