use crate::address::Address;

/// A single channel measurement of a BMON diamond.
///
/// Digis are produced upstream (unpacking or simulation) and are read-only
/// for the rest of the reconstruction of a time-slice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Digi {
    /// Unique channel address.
    pub address: u32,
    /// Time of the measurement [ns].
    pub time: f64,
    /// Measured charge (time over threshold) [a.u.].
    pub charge: f32,
}

impl Digi {
    pub fn new(address: u32, time: f64, charge: f32) -> Self {
        Self {
            address,
            time,
            charge,
        }
    }
    /// Channel number inside the diamond, decoded from the address.
    ///
    /// # Examples
    ///
    /// ```
    /// use bmon::address::Address;
    /// use bmon::digi::Digi;
    ///
    /// let address = Address::builder().sm_type(5).channel(9).build();
    /// let digi = Digi::new(address.raw(), 12.5, 3.0);
    /// assert_eq!(digi.channel(), 9);
    /// ```
    pub fn channel(&self) -> u32 {
        Address::from(self.address).channel()
    }
}
