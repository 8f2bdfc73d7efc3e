use crate::address::Address;
use crate::digi::Digi;
use bon::bon;
use num_traits::Zero;

/// A strictly positive value.
///
/// Used for durations and clusterizer parameters where zero or negative values
/// make no sense.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Positive<T>(T);

impl<T> Positive<T>
where
    T: Zero + PartialOrd,
{
    /// Returns `None` if `value` is not strictly greater than zero (this
    /// includes `NaN`).
    ///
    /// # Examples
    ///
    /// ```
    /// use bmon::gen::Positive;
    ///
    /// assert!(Positive::new(1.0).is_some());
    /// assert!(Positive::new(0.0).is_none());
    /// assert!(Positive::new(f64::NAN).is_none());
    /// ```
    pub fn new(value: T) -> Option<Self> {
        if value > T::zero() {
            Some(Self(value))
        } else {
            None
        }
    }
}

impl<T> Positive<T> {
    pub fn inner(&self) -> &T {
        &self.0
    }
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Generator of time-sorted digis for a single diamond.
///
/// Every digi consumes one element of each of the inter-arrival time, channel
/// and charge iterators. The generator is exhausted as soon as any of them is
/// exhausted, or once the next digi would fall after `origin + duration`.
pub struct DigiGenerator {
    diamond: Address,
    time: f64,
    end: Option<f64>,
    inter_arrival_time: Box<dyn Iterator<Item = Positive<f64>>>,
    channel: Box<dyn Iterator<Item = u32>>,
    charge: Box<dyn Iterator<Item = f32>>,
}

#[bon]
impl DigiGenerator {
    #[builder]
    pub fn new<I, C, Q>(
        diamond: Address,
        #[builder(default)] origin: f64,
        duration: Option<Positive<f64>>,
        inter_arrival_time: I,
        channel: C,
        charge: Q,
    ) -> Self
    where
        I: IntoIterator<Item = Positive<f64>>,
        I::IntoIter: 'static,
        C: IntoIterator<Item = u32>,
        C::IntoIter: 'static,
        Q: IntoIterator<Item = f32>,
        Q::IntoIter: 'static,
    {
        Self {
            diamond,
            time: origin,
            end: duration.map(|d| origin + d.into_inner()),
            inter_arrival_time: Box::new(inter_arrival_time.into_iter()),
            channel: Box::new(channel.into_iter()),
            charge: Box::new(charge.into_iter()),
        }
    }
}

impl Iterator for DigiGenerator {
    type Item = Digi;

    fn next(&mut self) -> Option<Self::Item> {
        let delta_t = self.inter_arrival_time.next()?;
        let channel = self.channel.next()?;
        let charge = self.charge.next()?;

        let time = self.time + delta_t.into_inner();
        if self.end.is_some_and(|end| time > end) {
            return None;
        }
        self.time = time;

        Some(Digi::new(
            self.diamond.with_channel(channel).raw(),
            time,
            charge,
        ))
    }
}
