use crate::digi::Digi;
use crate::gen::Positive;
use crate::hit::Hit;
use bon::Builder;

/// Parameters of the [`Clusterizer`] of a single diamond.
#[derive(Builder, Clone, Copy, Debug, PartialEq)]
pub struct ClusterizerPars {
    /// Address stamped onto every produced hit.
    address: u32,
    /// Maximum time distance between two digis to be merged into one hit.
    max_time_dist: Positive<f64>,
    /// Time resolution of a single channel. Used as the time error of
    /// single-digi hits.
    time_res: Positive<f64>,
    /// Bit `n` is set if channel `n` is dead.
    #[builder(default)]
    dead_strips: u32,
}

impl ClusterizerPars {
    pub fn address(&self) -> u32 {
        self.address
    }
    pub fn max_time_dist(&self) -> f64 {
        *self.max_time_dist.inner()
    }
    pub fn time_res(&self) -> f64 {
        *self.time_res.inner()
    }
    pub fn dead_strips(&self) -> u32 {
        self.dead_strips
    }
}

/// Output of [`Clusterizer::clusterize`].
///
/// `digi_indices[i]` is the index (as provided in the input) of the first digi
/// contributing to `hits[i]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClusterizerOutput {
    pub hits: Vec<Hit>,
    pub digi_indices: Vec<u32>,
}

/// Greedy time/channel clusterizer.
///
/// Two consecutive digis are merged into a single hit if they are closer in
/// time than the maximum time distance and sit on neighbouring channels. Every
/// other digi becomes a single-digi hit.
#[derive(Clone, Copy, Debug)]
pub struct Clusterizer {
    pars: ClusterizerPars,
}

impl Clusterizer {
    pub fn new(pars: ClusterizerPars) -> Self {
        Self { pars }
    }

    pub fn pars(&self) -> &ClusterizerPars {
        &self.pars
    }

    /// Returns `false` if the digi is on a channel flagged as dead.
    ///
    /// Channels beyond the width of the bitmask are never dead.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bmon::address::Address;
    /// # use bmon::gen::Positive;
    /// use bmon::clusterizer::{Clusterizer, ClusterizerPars};
    /// use bmon::digi::Digi;
    ///
    /// let clusterizer = Clusterizer::new(
    ///     ClusterizerPars::builder()
    ///         .address(0)
    ///         .max_time_dist(Positive::new(1.0).unwrap())
    ///         .time_res(Positive::new(0.08).unwrap())
    ///         .dead_strips(0b100)
    ///         .build(),
    /// );
    /// let dead = Address::builder().channel(2).build();
    /// let alive = Address::builder().channel(3).build();
    ///
    /// assert!(!clusterizer.select_digi(&Digi::new(dead.raw(), 0.0, 1.0)));
    /// assert!(clusterizer.select_digi(&Digi::new(alive.raw(), 0.0, 1.0)));
    /// ```
    pub fn select_digi(&self, digi: &Digi) -> bool {
        let is_dead = 1u32
            .checked_shl(digi.channel())
            .is_some_and(|bit| self.pars.dead_strips & bit != 0);

        !is_dead
    }

    /// Builds hits out of digis sorted by time.
    ///
    /// Each element of the input is a digi together with an index that is
    /// forwarded to [`ClusterizerOutput::digi_indices`]. Every digi ends up in
    /// exactly one hit.
    ///
    /// Pairing is strictly left to right and only ever looks one digi ahead:
    /// three consecutive digis that could all be merged produce a two-digi hit
    /// out of the first two and a single-digi hit out of the third.
    ///
    /// The input must be sorted by time. This is not checked (outside of debug
    /// builds); unsorted input silently produces meaningless hits.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bmon::address::Address;
    /// # use bmon::gen::Positive;
    /// use bmon::clusterizer::{Clusterizer, ClusterizerPars};
    /// use bmon::digi::Digi;
    ///
    /// let clusterizer = Clusterizer::new(
    ///     ClusterizerPars::builder()
    ///         .address(0)
    ///         .max_time_dist(Positive::new(1.0).unwrap())
    ///         .time_res(Positive::new(0.08).unwrap())
    ///         .build(),
    /// );
    /// let ch = |c| Address::builder().channel(c).build().raw();
    /// let digis = [
    ///     (Digi::new(ch(5), 0.0, 10.0), 0),
    ///     (Digi::new(ch(6), 0.3, 10.0), 1),
    ///     (Digi::new(ch(9), 0.4, 5.0), 2),
    /// ];
    ///
    /// let output = clusterizer.clusterize(&digis);
    /// assert_eq!(output.hits.len(), 2);
    /// assert!((output.hits[0].time - 0.15).abs() < 1e-12);
    /// assert_eq!(output.hits[1].time, 0.4);
    /// assert_eq!(output.digi_indices, vec![0, 2]);
    /// ```
    pub fn clusterize(&self, digis: &[(Digi, u32)]) -> ClusterizerOutput {
        debug_assert!(
            digis.windows(2).all(|w| w[0].0.time <= w[1].0.time),
            "digis are not sorted by time"
        );

        let mut output = ClusterizerOutput::default();
        let Some(((last, last_index), rest)) = digis.split_last() else {
            return output;
        };
        output.hits.reserve(digis.len());
        output.digi_indices.reserve(digis.len());

        let address = self.pars.address;
        let max_time_dist = self.pars.max_time_dist();
        let time_res = self.pars.time_res();

        let mut used_with_previous = false;
        for (i, (digi, index)) in rest.iter().enumerate() {
            if used_with_previous {
                used_with_previous = false;
                continue;
            }
            // `rest` is one element shorter than `digis`.
            let next = &digis[i + 1].0;

            if next.time - digi.time < max_time_dist
                && next.channel().abs_diff(digi.channel()) == 1
            {
                output.hits.push(Hit::from_digi_pair(address, digi, next));
                used_with_previous = true;
            } else {
                output.hits.push(Hit::from_digi(address, digi, time_res));
            }
            output.digi_indices.push(*index);
        }

        if !used_with_previous {
            output.hits.push(Hit::from_digi(address, last, time_res));
            output.digi_indices.push(*last_index);
        }

        output
    }
}
