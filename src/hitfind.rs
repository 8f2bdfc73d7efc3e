use crate::address::Address;
use crate::clusterizer::{Clusterizer, ClusterizerPars};
use crate::digi::Digi;
use crate::hit::Hit;
use crate::setup::{HitfindSetup, SetupError};
use crate::Observer;
use bon::bon;
use std::collections::HashMap;
use std::fmt;

/// Hits of a single diamond.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Partition {
    /// Address of the diamond.
    pub address: u32,
    pub hits: Vec<Hit>,
    /// Index in the input time-slice of the first digi of each hit.
    pub digi_indices: Vec<u32>,
}

/// Output of [`Hitfind::process`]: one partition per configured diamond, in
/// configuration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HitfindOutput {
    pub partitions: Vec<Partition>,
}

impl HitfindOutput {
    /// Iterator over the hits of all diamonds.
    pub fn hits(&self) -> impl Iterator<Item = &Hit> {
        self.partitions.iter().flat_map(|p| p.hits.iter())
    }
    pub fn nof_hits(&self) -> usize {
        self.partitions.iter().map(|p| p.hits.len()).sum()
    }
}

/// Counters collected while processing a time-slice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HitfindMonitorData {
    /// Digis given as input.
    pub nof_digis: usize,
    /// Digis discarded because their channel is dead.
    pub nof_dead_digis: usize,
    /// Digis discarded because they belong to no configured diamond.
    pub nof_unknown_digis: usize,
    pub nof_hits: usize,
    pub nof_two_digi_hits: usize,
}

impl Observer for HitfindMonitorData {
    fn on_digi(&mut self, _: &Digi) {
        self.nof_digis += 1;
    }
    fn on_unknown_address(&mut self, _: &Digi) {
        self.nof_unknown_digis += 1;
    }
    fn on_dead_digi(&mut self, _: &Digi) {
        self.nof_dead_digis += 1;
    }
    fn on_hit(&mut self, hit: &Hit) {
        self.nof_hits += 1;
        if hit.nof_channels == 2 {
            self.nof_two_digi_hits += 1;
        }
    }
}

impl fmt::Display for HitfindMonitorData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "digis: {} (dead {}, unknown {}), hits: {} (two-digi {})",
            self.nof_digis,
            self.nof_dead_digis,
            self.nof_unknown_digis,
            self.nof_hits,
            self.nof_two_digi_hits
        )
    }
}

/// BMON hit finder.
///
/// Distributes the digis of a time-slice to the diamonds they belong to and
/// runs one [`Clusterizer`] per diamond.
#[derive(Clone, Debug)]
pub struct Hitfind {
    selection_mask: u32,
    clusterizers: Vec<Clusterizer>,
    // Masked diamond address -> index into `clusterizers`.
    lookup: HashMap<u32, usize>,
}

#[bon]
impl Hitfind {
    /// Diamonds are identified by `address & selection_mask`; two diamonds
    /// with the same masked address are rejected.
    #[builder]
    pub fn new(
        #[builder(field)] diamonds: Vec<ClusterizerPars>,
        #[builder(default = Address::DIAMOND_MASK)] selection_mask: u32,
    ) -> Result<Self, SetupError> {
        let mut lookup = HashMap::with_capacity(diamonds.len());
        for (index, pars) in diamonds.iter().enumerate() {
            let key = pars.address() & selection_mask;
            if lookup.insert(key, index).is_some() {
                return Err(SetupError::DuplicateDiamond(pars.address()));
            }
        }
        log::debug!(
            "BMON hit finder with {} diamonds, selection mask 0x{selection_mask:08x}",
            diamonds.len()
        );
        for pars in &diamonds {
            log::debug!(
                "  diamond {}: max time dist {} ns, time res {} ns, dead strips 0x{:08x}",
                Address::from(pars.address()),
                pars.max_time_dist(),
                pars.time_res(),
                pars.dead_strips()
            );
        }

        Ok(Self {
            selection_mask,
            clusterizers: diamonds.into_iter().map(Clusterizer::new).collect(),
            lookup,
        })
    }
}

impl<S: hitfind_builder::State> HitfindBuilder<S> {
    /// Add a diamond to the [`Hitfind`].
    pub fn add_diamond(mut self, pars: ClusterizerPars) -> Self {
        self.diamonds.push(pars);
        self
    }
}

impl Hitfind {
    /// Build a hit finder with one clusterizer per diamond of the setup.
    pub fn from_setup(setup: &HitfindSetup) -> Result<Self, SetupError> {
        setup
            .diamonds()
            .iter()
            .fold(Self::builder(), |builder, pars| builder.add_diamond(*pars))
            .build()
    }

    pub fn selection_mask(&self) -> u32 {
        self.selection_mask
    }

    pub fn clusterizers(&self) -> &[Clusterizer] {
        &self.clusterizers
    }

    /// Find the hits of a time-slice.
    ///
    /// Digis do not need to be sorted; each diamond's digis are sorted by time
    /// (stable) before clustering. Indices in the output refer to positions in
    /// `digis`.
    pub fn process<O>(&self, digis: &[Digi], observer: &mut O) -> HitfindOutput
    where
        O: Observer,
    {
        let mut buffers = vec![Vec::new(); self.clusterizers.len()];
        let mut nof_unknown = 0usize;

        for (digi, index) in digis.iter().zip(0u32..) {
            observer.on_digi(digi);

            let Some(&diamond) = self.lookup.get(&(digi.address & self.selection_mask)) else {
                observer.on_unknown_address(digi);
                nof_unknown += 1;
                continue;
            };
            if !self.clusterizers[diamond].select_digi(digi) {
                observer.on_dead_digi(digi);
                continue;
            }
            buffers[diamond].push((*digi, index));
        }
        if nof_unknown > 0 {
            log::warn!("{nof_unknown} BMON digis with unknown diamond address");
        }

        let partitions = self
            .clusterizers
            .iter()
            .zip(buffers)
            .map(|(clusterizer, mut buffer)| {
                buffer.sort_by(|a, b| a.0.time.total_cmp(&b.0.time));
                let output = clusterizer.clusterize(&buffer);
                for hit in &output.hits {
                    observer.on_hit(hit);
                }

                Partition {
                    address: clusterizer.pars().address(),
                    hits: output.hits,
                    digi_indices: output.digi_indices,
                }
            })
            .collect::<Vec<_>>();

        log::trace!(
            "BMON hit finder: {} digis in, {} hits out",
            digis.len(),
            partitions.iter().map(|p| p.hits.len()).sum::<usize>()
        );

        HitfindOutput { partitions }
    }

    /// Same as [`Hitfind::process`], collecting [`HitfindMonitorData`] along
    /// the way.
    pub fn run(&self, digis: &[Digi]) -> (HitfindOutput, HitfindMonitorData) {
        let mut monitor = HitfindMonitorData::default();
        let output = self.process(digis, &mut monitor);

        (output, monitor)
    }
}
