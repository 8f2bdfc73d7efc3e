//! Local reconstruction of the BMON (beam monitor) diamond detector.
//!
//! Digis of a time-slice are distributed to the diamonds they belong to and
//! clustered into hits: two digis on neighbouring channels that are close in
//! time form a single hit, every other digi becomes a hit on its own.
use crate::digi::Digi;
use crate::hit::Hit;

/// Detector address bit layout.
pub mod address;
/// Greedy time/channel clusterizer of a single diamond.
pub mod clusterizer;
pub mod digi;
/// Utilities to generate input data for the hit finder.
pub mod gen;
pub mod hit;
/// Hit finder for all diamonds of the detector.
pub mod hitfind;
/// Text configuration of the hit finder.
pub mod setup;

/// A trait that defines the interface for an observer of the hit finder.
///
/// The default implementation of all methods is a no-op. Users are expected to
/// override the methods they are interested in.
#[allow(unused_variables)]
pub trait Observer {
    /// Called for every input [`Digi`], before it is assigned to a diamond.
    fn on_digi(&mut self, digi: &Digi) {}
    /// Called when a [`Digi`] does not belong to any configured diamond.
    fn on_unknown_address(&mut self, digi: &Digi) {}
    /// Called when a [`Digi`] is discarded because its channel is dead.
    fn on_dead_digi(&mut self, digi: &Digi) {}
    /// Called for every [`Hit`] produced.
    fn on_hit(&mut self, hit: &Hit) {}
}

impl Observer for () {}

#[cfg(test)]
mod tests {
    use super::*;
    use address::Address;
    use gen::Positive;
    use hitfind::Hitfind;
    use setup::HitfindSetup;
    use std::str::FromStr;

    #[derive(Default)]
    struct TestObserver {
        digis: Vec<Digi>,
        unknown: Vec<Digi>,
        dead: Vec<Digi>,
        hits: Vec<Hit>,
    }

    impl Observer for TestObserver {
        fn on_digi(&mut self, digi: &Digi) {
            self.digis.push(*digi);
        }

        fn on_unknown_address(&mut self, digi: &Digi) {
            self.unknown.push(*digi);
        }

        fn on_dead_digi(&mut self, digi: &Digi) {
            self.dead.push(*digi);
        }

        fn on_hit(&mut self, hit: &Hit) {
            self.hits.push(*hit);
        }
    }

    fn channel(c: u32) -> u32 {
        Address::builder().sm_type(5).channel(c).build().raw()
    }

    #[test]
    fn observer_sees_everything() {
        let setup = HitfindSetup::from_str(
            "address=0x00002806 dead_strips=0x00000004 time_res=0.08 max_time_dist=1",
        )
        .unwrap();
        let hitfind = Hitfind::from_setup(&setup).unwrap();
        let digis = [
            Digi::new(channel(0), 0.0, 1.0),
            Digi::new(channel(1), 0.5, 1.0),
            Digi::new(channel(2), 0.6, 1.0),
            Digi::new(Address::builder().sm(9).build().raw(), 0.7, 1.0),
            Digi::new(channel(3), 0.8, 1.0),
        ];

        let mut observer = TestObserver::default();
        let output = hitfind.process(&digis, &mut observer);

        assert_eq!(observer.digis, digis);
        assert_eq!(observer.dead, vec![digis[2]]);
        assert_eq!(observer.unknown, vec![digis[3]]);
        assert_eq!(observer.hits, output.hits().copied().collect::<Vec<_>>());
        assert_eq!(
            observer
                .hits
                .iter()
                .map(|h| h.nof_channels)
                .collect::<Vec<_>>(),
            vec![2, 1]
        );
    }

    #[test]
    fn worked_example() {
        let hitfind = Hitfind::builder()
            .add_diamond(
                clusterizer::ClusterizerPars::builder()
                    .address(channel(0))
                    .max_time_dist(Positive::new(1.0).unwrap())
                    .time_res(Positive::new(0.08).unwrap())
                    .build(),
            )
            .build()
            .unwrap();
        let digis = [
            Digi::new(channel(5), 0.0, 10.0),
            Digi::new(channel(6), 0.3, 10.0),
            Digi::new(channel(9), 0.4, 5.0),
        ];

        let output = hitfind.process(&digis, &mut ());
        let hits = output.hits().collect::<Vec<_>>();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].nof_channels, 2);
        assert!((hits[0].time - 0.15).abs() < 1e-12);
        assert_eq!(hits[1].nof_channels, 1);
        assert_eq!(hits[1].time, 0.4);
        assert_eq!(output.partitions[0].digi_indices, vec![0, 2]);
    }
}
