use anyhow::{Context, Result};
use bmon::address::Address;
use bmon::clusterizer::ClusterizerPars;
use bmon::digi::Digi;
use bmon::gen::{DigiGenerator, Positive};
use bmon::hitfind::Hitfind;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp, Uniform};

const NOF_CHANNELS: u32 = 16;

fn diamond(sm: u32) -> Address {
    Address::builder().sm(sm).sm_type(5).build()
}

// One diamond worth of digis with Poisson arrival times (rate in 1/ns).
fn diamond_digis(sm: u32, rate: f64, duration: f64, seed: u64) -> Result<Vec<Digi>> {
    let exp = Exp::new(rate).context("failed to create exponential distribution")?;
    let channels = Uniform::new(0, NOF_CHANNELS).context("invalid channel range")?;
    let charges = Uniform::new(0.5f32, 20.0).context("invalid charge range")?;

    let digis = DigiGenerator::builder()
        .diamond(diamond(sm))
        .duration(Positive::new(duration).context("duration must be positive")?)
        .inter_arrival_time(
            exp.sample_iter(StdRng::seed_from_u64(seed))
                .filter_map(Positive::new),
        )
        .channel(channels.sample_iter(StdRng::seed_from_u64(seed + 1)))
        .charge(charges.sample_iter(StdRng::seed_from_u64(seed + 2)))
        .build()
        .collect();

    Ok(digis)
}

fn hitfind() -> Result<Hitfind> {
    let mut builder = Hitfind::builder();
    for sm in 0..3 {
        builder = builder.add_diamond(
            ClusterizerPars::builder()
                .address(diamond(sm).raw())
                .max_time_dist(Positive::new(1.0).context("max time dist")?)
                .time_res(Positive::new(0.08).context("time res")?)
                .dead_strips(if sm == 1 { 0b1000_0001 } else { 0 })
                .build(),
        );
    }

    Ok(builder.build()?)
}

// Digis of all diamonds interleaved in time, as they come out of unpacking.
fn timeslice() -> Result<Vec<Digi>> {
    let mut digis = Vec::new();
    for sm in 0..3 {
        digis.extend(diamond_digis(sm, 0.5, 10_000.0, 100 * u64::from(sm))?);
    }
    // Noise from a diamond that is not part of the setup.
    digis.extend(diamond_digis(7, 0.01, 10_000.0, 999)?);
    digis.sort_by(|a, b| a.time.total_cmp(&b.time));

    Ok(digis)
}

#[test]
fn timeslice_digi_accounting() -> Result<()> {
    let digis = timeslice()?;
    let (output, monitor) = hitfind()?.run(&digis);

    assert_eq!(monitor.nof_digis, digis.len());
    assert!(monitor.nof_unknown_digis > 0);
    assert!(monitor.nof_dead_digis > 0);
    assert!(monitor.nof_two_digi_hits > 0);

    let nof_clustered: usize = output
        .hits()
        .map(|h| usize::from(h.nof_channels))
        .sum();
    assert_eq!(
        nof_clustered + monitor.nof_dead_digis + monitor.nof_unknown_digis,
        digis.len()
    );
    assert_eq!(monitor.nof_hits, output.nof_hits());

    Ok(())
}

#[test]
fn timeslice_partitions() -> Result<()> {
    let digis = timeslice()?;
    let (output, _) = hitfind()?.run(&digis);

    assert_eq!(output.partitions.len(), 3);
    for (sm, partition) in (0..).zip(&output.partitions) {
        assert_eq!(partition.address, diamond(sm).raw());
        assert_eq!(partition.hits.len(), partition.digi_indices.len());
        assert!(partition.hits.iter().all(|h| h.address == partition.address));
        assert!(partition
            .hits
            .windows(2)
            .all(|w| w[0].time <= w[1].time + 1e-9));

        for (hit, &index) in partition.hits.iter().zip(&partition.digi_indices) {
            let digi = digis[index as usize];
            assert_eq!(
                digi.address & Address::DIAMOND_MASK,
                partition.address & Address::DIAMOND_MASK
            );
            if hit.nof_channels == 1 {
                assert_eq!(hit.time, digi.time);
            }
        }
    }

    // Dead channels of diamond 1 never start a hit.
    for &index in &output.partitions[1].digi_indices {
        let channel = digis[index as usize].channel();
        assert!(channel != 0 && channel != 7);
    }

    Ok(())
}

#[test]
fn timeslice_unsorted_input() -> Result<()> {
    let digis = timeslice()?;
    let hitfind = hitfind()?;
    let (sorted, _) = hitfind.run(&digis);

    let reversed = digis.iter().rev().copied().collect::<Vec<_>>();
    let (output, _) = hitfind.run(&reversed);

    assert_eq!(
        output.hits().map(|h| h.time).collect::<Vec<_>>(),
        sorted.hits().map(|h| h.time).collect::<Vec<_>>()
    );

    Ok(())
}
