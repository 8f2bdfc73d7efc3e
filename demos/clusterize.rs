/// This is a general example of how you would typically set up the BMON hit
/// finder for one time-slice.
use anyhow::{Context, Result};
use bmon::address::Address;
use bmon::digi::Digi;
use bmon::gen::{DigiGenerator, Positive};
use bmon::hitfind::Hitfind;
use bmon::setup::HitfindSetup;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp};
use std::iter::repeat_with;
use std::str::FromStr;
use uom::si::f64::{Frequency, Time};
use uom::si::frequency::hertz;
use uom::si::time::{nanosecond, second};

/// An iterator over the inter-arrival times of a Poisson process.
///
/// Inter-arrival times follow an exponential distribution with the specified
/// rate parameter.
struct PoissonProcess<R> {
    // [`Time`] doesn't implement the `num_traits::Float` trait, so we can't
    // directly sample [`Times`] from the exponential distribution. Instead,
    // we'll sample `f64`s in seconds and convert them before returning to the
    // user.
    exp: Exp<f64>,
    rng: R,
}

impl<R> PoissonProcess<R>
where
    R: Rng,
{
    fn new(rate: Frequency, rng: R) -> Result<Self> {
        let lambda = rate.get::<hertz>();

        Ok(Self {
            exp: Exp::new(lambda).context("failed to create exponential distribution")?,
            rng,
        })
    }
}

impl<R> Iterator for PoissonProcess<R>
where
    R: Rng,
{
    type Item = Time;

    fn next(&mut self) -> Option<Self::Item> {
        Some(Time::new::<second>(self.exp.sample(&mut self.rng)))
    }
}

fn main() -> Result<()> {
    env_logger::init();

    // ===========================================
    // These are most likely your free parameters:
    let duration = Time::new::<nanosecond>(128_000.0);
    let rate_per_diamond = Frequency::new::<hertz>(2.0e8);
    let nof_channels: u32 = 16;
    // ===========================================

    // ===========================================
    // Then, this is your hit finder configuration. Usually read from a file.
    let setup = HitfindSetup::from_str(
        "address=0x00002806 dead_strips=0x00000000 time_res=0.08 max_time_dist=1
address=0x00002816 dead_strips=0x00008000 time_res=0.08 max_time_dist=1",
    )?;
    // ===========================================

    let mut digis: Vec<Digi> = Vec::new();
    for (seed, pars) in (0..).zip(setup.diamonds()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let channels = repeat_with(move || rng.random_range(0..nof_channels));
        let mut rng = StdRng::seed_from_u64(seed + 1000);
        let charges = repeat_with(move || rng.random_range(0.5f32..20.0));
        let inter_arrival_time =
            PoissonProcess::new(rate_per_diamond, StdRng::seed_from_u64(seed + 2000))?
                .filter_map(|t| Positive::new(t.get::<nanosecond>()));

        digis.extend(
            DigiGenerator::builder()
                .diamond(Address::from(pars.address()))
                .duration(
                    Positive::new(duration.get::<nanosecond>()).context("empty time-slice")?,
                )
                .inter_arrival_time(inter_arrival_time)
                .channel(channels)
                .charge(charges)
                .build(),
        );
    }
    digis.sort_by(|a, b| a.time.total_cmp(&b.time));

    let hitfind = Hitfind::from_setup(&setup)?;
    let (output, monitor) = hitfind.run(&digis);

    println!("{monitor}");
    let summary = output
        .partitions
        .iter()
        .map(|p| {
            serde_json::json!({
                "address": format!("0x{:08x}", p.address),
                "hits": p.hits.len(),
                "two_digi_hits": p.hits.iter().filter(|h| h.nof_channels == 2).count(),
            })
        })
        .collect::<Vec<_>>();
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
