//! Thin command-line driver for the `gwmcmc` sampler core.
//!
//! Configuration loading and CLI argument parsing are explicitly out of
//! scope for the `gwmcmc` library itself (spec §1); this crate is the
//! minimal external collaborator that ties a config file, an analytic demo
//! target and the sampler together.

pub mod demo_likelihood;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::Parser;
use gwmcmc::config::RunConfig;
use gwmcmc::output::{file_name, ChainWriter, DetectorSummary, OutputHeader};
use gwmcmc::sampler::Sampler;

use demo_likelihood::DemoGaussianTarget;

/// Run the sampler against an analytic demo target and write one output
/// file per retained chain.
#[derive(Parser, Debug)]
#[command(name = "gwmcmc", version, about)]
pub struct Opts {
    /// Path to a `RunConfig` YAML file (spec §6 "Configuration surface").
    #[arg(long)]
    pub config: PathBuf,
    /// Directory to write `mcmc.output.<seed>.<tempIndex>` files into.
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
    /// Override the config file's PRNG seed.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Load the config, run `config.n_iter` outer iterations, and write one
/// output file per retained chain (spec.md:31/:160): the `T = 1` chain plus
/// `save_hot_chains` hotter rungs, each thinned per spec §6.
///
/// # Errors
/// Propagates I/O, YAML-parsing and sampler-construction errors.
pub fn run(opts: &Opts) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&opts.config)?;
    let mut config: RunConfig = serde_yaml::from_str(&text)?;
    if let Some(seed) = opts.seed {
        config.seed = seed;
    }

    let mu: Vec<f64> = config.parameters.iter().map(|p| p.best_value).collect();
    let sigma: Vec<f64> = config.parameters.iter().map(|p| p.sigma.max(1e-6)).collect();
    let model = DemoGaussianTarget::new(mu, sigma);
    let injection = vec![None; config.parameters.len()];

    let seed = config.seed;
    let n_iter = config.n_iter;
    let thin_output = config.thin_output;
    let save_hot_chains = config.save_hot_chains;
    let params = config.parameters.clone();

    let mut sampler = Sampler::new(config, &injection, model, 0, 0)?;

    let n_temps = sampler.n_rungs();
    let t_max = sampler.max_temperature();
    let retained = n_temps.min(usize::try_from(save_hot_chains).unwrap_or(usize::MAX).saturating_add(1));

    tracing::info!(n_iter, n_temps, retained, seed, "starting sampler run");

    let mut writers = Vec::with_capacity(retained);
    for rung in 0..retained {
        let path = opts.out_dir.join(file_name(seed, rung));
        let file = File::create(path)?;
        let multiplier = if rung == 0 { 1 } else { save_hot_chains.max(1) };
        let mut writer = ChainWriter::new(BufWriter::new(file), params.clone(), thin_output, multiplier);
        writer.write_header(&OutputHeader {
            n_iter,
            n_burn: 0,
            seed,
            null_log_l: 0.0,
            n_det: 1,
            n_corr: 0,
            n_temps,
            t_max,
            t_chain: sampler.temperature_for(rung),
            network_snr: 0.0,
            detectors: vec![DetectorSummary {
                name: "demo".to_string(),
                snr: 0.0,
                f_low: 0.0,
                f_high: 0.0,
                window: "none".to_string(),
                fft_length_seconds: 0.0,
            }],
        })?;
        // Iteration -1 is the true/injection state; since this demo target
        // carries no injection, the best-guess/start state stands in for it
        // (spec.md:162 "Iteration -1 contains the true/injection state").
        writer.write_record_unconditional(-1, sampler.chain(rung).log_l, &sampler.chain(rung).x)?;
        writer.write_record_unconditional(0, sampler.chain(rung).log_l, &sampler.chain(rung).x)?;
        writers.push(writer);
    }

    for _ in 0..n_iter {
        sampler.step();
        let cycle = sampler.iteration();
        for (rung, writer) in writers.iter_mut().enumerate() {
            writer.write_record(cycle, sampler.chain(rung).log_l, &sampler.chain(rung).x)?;
        }
    }

    Ok(())
}
