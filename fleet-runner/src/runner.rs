use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use colored::Colorize;
use fleet_sim::{FleetSimulation, Status, derive_episode_seed};
use log::{debug, info};
use serde::Serialize;

use crate::policy::PolicyStrategy;

/// Violations kept verbatim per episode; the rest are only counted.
const MAX_RECORDED_VIOLATIONS: usize = 20;

/// Outcome of one full episode under one policy.
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeSummary {
    pub policy: String,
    pub seed: u64,
    pub episode: usize,
    pub ticks: u32,
    pub total_reward: f64,
    pub passengers_boarded: u64,
    pub passengers_delivered: u64,
    pub flights_completed: u32,
    pub dispatches: u32,
    pub rejected_actions: u32,
    /// Mean load ratio over every departure in the episode.
    pub mean_load_factor: f64,
    pub violation_count: usize,
    pub violations: Vec<String>,
    pub fingerprint: u64,
    pub duration: Duration,
}

impl EpisodeSummary {
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.violation_count == 0
    }
}

/// Runs full episodes and audits the registry after every tick.
pub struct EpisodeRunner {
    sim: FleetSimulation,
    verbose: bool,
}

impl EpisodeRunner {
    #[must_use]
    pub const fn new(sim: FleetSimulation, verbose: bool) -> Self {
        Self { sim, verbose }
    }

    /// Run `episodes` episodes per seed for one policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects a step.
    pub fn run_policy(
        &mut self,
        strategy: PolicyStrategy,
        seeds: &[u64],
        episodes: usize,
    ) -> Result<Vec<EpisodeSummary>> {
        let mut summaries = Vec::with_capacity(seeds.len() * episodes);
        for &seed in seeds {
            for episode in 0..episodes {
                let summary = self
                    .run_episode(strategy, seed, episode)
                    .with_context(|| format!("{strategy} seed {seed} episode {episode}"))?;
                if self.verbose {
                    let status = if summary.passed() {
                        "✅".green()
                    } else {
                        "❌".red()
                    };
                    println!(
                        "{status} [{} seed {} #{}] reward {:.2}, {} flights, load {:.2}",
                        strategy.label().cyan(),
                        seed,
                        episode,
                        summary.total_reward,
                        summary.flights_completed,
                        summary.mean_load_factor
                    );
                }
                summaries.push(summary);
            }
        }
        Ok(summaries)
    }

    /// Reset with the seed derived for `(seed, episode)` and step to termination.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects a step.
    pub fn run_episode(
        &mut self,
        strategy: PolicyStrategy,
        seed: u64,
        episode: usize,
    ) -> Result<EpisodeSummary> {
        let start = Instant::now();
        let episode_seed = derive_episode_seed(seed, u64::try_from(episode).unwrap_or(u64::MAX));
        let mut policy = strategy.create_policy(episode_seed);
        self.sim.reset(Some(episode_seed));

        let mut summary = EpisodeSummary {
            policy: strategy.label().to_string(),
            seed,
            episode,
            ticks: 0,
            total_reward: 0.0,
            passengers_boarded: 0,
            passengers_delivered: 0,
            flights_completed: 0,
            dispatches: 0,
            rejected_actions: 0,
            mean_load_factor: 0.0,
            violation_count: 0,
            violations: Vec::new(),
            fingerprint: 0,
            duration: Duration::ZERO,
        };
        let mut load_sum = 0.0_f64;
        let mut departures = 0_u32;

        self.audit(&mut summary, 0);
        loop {
            let actions = policy.decide(&self.sim);
            let outcome = self.sim.step(&actions)?;
            let info = &outcome.info;
            summary.ticks = info.tick;
            summary.total_reward += f64::from(outcome.reward);
            summary.passengers_boarded += u64::from(info.passengers_boarded);
            summary.passengers_delivered += u64::from(info.passengers_delivered);
            summary.flights_completed += info.flights_completed;
            summary.dispatches += info.dispatches;
            summary.rejected_actions += info.rejected_actions;

            for plane in self.sim.registry().aircraft() {
                let just_departed = plane.status() == Status::Fly
                    && plane
                        .history()
                        .segments()
                        .last()
                        .is_some_and(|segment| segment.tick_count == 1);
                if just_departed {
                    load_sum += f64::from(plane.passenger_load_ratio());
                    departures += 1;
                }
            }
            self.audit(&mut summary, info.tick);
            if outcome.terminated {
                break;
            }
        }

        if departures > 0 {
            summary.mean_load_factor = load_sum / f64::from(departures);
        }
        summary.fingerprint = self.sim.registry().fingerprint();
        summary.duration = start.elapsed();
        info!(
            "{} seed {seed} episode {episode}: reward {:.3}, {} violations",
            policy.name(),
            summary.total_reward,
            summary.violation_count
        );
        Ok(summary)
    }

    fn audit(&self, summary: &mut EpisodeSummary, tick: u32) {
        for violation in self.sim.registry().check_invariants() {
            debug!("tick {tick}: {violation}");
            summary.violation_count += 1;
            if summary.violations.len() < MAX_RECORDED_VIOLATIONS {
                summary.violations.push(format!("tick {tick}: {violation}"));
            }
        }
    }
}
