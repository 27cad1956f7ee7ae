use std::fmt;

use anyhow::{Result, bail};
use fleet_sim::{Action, FleetSimulation, PortId, Status};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Policy interface for automated episode runs.
pub trait DispatchPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// One action per aircraft for the coming tick.
    fn decide(&mut self, sim: &FleetSimulation) -> Vec<Action>;
}

/// Built-in baseline policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PolicyStrategy {
    Stay,
    Random,
    Greedy,
}

impl PolicyStrategy {
    pub const ALL: [Self; 3] = [Self::Stay, Self::Random, Self::Greedy];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Stay => "stay",
            Self::Random => "random",
            Self::Greedy => "greedy",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Stay => "never dispatch; every aircraft idles at its port",
            Self::Random => "waiting aircraft leave for a random port 30% of the time",
            Self::Greedy => "waiting aircraft chase the largest unclaimed demand from their port",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn DispatchPolicy + Send> {
        match self {
            Self::Stay => Box::new(StayPolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
            Self::Greedy => Box::new(GreedyPolicy),
        }
    }

    fn parse(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.label().eq_ignore_ascii_case(token))
    }
}

impl fmt::Display for PolicyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Expand policy tokens; `all` selects every built-in policy.
pub fn expand_policies(tokens: &[String]) -> Result<Vec<PolicyStrategy>> {
    let mut policies = Vec::new();
    for token in tokens {
        if token.eq_ignore_ascii_case("all") {
            for strategy in PolicyStrategy::ALL {
                if !policies.contains(&strategy) {
                    policies.push(strategy);
                }
            }
            continue;
        }
        let Some(strategy) = PolicyStrategy::parse(token) else {
            bail!("Unknown policy: {token}");
        };
        if !policies.contains(&strategy) {
            policies.push(strategy);
        }
    }
    if policies.is_empty() {
        policies.push(PolicyStrategy::Greedy);
    }
    Ok(policies)
}

struct StayPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
    dispatch_chance: f64,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            dispatch_chance: 0.3,
        }
    }
}

struct GreedyPolicy;

impl DispatchPolicy for StayPolicy {
    fn name(&self) -> &'static str {
        "stay"
    }

    fn decide(&mut self, sim: &FleetSimulation) -> Vec<Action> {
        vec![Action::Continue; sim.registry().fleet_size()]
    }
}

impl DispatchPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn decide(&mut self, sim: &FleetSimulation) -> Vec<Action> {
        let ports = sim.registry().num_ports();
        sim.registry()
            .aircraft()
            .iter()
            .map(|plane| {
                if plane.status() != Status::Wait || !self.rng.gen_bool(self.dispatch_chance) {
                    return Action::Continue;
                }
                // Skip the current port so every dispatch is a real departure.
                let offset = self.rng.gen_range(1..ports);
                Action::GoTo(PortId((plane.current_port().index() + offset) % ports))
            })
            .collect()
    }
}

impl DispatchPolicy for GreedyPolicy {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn decide(&mut self, sim: &FleetSimulation) -> Vec<Action> {
        let registry = sim.registry();
        let mut unclaimed: Vec<Vec<u32>> = registry
            .ports()
            .iter()
            .map(|port| port.demand().as_slice().to_vec())
            .collect();

        registry
            .aircraft()
            .iter()
            .map(|plane| {
                if plane.status() != Status::Wait {
                    return Action::Continue;
                }
                let Some(row) = unclaimed.get_mut(plane.current_port().index()) else {
                    return Action::Continue;
                };
                let best = row
                    .iter()
                    .enumerate()
                    .max_by_key(|(index, waiting)| (**waiting, std::cmp::Reverse(*index)))
                    .map(|(index, waiting)| (index, *waiting));
                match best {
                    Some((index, waiting)) if waiting >= plane.capacity() / 2 => {
                        row[index] = row[index].saturating_sub(plane.capacity());
                        Action::GoTo(PortId(index))
                    }
                    _ => Action::Continue,
                }
            })
            .collect()
    }
}
