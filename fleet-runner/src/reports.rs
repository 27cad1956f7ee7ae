use anyhow::Result;
use colored::Colorize;
use fleet_sim::numbers::{u64_to_f64, usize_to_f64};
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use crate::runner::EpisodeSummary;

/// Per-policy averages across every seed and episode.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyAggregate {
    pub policy: String,
    pub episodes: usize,
    pub mean_reward: f64,
    pub mean_passengers: f64,
    pub mean_flights: f64,
    pub mean_load_factor: f64,
    pub violations: usize,
}

#[must_use]
pub fn aggregate_by_policy(results: &[EpisodeSummary]) -> Vec<PolicyAggregate> {
    let mut order: Vec<&str> = Vec::new();
    for result in results {
        if !order.contains(&result.policy.as_str()) {
            order.push(&result.policy);
        }
    }
    order
        .into_iter()
        .map(|policy| {
            let runs: Vec<&EpisodeSummary> =
                results.iter().filter(|r| r.policy == policy).collect();
            let count = usize_to_f64(runs.len());
            let mean = |value: fn(&EpisodeSummary) -> f64| {
                runs.iter().map(|&run| value(run)).sum::<f64>() / count
            };
            PolicyAggregate {
                policy: policy.to_string(),
                episodes: runs.len(),
                mean_reward: mean(|run| run.total_reward),
                mean_passengers: mean(|run| u64_to_f64(run.passengers_delivered)),
                mean_flights: mean(|run| f64::from(run.flights_completed)),
                mean_load_factor: mean(|run| run.mean_load_factor),
                violations: runs.iter().map(|run| run.violation_count).sum(),
            }
        })
        .collect()
}

pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[EpisodeSummary],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Episode Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==========================".cyan())?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed()).count();
    writeln!(out, "Total episodes: {total}")?;
    writeln!(out, "Clean: {}", passed.to_string().green())?;
    writeln!(out, "With violations: {}", (total - passed).to_string().red())?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for aggregate in aggregate_by_policy(results) {
        let status = if aggregate.violations == 0 {
            "✅ CLEAN".green()
        } else {
            "❌ VIOLATIONS".red()
        };
        writeln!(out, "{} {}", status, aggregate.policy.bold())?;
        writeln!(out, "   Episodes: {}", aggregate.episodes)?;
        writeln!(out, "   Mean reward: {:.2}", aggregate.mean_reward)?;
        writeln!(out, "   Mean passengers delivered: {:.1}", aggregate.mean_passengers)?;
        writeln!(out, "   Mean flights: {:.1}", aggregate.mean_flights)?;
        writeln!(out, "   Mean load factor: {:.3}", aggregate.mean_load_factor)?;
        writeln!(out)?;
    }

    let failures: Vec<&EpisodeSummary> = results.iter().filter(|r| !r.passed()).collect();
    if !failures.is_empty() {
        writeln!(out, "{}", "🚨 Invariant Violations".bright_red().bold())?;
        writeln!(out, "{}", "=======================".red())?;
        for failure in failures {
            writeln!(
                out,
                "{} seed {} episode {} ({} total)",
                failure.policy, failure.seed, failure.episode, failure.violation_count
            )?;
            for violation in &failure.violations {
                writeln!(out, "     • {}", violation.red())?;
            }
        }
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, results: &[EpisodeSummary]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, results: &[EpisodeSummary]) -> Result<()> {
    writeln!(out, "# Fleet Rotation Episode Results\n")?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed()).count();
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total episodes**: {total}")?;
    writeln!(out, "- **Clean**: {passed}")?;
    writeln!(out, "- **With violations**: {}\n", total - passed)?;

    writeln!(out, "## Policies\n")?;
    writeln!(
        out,
        "| Policy | Episodes | Mean reward | Mean passengers | Mean flights | Mean load | Violations |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|---|")?;
    for aggregate in aggregate_by_policy(results) {
        writeln!(
            out,
            "| {} | {} | {:.2} | {:.1} | {:.1} | {:.3} | {} |",
            aggregate.policy,
            aggregate.episodes,
            aggregate.mean_reward,
            aggregate.mean_passengers,
            aggregate.mean_flights,
            aggregate.mean_load_factor,
            aggregate.violations
        )?;
    }
    writeln!(out)?;

    writeln!(out, "## Episodes\n")?;
    for result in results {
        let status = if result.passed() { "✅" } else { "❌" };
        writeln!(
            out,
            "### {} {} seed {} episode {}\n",
            status, result.policy, result.seed, result.episode
        )?;
        writeln!(out, "- **Reward**: {:.2}", result.total_reward)?;
        writeln!(
            out,
            "- **Passengers**: {} boarded, {} delivered",
            result.passengers_boarded, result.passengers_delivered
        )?;
        writeln!(out, "- **Flights completed**: {}", result.flights_completed)?;
        writeln!(out, "- **Mean load factor**: {:.3}", result.mean_load_factor)?;
        if !result.violations.is_empty() {
            writeln!(out, "- **Violations**:")?;
            for violation in &result.violations {
                writeln!(out, "  - {violation}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn generate_csv_report(out: &mut dyn Write, results: &[EpisodeSummary]) -> Result<()> {
    writeln!(
        out,
        "policy,seed,episode,ticks,total_reward,passengers_boarded,passengers_delivered,flights_completed,dispatches,rejected_actions,mean_load_factor,violations,fingerprint"
    )?;
    for result in results {
        writeln!(
            out,
            "{},{},{},{},{:.4},{},{},{},{},{},{:.4},{},{:#018x}",
            result.policy,
            result.seed,
            result.episode,
            result.ticks,
            result.total_reward,
            result.passengers_boarded,
            result.passengers_delivered,
            result.flights_completed,
            result.dispatches,
            result.rejected_actions,
            result.mean_load_factor,
            result.violation_count,
            result.fingerprint
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(policy: &str, reward: f64, violations: usize) -> EpisodeSummary {
        EpisodeSummary {
            policy: policy.to_string(),
            seed: 1,
            episode: 0,
            ticks: 168,
            total_reward: reward,
            passengers_boarded: 900,
            passengers_delivered: 800,
            flights_completed: 6,
            dispatches: 7,
            rejected_actions: 0,
            mean_load_factor: 0.75,
            violation_count: violations,
            violations: (0..violations)
                .map(|i| format!("tick {i}: A0: flying but parked"))
                .collect(),
            fingerprint: 0xABCD,
            duration: Duration::from_millis(3),
        }
    }

    fn render(report: impl Fn(&mut dyn Write) -> Result<()>) -> String {
        let mut buffer = Vec::new();
        report(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn aggregates_group_by_policy_in_first_seen_order() {
        let results = vec![
            summary("greedy", 10.0, 0),
            summary("stay", 0.0, 0),
            summary("greedy", 20.0, 1),
        ];
        let aggregates = aggregate_by_policy(&results);
        assert_eq!(aggregates.len(), 2);
        assert_eq!(aggregates[0].policy, "greedy");
        assert_eq!(aggregates[0].episodes, 2);
        assert!((aggregates[0].mean_reward - 15.0).abs() < f64::EPSILON);
        assert_eq!(aggregates[0].violations, 1);
    }

    #[test]
    fn every_format_renders() {
        let results = vec![summary("greedy", 12.5, 0), summary("random", 3.0, 2)];
        let console =
            render(|out| generate_console_report(out, &results, Duration::from_secs(1)));
        assert!(console.contains("Episode Results Summary"));
        assert!(console.contains("flying but parked"));

        let json = render(|out| generate_json_report(out, &results));
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);

        let markdown = render(|out| generate_markdown_report(out, &results));
        assert!(markdown.contains("| greedy | 1 | 12.50"));

        let csv = render(|out| generate_csv_report(out, &results));
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.lines().nth(2).unwrap().starts_with("random,1,0,168,3.0000"));
    }
}
