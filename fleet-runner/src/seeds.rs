use anyhow::{Result, bail};
use std::collections::HashSet;

/// Resolve CLI seed tokens into a deduplicated, order-preserving list.
///
/// Accepts decimal (`42`, `-42` folds to its magnitude) and hex (`0xC0FFEE`)
/// literals. Falls back to `default` when nothing usable is given.
pub fn resolve_seed_inputs(tokens: &[String], default: u64) -> Result<Vec<u64>> {
    let mut seen = HashSet::new();
    let mut seeds = Vec::new();
    for token in tokens {
        let seed = parse_seed(token)?;
        if seen.insert(seed) {
            seeds.push(seed);
        }
    }
    if seeds.is_empty() {
        seeds.push(default);
    }
    Ok(seeds)
}

fn parse_seed(token: &str) -> Result<u64> {
    let cleaned = token.trim().replace('_', "");
    if let Some(hex) = cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
        && let Ok(value) = u64::from_str_radix(hex, 16)
    {
        return Ok(value);
    }
    if let Ok(value) = cleaned.parse::<u64>() {
        return Ok(value);
    }
    if let Ok(value) = cleaned.parse::<i64>() {
        return Ok(value.unsigned_abs());
    }
    bail!("Unrecognized seed token: {token}");
}
