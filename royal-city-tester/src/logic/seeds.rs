use anyhow::{Result, bail};
use royal_city_game::rng::truncate_seed;
use std::collections::HashSet;

pub const DEFAULT_SEED: u64 = 1337;

/// A seed requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    /// Token as typed, kept for hex seeds so reports echo them back.
    pub token: Option<String>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self { seed, token: None }
    }

    /// The 32-bit seed the engine plays with.
    #[must_use]
    pub const fn engine_seed(&self) -> u32 {
        truncate_seed(self.seed)
    }

    #[must_use]
    pub fn label(&self) -> String {
        self.token
            .clone()
            .unwrap_or_else(|| self.seed.to_string())
    }
}

/// Resolve CLI seed tokens into canonical seeds.
///
/// Accepts decimal integers (negative values use their magnitude) and `0x`
/// hexadecimal literals. Duplicates keep their first position.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            && let Ok(value) = u64::from_str_radix(hex, 16)
        {
            pending.push(SeedInfo {
                seed: value,
                token: Some(token.to_lowercase()),
            });
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut seen: HashSet<u64> = HashSet::new();
    let mut deduped: Vec<SeedInfo> = pending
        .into_iter()
        .filter(|info| seen.insert(info.seed))
        .collect();

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(DEFAULT_SEED));
    }

    Ok(deduped)
}
