use anyhow::{Context, Result, bail};

/// Seed used when the command line names none.
pub const DEFAULT_SEED: u64 = 1337;

/// Resolve CLI seed tokens into engine seeds.
///
/// Accepts decimal integers (negative values use their magnitude) and
/// `0x`-prefixed hex. Duplicates are dropped while keeping first-seen order.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }
        let seed = parse_seed(token)?;
        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }

    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }

    Ok(seeds)
}

fn parse_seed(token: &str) -> Result<u64> {
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        let digits = hex.replace('_', "");
        return u64::from_str_radix(&digits, 16)
            .with_context(|| format!("invalid hex seed: {token}"));
    }

    if let Ok(value) = token.parse::<u64>() {
        return Ok(value);
    }

    if let Ok(value) = token.parse::<i64>() {
        return Ok(value.unsigned_abs());
    }

    bail!("Unrecognized seed token: {token}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn resolves_decimal_negative_and_hex() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "-7", "0xC0_FFEE", "0XFF"])).unwrap();
        assert_eq!(seeds, vec![42, 7, 0x00C0_FFEE, 0xFF]);
    }

    #[test]
    fn duplicates_collapse_in_order() {
        let seeds = resolve_seed_inputs(&tokens(&["9", "0x9", "3", "9"])).unwrap();
        assert_eq!(seeds, vec![9, 3]);
    }

    #[test]
    fn empty_input_falls_back_to_default() {
        assert_eq!(resolve_seed_inputs(&[]).unwrap(), vec![DEFAULT_SEED]);
        assert_eq!(resolve_seed_inputs(&tokens(&[""])).unwrap(), vec![DEFAULT_SEED]);
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        let err = resolve_seed_inputs(&tokens(&["12", "walker"])).unwrap_err();
        assert!(err.to_string().contains("walker"));
        assert!(resolve_seed_inputs(&tokens(&["0xZZ"])).is_err());
    }
}
