// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Cross-chain balance derived from a token collection

use api_client::{ChainBalance, MultichainBalance, Token};
use shared_types::{ChainId, ChainRegistry};

/// Sum token quotes per chain and across chains
///
/// Chains appear in `per_chain` in the order they first appear in `tokens`,
/// and only when their current total is positive. The totals cover every
/// chain. The percent change is zero when there was no value 24 hours ago.
pub fn calculate_multichain_balance(tokens: &[Token], registry: &ChainRegistry) -> MultichainBalance {
    let mut groups: Vec<(ChainId, &Token, f64, f64)> = Vec::new();
    for token in tokens {
        match groups.iter_mut().find(|(id, ..)| *id == token.chain_id) {
            Some((_, _, value, value_24h)) => {
                *value += token.quote_value;
                *value_24h += token.quote_24h_value;
            }
            None => groups.push((
                token.chain_id,
                token,
                token.quote_value,
                token.quote_24h_value,
            )),
        }
    }

    let total_value: f64 = groups.iter().map(|(_, _, value, _)| value).sum();
    let total_value_24h: f64 = groups.iter().map(|(_, _, _, value_24h)| value_24h).sum();
    let change_percent = if total_value_24h > 0.0 {
        (total_value - total_value_24h) / total_value_24h * 100.0
    } else {
        0.0
    };

    let per_chain = groups
        .into_iter()
        .filter(|(_, _, value, _)| *value > 0.0)
        .map(|(id, first, value, _)| match registry.get(id) {
            Some(chain) => ChainBalance {
                name: chain.name.clone(),
                logo_url: chain.logo_url.clone(),
                value,
            },
            None => ChainBalance {
                name: first.chain_name.clone(),
                logo_url: first.chain_logo_url.clone(),
                value,
            },
        })
        .collect();

    MultichainBalance {
        total_value,
        total_value_24h,
        change_percent,
        per_chain,
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::Address;
    use shared_types::Chain;

    use super::*;

    fn token(chain: ChainId, quote: f64, quote_24h: f64) -> Token {
        Token {
            chain_id: chain,
            chain_name: format!("chain {}", chain.chain_id()),
            chain_logo_url: String::new(),
            contract_address: Address::repeat_byte(7),
            name: None,
            symbol: "TKN".to_string(),
            decimals: 18,
            is_native: false,
            balance_raw: "1".to_string(),
            quote_value: quote,
            quote_24h_value: quote_24h,
            pretty_quote: String::new(),
            logo_url: None,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn sums_per_chain_in_first_appearance_order() {
        let tokens = [
            token(ChainId::Base, 60.0, 50.0),
            token(ChainId::Ethereum, 50.0, 60.0),
            token(ChainId::Base, 40.0, 40.0),
        ];
        let balance = calculate_multichain_balance(&tokens, &ChainRegistry::default());

        assert!(close(balance.total_value, 150.0));
        assert!(close(balance.total_value_24h, 150.0));
        assert!(close(balance.change_percent, 0.0));
        let names: Vec<_> = balance.per_chain.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Base", "Ethereum"]);
        assert!(close(balance.per_chain[0].value, 100.0));
        assert!(close(balance.per_chain[1].value, 50.0));
    }

    #[test]
    fn change_is_relative_to_previous_total() {
        let tokens = [token(ChainId::Ethereum, 110.0, 100.0)];
        let balance = calculate_multichain_balance(&tokens, &ChainRegistry::default());
        assert!(close(balance.change_percent, 10.0));
    }

    #[test]
    fn empty_input_yields_zero_balance() {
        let balance = calculate_multichain_balance(&[], &ChainRegistry::default());
        assert_eq!(balance, MultichainBalance::default());
    }

    #[test]
    fn zero_valued_chains_are_omitted_but_counted_in_totals() {
        let tokens = [
            token(ChainId::Ethereum, 10.0, 0.0),
            token(ChainId::Arbitrum, 0.0, 5.0),
        ];
        let balance = calculate_multichain_balance(&tokens, &ChainRegistry::default());
        assert_eq!(balance.per_chain.len(), 1);
        assert!(close(balance.total_value_24h, 5.0));
        assert!(close(balance.change_percent, 100.0));
    }

    #[test]
    fn unknown_chain_uses_token_metadata() {
        let registry = ChainRegistry::new(vec![Chain::builtin(ChainId::Ethereum)]);
        let balance =
            calculate_multichain_balance(&[token(ChainId::Optimism, 3.0, 3.0)], &registry);
        assert_eq!(balance.per_chain[0].name, "chain 10");
    }
}
