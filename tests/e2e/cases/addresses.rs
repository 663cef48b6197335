use alloy::primitives::Address;
use vault_kit::{
    addresses::{AddressSet, resolve},
    constants::DEFAULT_VAULT,
    context::ChainContext,
    simulation::build_scope,
};

#[test]
fn unknown_chains_resolve_to_nothing() {
    for chain_id in [0, 5, 10, 137, 42161, 11155111, u64::MAX] {
        let addresses = resolve(chain_id);
        assert_eq!(addresses, AddressSet::default(), "chain {chain_id}");
        assert!(addresses.is_empty());
    }
}

#[test]
fn unknown_chain_scope_uses_sentinels() {
    let scope = build_scope(None, DEFAULT_VAULT, &ChainContext::new(10), None);

    assert_eq!(scope.users, vec![DEFAULT_VAULT]);
    assert_eq!(scope.tokens, vec![Address::ZERO, Address::ZERO, DEFAULT_VAULT]);
    assert_eq!(scope.vaults, vec![DEFAULT_VAULT]);
    assert!(scope.block.is_none());
}

#[test]
fn test_fork_resolves_like_mainnet() {
    let fork = ChainContext::from_wallet(Some(31337));
    assert!(fork.is_test_fork);
    assert_eq!(fork.addresses(), resolve(1));
    assert_eq!(ChainContext::from_wallet(None), ChainContext::new(1));
}
