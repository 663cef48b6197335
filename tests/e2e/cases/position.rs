use crate::environment::{MockChain, OTHER_VAULT, WETH};
use alloy::primitives::{Address, U256, address};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use vault_kit::{
    bundle::format_amount,
    constants::DEFAULT_VAULT,
    math::{ShareRatio, WAD},
    position::{Poller, Position, derive_position, derive_token_balance},
};

const ACCOUNT: Address = address!("1111111111111111111111111111111111111111");

#[tokio::test]
async fn position_shows_underlying_equivalent() {
    let chain = MockChain::mainnet();
    chain.set_balance(ACCOUNT, DEFAULT_VAULT, U256::from(90) * WAD);

    let position = derive_position(chain.as_ref(), Some(ACCOUNT), DEFAULT_VAULT)
        .await
        .unwrap()
        .expect("an account has a position");

    assert_eq!(position.vault_symbol, "mWETH");
    assert_eq!(position.underlying_symbol.as_deref(), Some("WETH"));
    assert_eq!(position.underlying_address, WETH);
    assert_eq!(position.share_to_underlying, U256::from(1_111_111_111_111_111_111u64));

    let underlying = position.underlying_equivalent().unwrap();
    assert_eq!(underlying, U256::from(99_999_999_999_999_999_990u128));
    assert_eq!(format_amount(underlying, position.underlying_decimals), "99.999999999999999990");

    // the ratio only moves with the vault totals
    for _ in 0..3 {
        let again =
            derive_position(chain.as_ref(), Some(ACCOUNT), DEFAULT_VAULT).await.unwrap().unwrap();
        assert_eq!(again, position);
    }
}

#[tokio::test]
async fn share_ratio_follows_vault_totals() {
    let chain = MockChain::mainnet();
    for (total_assets, total_supply) in [(3u64, 2u64), (1, 3), (1_000_000, 999_999)] {
        {
            let mut state = chain.state.lock().unwrap();
            let vault = state.vaults.get_mut(&DEFAULT_VAULT).unwrap();
            vault.total_assets = U256::from(total_assets);
            vault.total_supply = U256::from(total_supply);
        }

        let position =
            derive_position(chain.as_ref(), Some(ACCOUNT), DEFAULT_VAULT).await.unwrap().unwrap();
        let expected = U256::from(total_assets) * WAD / U256::from(total_supply);
        assert_eq!(position.share_to_underlying, expected);
        assert_eq!(
            ShareRatio::from_totals(U256::from(total_assets), U256::from(total_supply))
                .unwrap()
                .wad(),
            expected
        );
    }
}

#[tokio::test]
async fn missing_account_or_vault() {
    let chain = MockChain::mainnet();

    assert_eq!(derive_position(chain.as_ref(), None, DEFAULT_VAULT).await.unwrap(), None);
    assert_eq!(derive_token_balance(chain.as_ref(), None, WETH).await.unwrap(), None);

    let unknown = address!("9999999999999999999999999999999999999999");
    let err = derive_position(chain.as_ref(), Some(ACCOUNT), unknown).await.unwrap_err();
    assert!(err.to_string().contains("reverted"), "{err}");
}

#[tokio::test]
async fn token_balance_of_underlying() {
    let chain = MockChain::mainnet();
    chain.set_balance(ACCOUNT, WETH, U256::from(5) * WAD / U256::from(2));

    let balance = derive_token_balance(chain.as_ref(), Some(ACCOUNT), WETH).await.unwrap().unwrap();
    assert_eq!(balance.symbol.as_deref(), Some("WETH"));
    assert_eq!(format_amount(balance.balance, balance.decimals), "2.500000000000000000");
}

#[tokio::test(start_paused = true)]
async fn vault_switch_drops_pending_reads() {
    let chain = MockChain::mainnet();
    chain.set_balance(ACCOUNT, DEFAULT_VAULT, U256::from(90) * WAD);
    chain.set_balance(ACCOUNT, OTHER_VAULT, U256::from(7) * WAD);
    chain.delay_vault(DEFAULT_VAULT, Duration::from_secs(5));

    let (mut poller, rx) = Poller::<Position>::new(Duration::from_secs(10));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let collector = {
        let seen = Arc::clone(&seen);
        let mut rx = rx.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                if let Some(position) = &rx.borrow_and_update().value {
                    seen.lock().unwrap().push(position.vault);
                }
            }
        })
    };

    let target = |vault: Address| {
        let chain = Arc::clone(&chain);
        move || {
            let chain = Arc::clone(&chain);
            async move { derive_position(chain.as_ref(), Some(ACCOUNT), vault).await }
        }
    };

    poller.watch(target(DEFAULT_VAULT));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(rx.borrow().is_loading);

    poller.watch(target(OTHER_VAULT));
    tokio::time::sleep(Duration::from_secs(30)).await;

    let state = rx.borrow().clone();
    assert!(!state.is_loading);
    let position = state.value.expect("the new target was polled");
    assert_eq!(position.vault, OTHER_VAULT);
    assert_eq!(position.vault_symbol, "oWETH");

    poller.stop();
    collector.abort();

    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    assert!(seen.iter().all(|vault| *vault == OTHER_VAULT), "{seen:?}");
}
