use super::{
    Holding, Market, SimulationError, SimulationErrorCategories, SimulationScope,
    SimulationSnapshot, UserState,
};
use crate::provider::{ChainReader, RpcChainReader};
use alloy::{primitives::Address, providers::Provider};
use futures_util::future::join_all;
use std::fmt::Debug;
use tracing::{debug, instrument};

/// What a simulation service returns for a scope.
///
/// Data and error are independent: a snapshot may come with filler errors.
#[derive(Debug, Clone, Default)]
pub struct SimulationResponse {
    /// The snapshot, if one could be produced.
    pub data: Option<SimulationSnapshot>,
    /// The reported error, if any.
    pub error: Option<SimulationError>,
}

impl SimulationResponse {
    /// A response with no data and a fatal error.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self { data: None, error: Some(SimulationError::Fatal(message.into())) }
    }
}

/// Produces simulation snapshots.
#[async_trait::async_trait]
pub trait SimulationService: Debug + Send + Sync {
    /// Fetches the state covered by `scope` at its anchor block.
    async fn fetch(&self, scope: &SimulationScope) -> SimulationResponse;
}

/// A [`SimulationService`] reading every scoped item over RPC at the anchor block.
///
/// Failing items are reported per category; the rest of the snapshot is still returned.
#[derive(Debug, Clone)]
pub struct RpcSimulationService<P> {
    provider: P,
}

impl<P> RpcSimulationService<P> {
    /// Creates a new service.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl<P> SimulationService for RpcSimulationService<P>
where
    P: Provider + Clone + Debug,
{
    #[instrument(skip_all, fields(block = scope.block.map(|b| b.number)))]
    async fn fetch(&self, scope: &SimulationScope) -> SimulationResponse {
        let Some(block) = scope.block else {
            return SimulationResponse::fatal("no anchor block");
        };

        let reader = RpcChainReader::new(self.provider.clone()).at_block(block.number);
        let reader = &reader;
        let addresses = scope.chain.addresses();
        let tokens: Vec<Address> =
            scope.tokens.iter().copied().filter(|token| !token.is_zero()).collect();

        let mut snapshot = SimulationSnapshot::new(scope.chain.chain_id, block);
        let mut errors = SimulationErrorCategories::shell();

        if let Some(morpho) = addresses.morpho {
            match reader.fee_recipient(morpho).await {
                Ok(fee_recipient) => snapshot.global.fee_recipient = Some(fee_recipient),
                Err(err) => {
                    errors.global.get_or_insert_default().fee_recipient = Some(err.to_string())
                }
            }

            let markets = join_all(
                scope.market_ids.iter().map(|id| async move { (*id, reader.market(morpho, *id).await) }),
            )
            .await;
            for (id, result) in markets {
                match result {
                    Ok((params, totals)) => {
                        snapshot.markets.insert(id, Market { id, params, totals });
                    }
                    Err(err) => SimulationErrorCategories::record(&mut errors.markets, id, err),
                }
            }

            let positions = join_all(scope.users.iter().flat_map(|user| {
                scope.market_ids.iter().map(move |id| async move {
                    (*user, *id, reader.market_position(morpho, *id, *user).await)
                })
            }))
            .await;
            for (user, id, result) in positions {
                match result {
                    Ok(position) => snapshot.insert_position(user, id, position),
                    Err(err) => SimulationErrorCategories::record(
                        &mut errors.positions,
                        format!("{user}:{id}"),
                        err,
                    ),
                }
            }

            if let Some(bundler) = addresses.bundler {
                let users = join_all(scope.users.iter().map(|user| async move {
                    (*user, reader.authorization(morpho, *user, bundler).await)
                }))
                .await;
                for (user, result) in users {
                    match result {
                        Ok((is_bundler_authorized, morpho_nonce)) => {
                            snapshot.users.insert(
                                user,
                                UserState { address: user, is_bundler_authorized, morpho_nonce },
                            );
                        }
                        Err(err) => SimulationErrorCategories::record(&mut errors.users, user, err),
                    }
                }
            }
        }

        let token_infos =
            join_all(tokens.iter().map(|token| async move { (*token, reader.token(*token).await) }))
                .await;
        for (token, result) in token_infos {
            match result {
                Ok(info) => {
                    snapshot.tokens.insert(token, info);
                }
                Err(err) => SimulationErrorCategories::record(&mut errors.tokens, token, err),
            }
        }

        let vaults =
            join_all(scope.vaults.iter().map(|vault| async move { (*vault, reader.vault(*vault).await) }))
                .await;
        for (vault, result) in vaults {
            match result {
                Ok(info) => {
                    snapshot.vaults.insert(vault, info);
                }
                Err(err) => SimulationErrorCategories::record(&mut errors.vaults, vault, err),
            }
        }

        let spenders: Vec<Address> = [addresses.morpho, addresses.bundler]
            .into_iter()
            .flatten()
            .chain(scope.vaults.iter().copied())
            .collect();
        let holdings = join_all(scope.users.iter().flat_map(|user| {
            let spenders = &spenders;
            tokens.iter().map(move |token| async move {
                (*user, *token, read_holding(reader, *user, *token, spenders).await)
            })
        }))
        .await;
        for (user, token, result) in holdings {
            match result {
                Ok(holding) => snapshot.insert_holding(holding),
                Err(err) => SimulationErrorCategories::record(
                    &mut errors.holdings,
                    format!("{user}:{token}"),
                    err,
                ),
            }
        }

        debug!(
            markets = snapshot.markets.len(),
            users = snapshot.users.len(),
            tokens = snapshot.tokens.len(),
            vaults = snapshot.vaults.len(),
            "Fetched simulation snapshot"
        );

        SimulationResponse {
            data: Some(snapshot),
            error: Some(SimulationError::Categories(Box::new(errors))),
        }
    }
}

async fn read_holding<P: Provider + Debug>(
    reader: &RpcChainReader<P>,
    user: Address,
    token: Address,
    spenders: &[Address],
) -> Result<Holding, crate::error::ChainReadError> {
    let balance = reader.holding(user, token).await?;

    let mut allowances = std::collections::BTreeMap::new();
    for spender in spenders {
        allowances.insert(*spender, reader.allowance(user, *spender, token).await?);
    }

    Ok(Holding { user, token, balance, allowances })
}
