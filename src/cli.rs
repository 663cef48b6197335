//! # Vault kit CLI
use crate::{
    api::{VaultApiClient, VaultDisplay},
    bundle::{
        BundleOutcome, DirectBundler, SubmitOptions, WithdrawAmount, deposit_intent, format_amount,
        parse_amount, submit, withdraw_intent,
    },
    config::VaultKitConfig,
    context::ContextHandle,
    error::InputError,
    position::{PollState, Poller, Position, derive_position, derive_token_balance},
    provider::{ChainReader, RpcChainReader},
    simulation::{
        RpcSimulationService, SimulationScope, SimulationState, SimulationStateBuilder,
        build_scope,
    },
    wallet::{LocalWallet, Wallet},
};
use alloy::{
    primitives::{Address, U256},
    providers::DynProvider,
};
use alloy_chains::Chain;
use clap::{Parser, Subcommand};
use eyre::{OptionExt, WrapErr};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use url::Url;

/// Views MetaMorpho vault positions and bundles deposits and withdrawals.
#[derive(Debug, Parser)]
#[command(author, about = "Vault kit", long_about = None)]
pub struct Args {
    /// The configuration file.
    ///
    /// If missing, a default one will be stored under this path.
    #[arg(long, value_name = "CONFIG", env = "VAULT_KIT_CONFIG", default_value = "vault-kit.yaml")]
    pub config: PathBuf,
    /// The chain to connect to.
    #[arg(long, value_name = "CHAIN")]
    pub chain: Option<Chain>,
    /// The RPC endpoint of the chain.
    #[arg(long = "rpc-url", value_name = "RPC_ENDPOINT", env = "VAULT_KIT_RPC_URL")]
    pub rpc_url: Option<Url>,
    /// The Morpho API endpoint.
    #[arg(long = "api-url", value_name = "URL")]
    pub api_url: Option<Url>,
    /// The vault to interact with.
    #[arg(long, value_name = "ADDRESS")]
    pub vault: Option<Address>,
    /// Slippage tolerance as a fraction, eg. `0.0003`.
    #[arg(long, value_name = "FRACTION", value_parser = parse_wad)]
    pub slippage: Option<U256>,
    /// Interval between two position refreshes.
    #[arg(long, value_name = "SECONDS", value_parser = parse_duration_secs)]
    pub poll_interval: Option<Duration>,
    /// The private key of the wallet. Without it, the wallet is read-only.
    #[arg(long, value_name = "PRIVATE_KEY", env = "VAULT_KIT_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Commands of the CLI.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the vault as displayed by the Morpho API.
    Show,
    /// Show the position of an account in the vault.
    Position {
        /// The account. Defaults to the connected wallet.
        account: Option<Address>,
    },
    /// Show the token balance of an account.
    Balance {
        /// The token.
        token: Address,
        /// The account. Defaults to the connected wallet.
        account: Option<Address>,
    },
    /// Deposit assets into the vault.
    Deposit {
        /// Amount of underlying assets, eg. `1.5`.
        amount: String,
    },
    /// Withdraw assets from the vault.
    Withdraw {
        /// Amount of underlying assets. Required unless `--all` is set.
        #[arg(required_unless_present = "all")]
        amount: Option<String>,
        /// Redeem every share of the position.
        #[arg(long, conflicts_with = "amount")]
        all: bool,
    },
    /// Print the simulation scope of the connected wallet at the latest block.
    Scope,
    /// Follow blocks, the simulation state and the position until interrupted.
    Watch,
}

impl Args {
    /// Run the command.
    pub async fn run(self) -> eyre::Result<()> {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(
                EnvFilter::builder()
                    .with_default_directive(LevelFilter::INFO.into())
                    .from_env_lossy(),
            )
            .init();

        let config = if !self.config.exists() {
            let config = self.merge_config(VaultKitConfig::default()).with_default_endpoints()?;
            config.save_to_file(&self.config)?;
            info!(path = %self.config.display(), "Wrote default config");
            config
        } else {
            self.merge_config(VaultKitConfig::load_from_file(&self.config)?)
        };

        if let Command::Show = self.command {
            return show(&config).await;
        }

        let endpoint = config
            .endpoint(config.chain.id())
            .ok_or_else(|| eyre::eyre!("no RPC endpoint configured for chain {}", config.chain))?;
        let wallet = LocalWallet::connect(endpoint, config.secrets.private_key.as_deref()).await?;
        let session = Session::new(config, wallet);

        match self.command {
            Command::Show => Ok(()),
            Command::Position { account } => session.position(account).await,
            Command::Balance { token, account } => session.balance(token, account).await,
            Command::Deposit { amount } => session.deposit(&amount).await,
            Command::Withdraw { amount, all } => {
                let amount = if all { None } else { amount };
                session.withdraw(amount.as_deref()).await
            }
            Command::Scope => session.scope().await,
            Command::Watch => session.watch().await,
        }
    }

    /// Merges [`Args`] values into an existing [`VaultKitConfig`] instance.
    pub fn merge_config(&self, config: VaultKitConfig) -> VaultKitConfig {
        config
            .with_chain(self.chain)
            .with_endpoint(self.rpc_url.clone())
            .with_api_endpoint(self.api_url.clone())
            .with_vault(self.vault)
            .with_slippage_tolerance(self.slippage)
            .with_position_interval(self.poll_interval)
            .with_private_key(self.private_key.clone())
    }
}

async fn show(config: &VaultKitConfig) -> eyre::Result<()> {
    let client = VaultApiClient::new(config.api.endpoint()?);
    let vault = client.fetch(config.vault.address, config.chain.id()).await?;

    println!("{} ({})", vault.name, vault.symbol);
    println!("  address:     {}", vault.address);
    println!("  chain:       {} ({})", vault.chain.network, vault.chain.id);
    println!("  whitelisted: {}", vault.whitelisted);
    println!("  asset:       {} {}", vault.asset.symbol, vault.asset.address);
    print_liquidity(&vault);
    if let Some(metadata) = &vault.metadata {
        let curators = metadata.curators.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
        println!("  curators:    {}", curators.join(", "));
        println!("  {}", metadata.description);
    }
    for allocation in vault.allocation() {
        let collateral =
            allocation.market.collateral_asset.as_ref().map_or("idle", |asset| asset.symbol.as_str());
        println!(
            "  - {collateral:<8} {} {}",
            format_amount(allocation.supply_assets, vault.asset.decimals),
            allocation.market.unique_key
        );
    }

    Ok(())
}

/// A connected wallet and its readers.
#[derive(Debug)]
struct Session {
    config: VaultKitConfig,
    wallet: LocalWallet,
    reader: Arc<RpcChainReader<DynProvider>>,
}

impl Session {
    fn new(config: VaultKitConfig, wallet: LocalWallet) -> Self {
        let reader = Arc::new(RpcChainReader::new(wallet.provider().clone()));
        Self { config, wallet, reader }
    }

    fn vault(&self) -> Address {
        self.config.vault.address
    }

    async fn position(&self, account: Option<Address>) -> eyre::Result<()> {
        let account = account.or(self.wallet.account());
        match derive_position(self.reader.as_ref(), account, self.vault()).await? {
            Some(position) => print_position(&position),
            None => println!("No account connected"),
        }
        Ok(())
    }

    async fn balance(&self, token: Address, account: Option<Address>) -> eyre::Result<()> {
        let account = account.or(self.wallet.account());
        match derive_token_balance(self.reader.as_ref(), account, token).await? {
            Some(balance) => println!(
                "{} {}",
                format_amount(balance.balance, balance.decimals),
                balance.symbol.as_deref().unwrap_or("?")
            ),
            None => println!("No account connected"),
        }
        Ok(())
    }

    async fn deposit(&self, amount: &str) -> eyre::Result<()> {
        let sender = self.wallet.account().ok_or_eyre("a private key is required to deposit")?;
        let vault = self.reader.vault(self.vault()).await?;
        let asset = self.reader.token(vault.asset).await?;
        let assets = parse_amount(amount, asset.decimals)?;

        let intent =
            deposit_intent(sender, vault.address, assets, self.config.vault.slippage_tolerance);
        print_outcome(self.submit(intent).await?);
        Ok(())
    }

    async fn withdraw(&self, amount: Option<&str>) -> eyre::Result<()> {
        let sender = self.wallet.account().ok_or_eyre("a private key is required to withdraw")?;
        let vault = self.reader.vault(self.vault()).await?;
        let position = derive_position(self.reader.as_ref(), Some(sender), vault.address).await?;

        let amount = match amount {
            Some(amount) => {
                let decimals = self.reader.token(vault.asset).await?.decimals;
                WithdrawAmount::Partial(parse_amount(amount, decimals)?)
            }
            None => WithdrawAmount::Full,
        };

        let intent = withdraw_intent(
            sender,
            amount,
            position.as_ref(),
            &vault,
            self.config.vault.slippage_tolerance,
        )?;
        print_outcome(self.submit(intent).await?);
        Ok(())
    }

    async fn scope(&self) -> eyre::Result<()> {
        let scope = self.latest_scope().await?;
        println!("{}", serde_json::to_string_pretty(&scope)?);
        Ok(())
    }

    async fn latest_scope(&self) -> eyre::Result<SimulationScope> {
        let block = self.reader.latest_block().await?;
        let state = self.wallet.state();
        Ok(build_scope(state.account, self.vault(), &state.chain(), Some(block))
            .with_market_ids(self.config.vault.market_ids.clone()))
    }

    /// Loads a simulation snapshot at the latest block.
    async fn simulation(&self) -> eyre::Result<SimulationState> {
        let service = Arc::new(RpcSimulationService::new(self.wallet.provider().clone()));
        let (mut builder, mut state) = SimulationStateBuilder::new(service);
        builder.refresh(self.latest_scope().await?);

        let state = state
            .wait_for(|state| !state.is_pending)
            .await
            .wrap_err("simulation builder stopped")?
            .clone();
        Ok(state)
    }

    async fn submit(&self, intent: crate::bundle::BundleIntent) -> eyre::Result<BundleOutcome> {
        let simulation = self.simulation().await?;
        Ok(submit(intent, &self.wallet, &simulation, &DirectBundler, SubmitOptions::default())
            .await?)
    }

    async fn watch(&self) -> eyre::Result<()> {
        let vault = self.vault();
        let context = Arc::new(ContextHandle::new(self.wallet.state(), vault));
        let reader: Arc<dyn ChainReader> = self.reader.clone();

        let blocks = context.spawn_block_watcher(reader.clone(), self.config.polling.block_interval);

        let service = Arc::new(RpcSimulationService::new(self.wallet.provider().clone()));
        let (builder, mut simulation) = SimulationStateBuilder::new(service);
        let builder =
            builder.with_market_ids(self.config.vault.market_ids.clone()).spawn(context.subscribe());

        let api = VaultApiClient::new(self.config.api.endpoint()?);
        let chain_id = self.wallet.chain_id();
        let every = self.config.polling.position_interval;
        let display = tokio::spawn(async move {
            let mut clock = tokio::time::interval(every);
            loop {
                clock.tick().await;
                match api.fetch_or_cached(vault, chain_id).await {
                    Ok(vault) => print_liquidity(&vault),
                    Err(err) => warn!(%err, "Failed to fetch the vault display"),
                }
            }
        });

        let (mut poller, mut positions) = Poller::new(self.config.polling.position_interval);
        let account = self.wallet.account();
        poller.watch(move || {
            let reader = reader.clone();
            async move { derive_position(reader.as_ref(), account, vault).await }
        });

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                changed = simulation.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    print_simulation(&simulation.borrow_and_update());
                }
                changed = positions.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    print_poll(&positions.borrow_and_update());
                }
            }
        }

        poller.stop();
        builder.abort();
        blocks.abort();
        display.abort();
        Ok(())
    }
}

fn print_liquidity(vault: &VaultDisplay) {
    if let Some(liquidity) = &vault.liquidity {
        println!(
            "  liquidity:   {} {} (${:.2})",
            format_amount(liquidity.underlying, vault.asset.decimals),
            vault.asset.symbol,
            liquidity.usd
        );
    }
}

fn print_position(position: &Position) {
    let underlying = position
        .underlying_equivalent()
        .map(|assets| format_amount(assets, position.underlying_decimals))
        .unwrap_or_else(|err| err.to_string());
    println!(
        "{} {} ≈ {} {}",
        format_amount(position.deposited_assets, position.vault_decimals),
        position.vault_symbol,
        underlying,
        position.underlying_symbol.as_deref().unwrap_or("?")
    );
}

fn print_poll(state: &PollState<Position>) {
    match (&state.value, &state.error) {
        (_, Some(error)) => println!("position: {error}"),
        (Some(position), None) => print_position(position),
        (None, None) if state.is_loading => println!("position: loading"),
        (None, None) => println!("position: no account connected"),
    }
}

fn print_simulation(state: &SimulationState) {
    match (&state.data, &state.error) {
        (_, Some(error)) => println!("simulation: {error}"),
        (Some(snapshot), None) => println!(
            "simulation: block {} ({} markets, {} holdings)",
            snapshot.block.number,
            snapshot.markets.len(),
            snapshot.holdings.values().map(|holdings| holdings.len()).sum::<usize>()
        ),
        (None, None) => println!("simulation: loading"),
    }
}

fn print_outcome(outcome: BundleOutcome) {
    for (requirement, tx_hash) in outcome.bundle.requirements.txs.iter().zip(&outcome.tx_hashes) {
        println!("{}: {tx_hash}", requirement.description);
    }
    if let Some(tx_hash) = outcome.tx_hashes.last() {
        println!("bundle: {tx_hash}");
    }
}

/// Parses a decimal fraction into WAD.
fn parse_wad(arg: &str) -> Result<U256, InputError> {
    parse_amount(arg, 18)
}

/// Parses a string representing seconds to a [`Duration`].
fn parse_duration_secs(arg: &str) -> Result<Duration, std::num::ParseIntError> {
    let seconds = arg.parse()?;
    Ok(Duration::from_secs(seconds))
}
