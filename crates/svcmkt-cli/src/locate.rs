//! `locate`, `geocode` and `reverse` command handlers.

use anyhow::{bail, Context};
use clap::ValueEnum;
use svcmkt_core::{AppConfig, Coordinates, LocationInfo};
use svcmkt_location::{
    ConfiguredSource, ControllerOptions, LocationClient, LocationController, LocationResolver,
    PositionOptions, Resolution, Strategy,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    Device,
    Ip,
    Address,
}

/// Resolver backed by the configured device source and the location API.
pub(crate) fn build_resolver(
    config: &AppConfig,
) -> anyhow::Result<LocationResolver<ConfiguredSource>> {
    let client = LocationClient::from_config(config).context("failed to build location client")?;
    let source = ConfiguredSource::from_config(config);
    Ok(LocationResolver::new(
        std::sync::Arc::new(source),
        client,
        PositionOptions::from_config(config),
    ))
}

/// Turns `--strategy` flags into a chain. No flags means the default chain,
/// or just the address when `--address` is given on its own.
pub(crate) fn build_chain(
    strategies: &[StrategyArg],
    address: Option<&str>,
) -> anyhow::Result<Vec<Strategy>> {
    if strategies.is_empty() {
        return Ok(match address {
            Some(address) => vec![Strategy::Address(address.to_string())],
            None => Strategy::default_chain(),
        });
    }

    strategies
        .iter()
        .map(|strategy| match strategy {
            StrategyArg::Device => Ok(Strategy::Device),
            StrategyArg::Ip => Ok(Strategy::Ip),
            StrategyArg::Address => match address {
                Some(address) => Ok(Strategy::Address(address.to_string())),
                None => bail!("--strategy address requires --address"),
            },
        })
        .collect()
}

pub(crate) async fn run_locate(
    config: &AppConfig,
    strategies: &[StrategyArg],
    address: Option<&str>,
) -> anyhow::Result<()> {
    let chain = build_chain(strategies, address)?;
    let controller = LocationController::new(
        build_resolver(config)?,
        ControllerOptions::from_config(config),
    );

    let permission = controller.mount().await;
    tracing::debug!(%permission, "device permission");

    let outcome = controller.locate_with(&chain).await;
    controller.teardown();
    let resolution = outcome.context("could not determine location")?;

    print_resolution(&resolution);
    Ok(())
}

pub(crate) async fn run_geocode(config: &AppConfig, address: &str) -> anyhow::Result<()> {
    let resolver = build_resolver(config)?;
    match resolver.geocode_address(address).await? {
        Some(info) => print_info(&info),
        None => println!("Nothing to geocode: address is blank"),
    }
    Ok(())
}

pub(crate) async fn run_reverse(config: &AppConfig, lat: f64, lon: f64) -> anyhow::Result<()> {
    let position = Coordinates::new(lat, lon)?;
    let resolver = build_resolver(config)?;
    let info = resolver.reverse_geocode(position).await?;
    print_info(&LocationInfo::resolved(position, info.details().clone()));
    Ok(())
}

fn print_resolution(resolution: &Resolution) {
    println!("Resolved via {}", resolution.strategy);
    match (&resolution.info, resolution.coordinates) {
        (Some(info), _) => print_info(info),
        (None, Some(position)) => {
            println!("Position: {position}");
            println!("Location: Unknown location");
        }
        (None, None) => println!("Location: Unknown location"),
    }
}

fn print_info(info: &LocationInfo) {
    if let Some(position) = info.coordinates() {
        println!("Position: {position}");
    }
    println!("Location: {}", info.display_string());
    if let Some(postal_code) = &info.details().postal_code {
        println!("Postal code: {postal_code}");
    }
}
