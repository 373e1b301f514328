//! `search` command handler: filter and sort the local catalog.

use std::path::PathBuf;

use anyhow::{ensure, Context};
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use svcmkt_core::filter::distance_from;
use svcmkt_core::{
    apply_query, format_distance, load_catalog, AppConfig, Coordinates, Listing, ListingQuery,
    LocationFilter, PriceRange, SortKey,
};

use crate::locate::build_resolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchTarget {
    Services,
    Providers,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Case-insensitive text matched against names, descriptions and tags
    #[arg(long)]
    pub query: Option<String>,
    /// Exact category, or "all"
    #[arg(long)]
    pub category: Option<String>,
    /// Exact status, or "all"
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub min_price: Option<Decimal>,
    #[arg(long)]
    pub max_price: Option<Decimal>,
    /// newest, oldest, price-asc, price-desc, rating or popular
    #[arg(long, default_value = "newest")]
    pub sort: SortKey,
    #[arg(long, allow_negative_numbers = true, requires = "near_lon")]
    pub near_lat: Option<f64>,
    #[arg(long, allow_negative_numbers = true, requires = "near_lat")]
    pub near_lon: Option<f64>,
    /// Geocode this address and search around it
    #[arg(long, conflicts_with_all = ["near_lat", "near_lon"])]
    pub near_address: Option<String>,
    /// Search radius around the centre (defaults to SVCMKT_DEFAULT_RADIUS_KM)
    #[arg(long)]
    pub radius_km: Option<f64>,
    /// Catalog file (defaults to SVCMKT_CATALOG_PATH)
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

pub(crate) fn price_range(min: Option<Decimal>, max: Option<Decimal>) -> Option<PriceRange> {
    (min.is_some() || max.is_some()).then_some(PriceRange { min, max })
}

pub(crate) fn build_query(
    args: &SearchArgs,
    center: Option<Coordinates>,
    radius_km: f64,
) -> ListingQuery {
    ListingQuery {
        search: args.query.clone(),
        category: args.category.clone(),
        status: args.status.clone(),
        price_range: price_range(args.min_price, args.max_price),
        sort: args.sort,
        location: center.map(|center| LocationFilter { center, radius_km }),
    }
}

async fn resolve_center(
    config: &AppConfig,
    args: &SearchArgs,
) -> anyhow::Result<Option<Coordinates>> {
    if let (Some(lat), Some(lon)) = (args.near_lat, args.near_lon) {
        return Ok(Some(Coordinates::new(lat, lon)?));
    }

    let Some(address) = args.near_address.as_deref() else {
        return Ok(None);
    };

    let resolver = build_resolver(config)?;
    let info = resolver
        .geocode_address(address)
        .await?
        .context("--near-address is blank")?;
    let center = info
        .coordinates()
        .with_context(|| format!("no coordinates found for '{address}'"))?;
    tracing::info!(%center, location = %info.display_string(), "searching near address");
    Ok(Some(center))
}

pub(crate) async fn run_search(
    config: &AppConfig,
    target: SearchTarget,
    args: &SearchArgs,
) -> anyhow::Result<()> {
    let radius_km = args.radius_km.unwrap_or(config.default_radius_km);
    ensure!(
        radius_km.is_finite() && radius_km > 0.0,
        "--radius-km must be a positive number, got {radius_km}"
    );

    let path = args.catalog.as_ref().unwrap_or(&config.catalog_path);
    let catalog = load_catalog(path)
        .with_context(|| format!("failed to load catalog from {}", path.display()))?;

    let center = resolve_center(config, args).await?;
    let query = build_query(args, center, radius_km);
    tracing::debug!(?query, "applying catalog query");

    match target {
        SearchTarget::Services => {
            let results = apply_query(&catalog.services, &query);
            print_listings(&results, center, |service| {
                format!("{} ({})", service.title, service.provider_name)
            });
        }
        SearchTarget::Providers => {
            let results = apply_query(&catalog.providers, &query);
            print_listings(&results, center, |provider| match center {
                Some(point) if provider.serves(&point) => {
                    format!("{} [serves this area]", provider.name)
                }
                _ => provider.name.clone(),
            });
        }
    }

    Ok(())
}

fn print_listings<T: Listing>(
    records: &[&T],
    center: Option<Coordinates>,
    label: impl Fn(&T) -> String,
) {
    if records.is_empty() {
        println!("No matches.");
        return;
    }

    for record in records {
        let price = record
            .price()
            .map_or_else(|| "-".to_string(), |price| format!("${price}"));
        let distance = center
            .and_then(|center| distance_from(*record, &center))
            .map(|km| format!("  {}", format_distance(km)))
            .unwrap_or_default();
        println!(
            "{}  [{}/{}]  {price}  {:.1}★{distance}",
            label(*record),
            record.category(),
            record.status(),
            record.rating(),
        );
    }
    println!("{} result(s)", records.len());
}
