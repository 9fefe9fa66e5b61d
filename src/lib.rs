//! carburants
//!
//! A Rust library for fetching French fuel-price data and rendering it as HTML tables,
//! a department choropleth and a sale-point marker map. Pairs with the `carburants` CLI.
//!
//! ### Features
//! - Fetch sale-point listings and department metrics from the published data repository
//! - Color departments into 8 price buckets with a matching legend
//! - Drive a map through its lifecycle (hover, click, zoom, markers) behind a backend trait
//! - Render the map to SVG/PNG and wrap everything in a self-contained HTML page
//! - Build department metrics from a listing and export tables as CSV or JSON
//!
//! ### Example
//! ```no_run
//! use carburants::{DataFetcher, MapOptions, StaticMap};
//! use carburants::page::{departments_view, map_figure};
//!
//! let fetcher = DataFetcher::default();
//! let points = fetcher.get_data()?;
//! let metrics = carburants::stats::build_metrics(&points);
//! let regions = carburants::map::parse_regions(&std::fs::read_to_string("departments.json")?)?;
//! let view = departments_view(&metrics, regions, StaticMap::new(), Some("Gazole"), MapOptions::default())?;
//! view.controller.backend().render("gazole.svg", 800, 600)?;
//! let figure = map_figure(view.controller.backend(), "map", 800, 600)?;
//! println!("{}", figure.to_html().len());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod choropleth;
pub mod config;
pub mod error;
pub mod fetch;
pub mod map;
pub mod models;
pub mod page;
pub mod stats;
pub mod storage;
pub mod viz;

pub use config::Config;
pub use error::{FetchError, MapError, PageError};
pub use fetch::DataFetcher;
pub use map::{MapBackend, MapController, MapOptions};
pub use models::{FuelCatalog, Metrics, RegionValue, SalePoint, SalePoints};
pub use viz::StaticMap;
