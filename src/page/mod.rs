//! HTML side of the pages: DOM model, table and selector builders, page views.

pub mod document;
pub mod dom;
pub mod selector;
pub mod table;
pub mod views;

pub use document::Document;
pub use dom::{Element, Node};
pub use selector::{SelectEvent, Selector};
pub use table::{map_prices_to_names, populate_table, populate_table_with_header};
pub use views::{
    MapView, averages_view, departments_view, log_fetch, map_figure, populate_averages,
    sale_points_view, statistics_view,
};
