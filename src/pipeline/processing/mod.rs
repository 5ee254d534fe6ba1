// Pipeline processing: cleaning, enrichment and aggregation

pub mod aggregate;
pub mod clean;
pub mod enrich;

pub use aggregate::{
    executive_rollup, region_totals, top_sub_categories, ExecutiveRow, RegionTotals,
};
pub use clean::{CleanReport, CleanedOrders, OrderCleaner};
pub use enrich::{DatasetScalars, EnrichedDataset, EnrichedOrder, OrderEnricher};
