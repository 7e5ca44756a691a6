pub mod accuracy;
pub mod aggregator;
pub mod aligner;
pub mod bucketer;
pub mod filter_resolver;
pub mod promotion;
pub mod ratio;
