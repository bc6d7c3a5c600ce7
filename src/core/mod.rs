//! Order analysis feeding the manifest layout

pub mod attributes;
pub mod classifier;
pub mod gifts;
pub mod image_placer;

pub use attributes::{
    AttributeExtractor, MetadataSource, StandardAttributeSource, StructuredFieldSource,
};
pub use classifier::{
    unit_price, Classification, LineItemClassifier, SimpleGift, SoldItem, ZeroQuantityPolicy,
};
pub use gifts::{compare_values, AttributeGifts, GiftAggregate, GiftAggregator, ProductGifts};
pub use image_placer::{ImageBox, ImagePlacement, ImagePlacer};
