/// Identifier for the data source that namespaces every artifact.
/// Examples: `sephora`, `amazon_fr`
pub type SourceId = String;
/// Record field name inspected by dedup and keyword filtering.
/// Examples: `url`, `product_name`
pub type FieldName = String;
/// Keyword used for inclusion/exclusion filtering.
/// Examples: `refill`, `gift card`
pub type Keyword = String;
/// Discovered or to-collect URL text.
/// Example: `https://shop.example.com/p/shoe-a`
pub type UrlString = String;
/// Formatted timestamp prefix for artifact and snapshot file names.
/// Example: `2025_02_25_14_03_59`
pub type TimestampString = String;
