//! Types that represent the core data model, such as `Record` and the `Submission` that the
//! dashboard receives from its data entry form.
mod amount;
mod record;

pub use amount::Amount;
pub use record::{normalize_date, Entry, Record, Submission, DATE_FORMAT, HEADERS};
pub(crate) use record::RawRow;

use serde::{Deserialize, Serialize};

/// The sales regions offered by the data entry form.
///
/// These are not enforced by the store or the aggregation, which accept any string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    North,
    South,
    East,
    West,
}

impl Region {
    pub const ALL: [Region; 4] = [Region::North, Region::South, Region::East, Region::West];
}

serde_plain::derive_display_from_serialize!(Region);
serde_plain::derive_fromstr_from_deserialize!(Region);

/// The product lines offered by the data entry form.
///
/// Like `Region`, this is a convenience for the form and the sample generator only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Product {
    Electronics,
    Furniture,
    Apparel,
}

impl Product {
    pub const ALL: [Product; 3] = [Product::Electronics, Product::Furniture, Product::Apparel];
}

serde_plain::derive_display_from_serialize!(Product);
serde_plain::derive_fromstr_from_deserialize!(Product);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_display_and_parse() {
        assert_eq!(Region::West.to_string(), "West");
        assert_eq!("North".parse::<Region>().unwrap(), Region::North);
        assert!("north".parse::<Region>().is_err());
    }

    #[test]
    fn test_product_all() {
        let names: Vec<String> = Product::ALL.iter().map(|p| p.to_string()).collect();
        assert_eq!(names, vec!["Electronics", "Furniture", "Apparel"]);
    }
}
