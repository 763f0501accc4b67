// Rating engine: percentiles, league distributions, composite ratings,
// career history, blended strength, skill grades and similarity.

pub mod blend;
pub mod composite;
pub mod distribution;
pub mod grades;
pub mod historical;
pub mod percentile;
pub mod similarity;
