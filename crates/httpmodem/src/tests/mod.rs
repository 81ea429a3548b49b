mod feed_good;
pub(crate) mod utils;
