#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]

mod config;
mod error;
mod gateway;

pub use config::{CacheScope, GatewayConfig, DEFAULT_TIMEOUT};
pub use error::GatewayError;
pub use gateway::{Gateway, GatewayBuilder};

pub mod model {
    pub use shmarql_model::*;
}

pub mod rewrite {
    pub use shmarql_rewrite::*;
}

pub mod search {
    pub use shmarql_search::*;
}

pub mod cache {
    pub use shmarql_cache::*;
}

pub mod engine {
    pub use shmarql_engine::*;
}

pub mod results {
    pub use shmarql_results::*;
}
