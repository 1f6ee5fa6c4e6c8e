mod client;
pub mod http_client;

pub use client::{InventoryApi, CONTAINERS_PATH, PRODUCTS_PATH};
pub use http_client::{HttpClient, ReqwestHttpClient, SimpleHttpResponse};
