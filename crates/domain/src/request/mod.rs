//! HTTP request domain types

mod api_request;
mod body;
mod key_value;
mod method;
mod resolved;

pub use api_request::ApiRequest;
pub use body::{BodyMode, GraphqlBody, RequestBody};
pub use key_value::{Header, KeyValue};
pub use method::HttpMethod;
pub use resolved::{ResolvedBody, ResolvedHeaders, ResolvedRequest};
