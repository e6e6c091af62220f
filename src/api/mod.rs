pub mod client;
pub mod transport;

pub use client::{handle_response, ApiClient, FetchMode};
pub use transport::{ApiRequest, Body, FormPart, Method, RawResponse, ReqwestTransport, Transport};
