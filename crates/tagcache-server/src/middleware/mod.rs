//! Middleware applied to every route, outermost first:
//! [`request_id_middleware`] then [`logging_middleware`].

mod logging;
mod request_id;

pub use logging::logging_middleware;
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
