pub mod error;
pub mod requests;
pub mod responses;


pub use error::{RpcError, Result};
pub use requests::{generate_request_id, Request, RequestId, MethodName, Params};
pub use responses::{Response, RpcResult, Status};
