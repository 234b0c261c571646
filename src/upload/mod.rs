//! Upload submission.
//!
//! - **Transport**: [`Transport`] trait, the seam to the network
//! - **Reqwest**: [`ReqwestTransport`], multipart over HTTP
//! - **Dispatch**: [`dispatch`], strategy, progress and error attribution

pub mod dispatch;
pub mod reqwest_transport;
pub mod transport;

pub use dispatch::{DispatchOptions, UploadError, UploadResponse, UploadStrategy, dispatch};
pub use reqwest_transport::ReqwestTransport;
pub use transport::{FormPart, Transport, TransportError, TransportResponse};
