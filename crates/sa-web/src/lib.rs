//! Survey analytics presentation service.
//!
//! Fetches every analytics endpoint and renders the results, two forms and
//! the latest chart into one HTML page.
//!
//! - [`client`]: blocking upstream client, one [`Fetch`] per section
//! - [`form`]: form field decoding
//! - [`visual`]: chart persistence as JPEG
//! - [`page`]: HTML rendering
//! - [`server`]: routing, index flow and static files

pub mod client;
pub mod error;
pub mod form;
pub mod page;
pub mod server;
pub mod visual;

pub use client::{Fetch, PageData, UpstreamClient};
pub use error::{FetchError, Result, WebError};
pub use page::{PageContext, PageRenderer};
pub use server::{dispatch, WebServer, WebState};
