//! Transport-facing request values.
//!
//! Everything the transport collects for one exchange is modelled as an explicit value, so the
//! layers above never reach into process-wide state:
//!
//! - **Framed request**: the raw method, URI, headers and body plus derived data
//!   - [`FramedRequest`]: the immutable hand-off value
//!   - [`FramedRequestBuilder`]: builds one, deriving query and cookies when not given
//!
//! - **Parameters**: url-decoded parameter trees
//!   - [`Params`]: ordered query or form parameters with bracket nesting
//!   - [`Cookies`]: cookie name to value map
//!
//! - **Uploads**: uploaded file metadata
//!   - [`UploadedFile`]: one file descriptor
//!   - [`UploadedFileTree`]: descriptors grouped by field name
//!   - [`FileSpec`]: the raw `$_FILES`-shaped description descriptors are built from
//!
//! - **Server parameters**: [`ServerParams`], the environment snapshot
//!
//! - **Errors**: [`ParseError`] for framing failures

mod framed;
pub use framed::FramedRequest;
pub use framed::FramedRequestBuilder;
pub use framed::Parts;
pub use framed::cookies_of;
pub use framed::query_of;

mod params;
pub use params::Cookies;
pub use params::Params;
pub use params::parse_cookies;

mod upload;
pub use upload::FileSpec;
pub use upload::FileSpecMap;
pub use upload::UploadError;
pub use upload::UploadedFile;
pub use upload::UploadedFileTree;
pub use upload::UploadedFiles;

mod server_params;
pub use server_params::ServerParams;

mod error;
pub use error::ParseError;
