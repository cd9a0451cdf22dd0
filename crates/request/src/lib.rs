//! Typed server requests for the comet framework
//!
//! This crate interprets a [`FramedRequest`](comet_http::protocol::FramedRequest) handed over by
//! a transport and produces a [`Request`]: an immutable-by-default value with a sanitized URI, a
//! content-type driven parsed body, normalized uploaded files, request attributes and a bound
//! session.
//!
//! # Example
//!
//! ```
//! use comet_http::protocol::FramedRequest;
//! use comet_request::RequestAssembler;
//!
//! let framed = FramedRequest::builder()
//!     .method("POST")
//!     .uri("//users//42")
//!     .header("content-type", "application/json")
//!     .header("cookie", "SID=abc123")
//!     .body(r#"{"name":"zava"}"#)
//!     .build()
//!     .unwrap();
//!
//! let request = RequestAssembler::default().assemble(framed).unwrap();
//!
//! assert_eq!(request.uri().path(), "/users/42");
//! assert_eq!(request.parsed_body().get("name").and_then(|v| v.as_str()), Some("zava"));
//! assert_eq!(request.session().map(|s| s.id().as_str()), Some("abc123"));
//!
//! let request = request.with_attribute("user_id", 42_u64);
//! assert_eq!(request.attribute::<u64>("user_id"), Some(&42));
//! ```
//!
//! # Modules
//!
//! - [`RequestAssembler`]: builds requests from framed input
//! - [`BodyDecoder`]: json and urlencoded bodies, by exact content type
//! - [`normalize_files`]: `$_FILES`-shaped descriptions to an [`UploadedFiles`](comet_http::protocol::UploadedFiles) tree
//! - [`SessionBinder`]: resumes or creates the request's session

mod assembler;
mod attributes;
mod body;
mod error;
mod files;
mod request;
mod session;
mod uri;

pub use assembler::{RequestAssembler, RequestAssemblerBuilder};
pub use attributes::Attributes;
pub use body::{BodyDecoder, ParsedBody};
pub use error::RequestError;
pub use files::{normalize_files, normalize_spec};
pub use request::Request;
pub use session::{DEFAULT_COOKIE_NAME, DefaultSessionFactory, Session, SessionBinder, SessionConfig, SessionFactory, SessionId};
pub use uri::{collapse_slashes, parse_uri};
