//! Transport-facing values for the comet request layer
//!
//! This crate holds the data a transport hands over for one HTTP exchange: the raw request
//! line, the typed headers, the buffered body and whatever the transport already collected
//! (query parameters, cookies, uploaded files, server parameters). It performs no I/O and
//! keeps no global state.
//!
//! # Example
//!
//! ```
//! use comet_http::protocol::{FramedRequest, ServerParams};
//!
//! let framed = FramedRequest::builder()
//!     .method("POST")
//!     .uri("/login?next=/home")
//!     .header("content-type", "application/x-www-form-urlencoded")
//!     .header("cookie", "SID=abc123")
//!     .body("user=zava&password=secret")
//!     .server_params([("REMOTE_ADDR", "127.0.0.1")].into_iter().collect::<ServerParams>())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(framed.query().get_str("next"), Some("/home"));
//! assert_eq!(framed.cookies().get("SID").map(String::as_str), Some("abc123"));
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: the framed request and the value types it carries
//! - [`codec`]: framing of a complete, buffered HTTP/1.x message
//!
//! # Limitations
//!
//! - HTTP/1.x only
//! - Chunked transfer coding must be decoded by the transport
//! - Maximum header size: 8KB
//! - Maximum number of headers: 64

pub mod codec;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
