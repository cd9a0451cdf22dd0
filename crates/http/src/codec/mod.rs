//! Framing of buffered HTTP messages.
//!
//! The transport normally hands this layer an already framed request. [`FrameDecoder`] covers
//! the case where a caller only holds the raw bytes of one complete message, for example a
//! test fixture or a server that buffers whole requests before dispatching them.
//!
//! # Example
//!
//! ```
//! use comet_http::codec::FrameDecoder;
//!
//! let raw = b"GET /users?page=2 HTTP/1.1\r\nHost: localhost\r\nCookie: SID=abc\r\n\r\n";
//! let framed = FrameDecoder::new().decode(raw).unwrap();
//!
//! assert_eq!(framed.method(), "GET");
//! assert_eq!(framed.query().get_str("page"), Some("2"));
//! assert_eq!(framed.cookies().get("SID").map(String::as_str), Some("abc"));
//! ```

mod frame_decoder;

pub use frame_decoder::FrameDecoder;
