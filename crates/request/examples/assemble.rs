use std::io::{IsTerminal, Read};

use comet_http::codec::FrameDecoder;
use comet_request::{ParsedBody, RequestAssembler};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

// printf 'POST /users?page=2 HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: 15\r\n\r\n{"name":"zava"}' | cargo run --example assemble
const FALLBACK: &str = "POST //users//42?tab=orders HTTP/1.1\r\n\
    Host: 127.0.0.1:8080\r\n\
    Content-Type: application/x-www-form-urlencoded\r\n\
    Cookie: SID=abc123; theme=dark\r\n\
    Content-Length: 33\r\n\
    \r\n\
    name=zava&tags[]=rust&tags[]=http";

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::TRACE).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut raw = Vec::new();
    let mut stdin = std::io::stdin();
    if !stdin.is_terminal()
        && let Err(e) = stdin.read_to_end(&mut raw)
    {
        error!(cause = %e, "read stdin error");
        return;
    }
    if raw.is_empty() {
        raw.extend_from_slice(FALLBACK.as_bytes());
    }

    let framed = match FrameDecoder::new().decode(&raw) {
        Ok(framed) => framed,
        Err(e) => {
            error!(cause = %e, "framing error");
            return;
        }
    };

    let assembler = RequestAssembler::default();
    let request = match assembler.assemble(framed) {
        Ok(request) => request,
        Err(e) => {
            error!(cause = %e, "assemble error");
            return;
        }
    };

    info!(method = %request.method(), uri = %request.uri(), "request");
    match request.parsed_body() {
        ParsedBody::Absent => info!("no parsed body"),
        ParsedBody::Json(value) => info!(%value, "json body"),
        ParsedBody::Form(params) => info!(form = ?params, "form body"),
    }
    info!(query = ?request.query_params(), cookies = ?request.cookie_params(), "params");

    if let Some(session) = request.session() {
        info!(session_id = %session.id(), new = session.is_new(), "session");
    }
}
