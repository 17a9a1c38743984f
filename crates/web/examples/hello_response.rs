use cilantro_http::protocol::{Content, HeaderLookup, RawResponse, ResponseError, ResponseOptions, response};
use cilantro_web::{Request, Scope, logging};
use http::StatusCode;
use indoc::indoc;
use serde_json::json;
use tracing::{error, info};

fn main() {
    // run with CILANTRO_LOG=1 to see the debug events
    logging::init();

    let head = indoc! {r##"
    GET /hello?name=World&name=Rust HTTP/1.1
    Host: 127.0.0.1:8080
    Accept: application/json

    "##};

    let request = match Scope::parse(head.as_bytes()) {
        Ok(scope) => Request::new(scope),
        Err(e) => {
            error!(cause = %e, "failed to parse request head");
            return;
        }
    };
    info!(url = request.url(), accept = ?request.headers().get("accept"), "request received");

    let names = request.query_params().unwrap_or_default().shift_remove("name").unwrap_or_default();
    let reply = Content::json(&json!({"message": format!("Hello {}!", names.join(" and "))}))
        .and_then(|content| response(content, ResponseOptions::default()));
    print_response(reply);

    let redirect = response("/hello?name=World", ResponseOptions::default().status(StatusCode::FOUND));
    print_response(redirect);
}

fn print_response(reply: Result<RawResponse, ResponseError>) {
    match reply {
        Ok(reply) => {
            println!("{}", reply.status);
            for (name, value) in &reply.headers {
                println!("{}: {}", String::from_utf8_lossy(name), String::from_utf8_lossy(value));
            }
            println!();
            println!("{}", String::from_utf8_lossy(&reply.body));
        }
        Err(e) => error!(cause = %e, "failed to build response"),
    }
}
