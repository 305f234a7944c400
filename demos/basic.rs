//! A small road app served over hyper: JSON users, a login cookie, and a
//! page layout built from stored values.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl http://localhost:3000/users/42/          # 302 → /users/42
//!   curl -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice"}'
//!   curl -X PUT http://localhost:3000/users/42    # 405, allow: GET, DELETE
//!   curl -i -X POST http://localhost:3000/login -d 'user=alice'
//!   curl -b 'user=alice' http://localhost:3000/

use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{error, info};

use road::middleware::{
    BodyContext, BodyParser, CookieContext, CookieOptions, Cookies, Cors, Recover, SameSite,
    StoreContext, StoreVals, Trace, TrailingSlash,
};
use road::{
    from_fn, Arg, ContentType, Context, MethodNotAllowed, Next, Request, Response, Result, Road, Router,
    StatusCode,
};

#[derive(Deserialize)]
struct CreateUser {
    name: String,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut road = Road::new()
        .with(Trace::new())
        .with(Recover::new())
        .with(TrailingSlash::new())
        .with(Cors::new())
        .with(Cookies::new())
        .with(BodyParser::new())
        .with(StoreVals::new())
        .with(from_fn(layout));

    Router::new()
        .get("/", home)
        .get("/users/#id", get_user)
        .delete("/users/#id", delete_user)
        .post("/users", create_user)
        .post("/login", login)
        .apply_middleware(&mut road);
    road.push(MethodNotAllowed);

    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    info!(addr = %listener.local_addr()?, "road listening");

    let svc = road.into_service();
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(v) => v,
            Err(e) => {
                error!("accept error: {e}");
                continue;
            }
        };
        let svc = svc.clone();
        tokio::spawn(async move {
            if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                .serve_connection(TokioIo::new(stream), svc)
                .await
            {
                error!(%peer, "connection error: {e}");
            }
        });
    }
}

// Wraps HTML pages in a shell once the route has answered. Routes set the
// title with `store_val`.
async fn layout(cx: Context, req: Request, next: Next) -> Result<Response> {
    let res = next.run(req).await?;
    if res.header("content-type").is_some() || res.status() != 200 {
        return Ok(res);
    }
    let title: String = cx.get_val("title")?.unwrap_or_else(|| "road".into());
    let page = format!("<title>{title}</title><main>{}</main>", res.text());
    Ok(Response::builder().bytes(ContentType::Html, page.into_bytes()))
}

// GET /
async fn home(cx: Context, _req: Request, _next: Next) -> Result<String> {
    cx.store_val("title", String::from("Home"))?;
    Ok(match cx.cookie("user")? {
        Some(user) => format!("welcome back, {user}"),
        None => "hello, stranger".to_owned(),
    })
}

// GET /users/#id
async fn get_user(_cx: Context, req: Request, _next: Next) -> Result<Response> {
    let id = req.param("id").and_then(Arg::as_number).unwrap_or_default();
    let body = serde_json::to_vec(&serde_json::json!({ "id": id, "name": "alice" }))?;
    Ok(Response::json(body))
}

// POST /users
async fn create_user(cx: Context, _req: Request, _next: Next) -> Result<Response> {
    let input: CreateUser = match cx.json() {
        Ok(input) => input,
        Err(e) => return Ok(Response::builder().status(StatusCode::BAD_REQUEST).body(e.to_string())),
    };
    let body = serde_json::to_vec(&serde_json::json!({ "id": 99, "name": input.name }))?;
    Ok(Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/users/99")
        .json(body))
}

// DELETE /users/#id
async fn delete_user(_cx: Context, _req: Request, _next: Next) -> Result<StatusCode> {
    Ok(StatusCode::NO_CONTENT)
}

// POST /login with a form body `user=…`
async fn login(cx: Context, _req: Request, _next: Next) -> Result<Response> {
    let Some(user) = cx.parsed_body()?.and_then(|b| b.field("user").map(str::to_owned)) else {
        return Ok(Response::builder().status(StatusCode::BAD_REQUEST).body("missing user"));
    };
    cx.set_cookie(
        "user",
        &user,
        CookieOptions::new().path("/").http_only().same_site(SameSite::Lax).max_age(3600),
    )?;
    Ok(Response::redirect(StatusCode::SEE_OTHER, "/"))
}
