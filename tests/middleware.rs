use serde::Deserialize;

use road::middleware::{
    BodyContext, BodyParser, CookieContext, CookieOptions, Cookies, Cors, ParsedBody, Recover,
    SameSite, StoreContext, StoreVals, Trace, TrailingSlash,
};
use road::{from_fn, Error, Headers, Method, Response, Road, Router, StatusCode};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn headers(pairs: &[(&str, &str)]) -> Headers {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

// ── Trailing slash ────────────────────────────────────────────────────────────

#[tokio::test]
async fn trailing_slashes_redirect_to_the_bare_path() {
    let road = Road::new()
        .with(TrailingSlash::new())
        .with(from_fn(|_cx, req, _next| async move { Ok(req.path().to_owned()) }));

    let res = road.request("GET", "/users/", None, vec![]).await.unwrap();
    assert_eq!(res.status(), 302);
    assert_eq!(res.header("location"), Some("/users"));
    assert!(res.body().is_empty());

    let res = road.request("GET", "/a/b/?x=1", None, vec![]).await.unwrap();
    assert_eq!(res.header("location"), Some("/a/b"));

    assert_eq!(road.request("GET", "/", None, vec![]).await.unwrap().text(), "/");
    assert_eq!(road.request("GET", "/users", None, vec![]).await.unwrap().text(), "/users");
}

// ── Cookies ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn cookies_are_read_set_and_merged() {
    let road = Road::new()
        .with(Cookies::new())
        .with(from_fn(|cx, _req, _next| async move {
            let before = cx.cookie("session")?.unwrap_or_default();
            cx.set_cookie("session", "new value", CookieOptions::new().path("/").http_only())?;
            cx.set_cookie("theme", "dark", CookieOptions::new().same_site(SameSite::Lax))?;

            let mut merged: Vec<_> = cx.cookies()?.into_iter().collect();
            merged.sort();
            Ok(format!("{before} {merged:?}"))
        }));

    let res = road
        .request("GET", "/", None, headers(&[("Cookie", "session=old; lang=en")]))
        .await
        .unwrap();

    assert_eq!(
        res.text(),
        r#"old [("lang", "en"), ("session", "new value"), ("theme", "dark")]"#
    );
    let set: Vec<_> = res.header_all("set-cookie").collect();
    assert_eq!(set, ["session=new%20value; Path=/; HttpOnly", "theme=dark; SameSite=Lax"]);
}

#[tokio::test]
async fn no_set_cookie_header_when_nothing_was_set() {
    let road = Road::new()
        .with(Cookies::new())
        .with(from_fn(|_cx, _req, _next| async { Ok("plain") }));

    let res = road.request("GET", "/", None, vec![]).await.unwrap();
    assert_eq!(res.header("set-cookie"), None);
}

#[tokio::test]
async fn invalid_cookie_names_are_rejected() {
    let road = Road::new()
        .with(Cookies::new())
        .with(from_fn(|cx, _req, _next| async move {
            cx.set_cookie("bad name", "v", CookieOptions::new())?;
            Ok("unreachable")
        }));

    let err = road.request("GET", "/", None, vec![]).await.unwrap_err();
    assert!(matches!(err, Error::InvalidCookie { name } if name == "bad name"));
}

#[tokio::test]
async fn capabilities_require_their_middleware() {
    let road = Road::new().with(from_fn(|cx, _req, _next| async move {
        let cookies = cx.cookies().unwrap_err();
        let body = cx.parsed_body().unwrap_err();
        let store = cx.store_val("k", 1u8).unwrap_err();
        Ok(format!("{} | {} | {}", cookies, body, store))
    }));

    let res = road.request("GET", "/", None, vec![]).await.unwrap();
    let text = res.text();
    assert!(text.contains("`cookies` is not available"));
    assert!(text.contains("`parsed_body` is not available"));
    assert!(text.contains("`store_val` is not available"));
}

// ── CORS ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn preflight_short_circuits_the_chain() {
    let road = Road::new()
        .with(Cors::new().allow_origins(&["https://app.test"]).max_age(60))
        .with(from_fn(|_cx, _req, _next| async {
            Err::<Response, _>(Error::msg("preflight reached the routes"))
        }));

    let res = road
        .request(
            "OPTIONS",
            "/api/items",
            None,
            headers(&[
                ("Origin", "https://app.test"),
                ("Access-Control-Request-Method", "POST"),
            ]),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.header("access-control-allow-origin"), Some("https://app.test"));
    assert_eq!(res.header("access-control-max-age"), Some("60"));
    assert!(res.header("access-control-allow-methods").unwrap().contains("POST"));
}

#[tokio::test]
async fn actual_requests_are_decorated_on_the_way_out() {
    let road = Road::new()
        .with(Cors::new().expose_headers(&["x-total"]))
        .with(from_fn(|_cx, _req, _next| async { Ok("items") }));

    let res = road
        .request("GET", "/items", None, headers(&[("Origin", "https://any.test")]))
        .await
        .unwrap();
    assert_eq!(res.text(), "items");
    assert_eq!(res.header("access-control-allow-origin"), Some("*"));
    assert_eq!(res.header("access-control-expose-headers"), Some("x-total"));
}

#[tokio::test]
async fn requests_without_origin_are_not_cors() {
    let road = Road::new()
        .with(Cors::new())
        .with(from_fn(|_cx, _req, _next| async { Ok("x") }));

    let res = road.request("GET", "/", None, vec![]).await.unwrap();
    assert!(res.headers().is_empty());

    // OPTIONS without the preflight header reaches the routes.
    let res = road
        .request("OPTIONS", "/", None, headers(&[("Origin", "https://a.test")]))
        .await
        .unwrap();
    assert_eq!(res.text(), "x");
}

#[tokio::test]
async fn disallowed_origins_get_no_cors_headers() {
    let road = Road::new()
        .with(Cors::new().allow_origins(&["https://app.test"]).allow_methods(&[Method::GET]))
        .with(from_fn(|_cx, _req, _next| async { Ok("x") }));

    let res = road
        .request("GET", "/", None, headers(&[("Origin", "https://evil.test")]))
        .await
        .unwrap();
    assert_eq!(res.text(), "x");
    assert_eq!(res.header("access-control-allow-origin"), None);
}

// ── Body parsing ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, PartialEq)]
struct NewUser {
    name: String,
    age: u32,
}

#[tokio::test]
async fn json_bodies_are_parsed_for_routes() {
    let mut road = Road::new().with(BodyParser::new());
    Router::new()
        .post("/users", from_fn(|cx, _req, _next| async move {
            let user: NewUser = cx.json()?;
            Ok(format!("{} is {}", user.name, user.age))
        }))
        .apply_middleware(&mut road);

    let res = road
        .request(
            "POST",
            "/users",
            Some(r#"{"name":"ada","age":36}"#.into()),
            headers(&[("Content-Type", "application/json; charset=utf-8")]),
        )
        .await
        .unwrap();
    assert_eq!(res.text(), "ada is 36");
}

#[tokio::test]
async fn malformed_json_rejects_the_request() {
    let road = Road::new()
        .with(BodyParser::new())
        .with(from_fn(|_cx, _req, _next| async { Ok("unreachable") }));

    let err = road
        .request(
            "POST",
            "/",
            Some("{not json".into()),
            headers(&[("content-type", "application/json")]),
        )
        .await
        .unwrap_err();

    let Error::Json(inner) = &err else { panic!("expected a JSON error, got {err:?}") };
    assert_eq!(err.to_string(), inner.to_string());
}

#[tokio::test]
async fn forms_and_text_are_parsed_by_content_type() {
    let road = Road::new()
        .with(BodyParser::new())
        .with(from_fn(|cx, _req, _next| async move {
            Ok(match cx.parsed_body()? {
                Some(ParsedBody::Form(_)) => {
                    let body = cx.parsed_body()?.unwrap();
                    format!("form {}", body.field("q").unwrap_or_default())
                }
                Some(ParsedBody::Text(t)) => format!("text {t}"),
                Some(ParsedBody::Json(_)) => "json".to_owned(),
                None => "none".to_owned(),
            })
        }));

    let form = road
        .request(
            "POST",
            "/",
            Some("q=hello+world&x=1".into()),
            headers(&[("content-type", "application/x-www-form-urlencoded")]),
        )
        .await
        .unwrap();
    assert_eq!(form.text(), "form hello world");

    let text = road.request("POST", "/", Some("raw".into()), vec![]).await.unwrap();
    assert_eq!(text.text(), "text raw");

    let none = road.request("GET", "/", None, vec![]).await.unwrap();
    assert_eq!(none.text(), "none");
}

// ── Value store ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn layouts_read_values_stored_by_routes() {
    let mut road = Road::new()
        .with(StoreVals::new())
        .with(from_fn(|cx, req, next| async move {
            let res = next.run(req).await?;
            let title: String = cx.get_val("title")?.unwrap_or_else(|| "Untitled".into());
            let mut wrapped = Response::new(format!("<h1>{title}</h1>{}", res.text()));
            wrapped.set_status(StatusCode::from_u16(res.status()).map_err(Error::other)?);
            Ok(wrapped)
        }));
    Router::new()
        .get("/", from_fn(|cx, _req, _next| async move {
            cx.store_val("title", String::from("Home"))?;
            Ok("<p>welcome</p>")
        }))
        .apply_middleware(&mut road);

    let res = road.request("GET", "/", None, vec![]).await.unwrap();
    assert_eq!(res.text(), "<h1>Home</h1><p>welcome</p>");

    let res = road.request("GET", "/missing", None, vec![]).await.unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(res.text(), "<h1>Untitled</h1>Page not found");
}

// ── Recover & Trace ───────────────────────────────────────────────────────────

#[tokio::test]
async fn recover_turns_errors_into_500s() {
    init_tracing();
    let road = Road::new()
        .with(Trace::new())
        .with(Recover::new())
        .with(from_fn(|_cx, _req, _next| async {
            Err::<Response, _>(Error::msg("boom"))
        }));

    let res = road.request("GET", "/", None, vec![]).await.unwrap();
    assert_eq!((res.status(), res.text().as_ref()), (500, "boom"));
}

#[tokio::test]
async fn recover_accepts_a_custom_mapping() {
    let road = Road::new()
        .with(Recover::with(|e| match e {
            Error::Json(_) => Response::builder().status(StatusCode::BAD_REQUEST).body("bad json"),
            _ => Response::empty(StatusCode::INTERNAL_SERVER_ERROR),
        }))
        .with(BodyParser::new());

    let res = road
        .request("POST", "/", Some("{".into()), headers(&[("content-type", "application/json")]))
        .await
        .unwrap();
    assert_eq!((res.status(), res.text().as_ref()), (400, "bad json"));

    // Successful responses pass through untouched.
    let res = road.request("GET", "/", None, vec![]).await.unwrap();
    assert_eq!(res, Response::not_found());
}

// ── Everything together ───────────────────────────────────────────────────────

#[tokio::test]
async fn a_full_stack_composes() {
    init_tracing();
    let mut road = Road::new()
        .with(Trace::new())
        .with(Recover::new())
        .with(TrailingSlash::new())
        .with(Cors::new())
        .with(Cookies::new())
        .with(BodyParser::new())
        .with(StoreVals::new());
    Router::new()
        .post("/login", from_fn(|cx, _req, _next| async move {
            let user = cx.parsed_body()?
                .and_then(|b| b.field("user").map(str::to_owned))
                .ok_or_else(|| Error::msg("missing user"))?;
            cx.set_cookie("user", &user, CookieOptions::new().max_age(3600))?;
            Ok(Response::redirect(StatusCode::SEE_OTHER, "/"))
        }))
        .apply_middleware(&mut road);

    let res = road
        .request(
            "POST",
            "/login",
            Some("user=ada".into()),
            headers(&[
                ("content-type", "application/x-www-form-urlencoded"),
                ("origin", "https://app.test"),
            ]),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), 303);
    assert_eq!(res.header("location"), Some("/"));
    assert_eq!(res.header("set-cookie"), Some("user=ada; Max-Age=3600"));
    assert_eq!(res.header("access-control-allow-origin"), Some("*"));

    let res = road.request("POST", "/login", None, vec![]).await.unwrap();
    assert_eq!((res.status(), res.text().as_ref()), (500, "missing user"));
}
