use corsgate::{is_cors_request, CorsOptions, CorsService};
use http::{Request, Response};

fn service(options: CorsOptions) -> CorsService {
    CorsService::new(options).expect("test configuration should be valid")
}

fn request_with_origin(origin: &str) -> Request<()> {
    Request::builder()
        .header("Origin", origin)
        .body(())
        .expect("request should build")
}

fn vary_tokens(response: &Response<()>) -> Vec<String> {
    match response.headers().get("Vary") {
        Some(value) => value
            .to_str()
            .expect("vary should be a string")
            .split(',')
            .map(|t| t.trim().to_string())
            .collect(),
        None => Vec::new(),
    }
}

#[test]
fn test_wildcard_origin_without_credentials_is_static() {
    let cors = service(CorsOptions::new().allowed_origins(&["*"]));
    let mut response = Response::new(());
    cors.add_actual_request_headers(&mut response, &request_with_origin("https://a.example.com"));

    assert_eq!(
        response
            .headers()
            .get("Access-Control-Allow-Origin")
            .expect("allow-origin should be set"),
        "*"
    );
    assert!(!vary_tokens(&response).contains(&"Origin".to_string()));
}

#[test]
fn test_wildcard_origin_with_credentials_echoes_and_varies() {
    let cors = service(
        CorsOptions::new()
            .allowed_origins(&["*"])
            .supports_credentials(true),
    );
    let mut response = Response::new(());
    cors.add_actual_request_headers(&mut response, &request_with_origin("https://a.example.com"));

    // Never the literal `*` on a credentialed response.
    assert_eq!(
        response
            .headers()
            .get("Access-Control-Allow-Origin")
            .expect("allow-origin should be set"),
        "https://a.example.com"
    );
    assert_eq!(
        response
            .headers()
            .get("Access-Control-Allow-Credentials")
            .expect("credentials header should be set"),
        "true"
    );
    assert!(vary_tokens(&response).contains(&"Origin".to_string()));
}

#[test]
fn test_single_origin_is_static() {
    let cors = service(CorsOptions::new().allowed_origins(&["https://app.example.com"]));

    // The configured literal is emitted regardless of the request's origin,
    // so the response is cacheable without varying on Origin.
    let mut response = Response::new(());
    cors.add_actual_request_headers(&mut response, &request_with_origin("https://other.example"));
    assert_eq!(
        response
            .headers()
            .get("Access-Control-Allow-Origin")
            .expect("allow-origin should be set"),
        "https://app.example.com"
    );
    assert!(!vary_tokens(&response).contains(&"Origin".to_string()));
}

#[test]
fn test_multi_origin_echoes_allowed_origin_and_varies() {
    let cors = service(CorsOptions::new().allowed_origins(&[
        "https://app.example.com",
        "https://admin.example.com",
    ]));
    let mut response = Response::new(());
    cors.add_actual_request_headers(
        &mut response,
        &request_with_origin("https://admin.example.com"),
    );

    assert_eq!(
        response
            .headers()
            .get("Access-Control-Allow-Origin")
            .expect("allow-origin should be set"),
        "https://admin.example.com"
    );
    assert!(vary_tokens(&response).contains(&"Origin".to_string()));
}

#[test]
fn test_rejected_origin_gets_vary_only() {
    let cors = service(
        CorsOptions::new()
            .allowed_origins(&["https://app.example.com", "https://admin.example.com"])
            .supports_credentials(true)
            .exposed_headers(&["X-Total-Count"]),
    );
    let mut response = Response::new(());
    cors.add_actual_request_headers(&mut response, &request_with_origin("https://evil.example"));

    assert!(!response.headers().contains_key("Access-Control-Allow-Origin"));
    assert!(!response
        .headers()
        .contains_key("Access-Control-Allow-Credentials"));
    assert!(!response
        .headers()
        .contains_key("Access-Control-Expose-Headers"));
    assert!(vary_tokens(&response).contains(&"Origin".to_string()));
}

#[test]
fn test_request_without_origin_is_left_untouched() {
    let cors = service(CorsOptions::new().allowed_origins(&["*"]));
    let request = Request::builder().body(()).expect("request should build");
    assert!(!is_cors_request(&request));

    let mut response = Response::new(());
    cors.add_actual_request_headers(&mut response, &request);
    assert!(response.headers().is_empty());

    let mut response = Response::new(());
    cors.add_preflight_request_headers(&mut response, &request);
    assert!(response.headers().is_empty());
}

#[test]
fn test_empty_origin_value_still_classifies_as_cors() {
    let request = request_with_origin("");
    assert!(is_cors_request(&request));
}

#[test]
fn test_exposed_headers_are_joined() {
    let cors = service(
        CorsOptions::new()
            .allowed_origins(&["https://app.example.com"])
            .exposed_headers(&["X-Total-Count", "X-Request-Id"]),
    );
    let mut response = Response::new(());
    cors.add_actual_request_headers(
        &mut response,
        &request_with_origin("https://app.example.com"),
    );
    assert_eq!(
        response
            .headers()
            .get("Access-Control-Expose-Headers")
            .expect("expose-headers should be set"),
        "X-Total-Count, X-Request-Id"
    );
}

#[test]
fn test_no_exposed_headers_header_when_empty() {
    let cors = service(CorsOptions::new().allowed_origins(&["https://app.example.com"]));
    let mut response = Response::new(());
    cors.add_actual_request_headers(
        &mut response,
        &request_with_origin("https://app.example.com"),
    );
    assert!(!response
        .headers()
        .contains_key("Access-Control-Expose-Headers"));
}

#[test]
fn test_actual_response_carries_no_preflight_headers() {
    let cors = service(
        CorsOptions::new()
            .allowed_origins(&["https://app.example.com"])
            .allowed_methods(&["GET", "POST"])
            .allowed_headers(&["Content-Type"])
            .max_age(600),
    );
    let mut response = Response::new(());
    cors.add_actual_request_headers(
        &mut response,
        &request_with_origin("https://app.example.com"),
    );

    assert!(!response.headers().contains_key("Access-Control-Allow-Methods"));
    assert!(!response.headers().contains_key("Access-Control-Allow-Headers"));
    assert!(!response.headers().contains_key("Access-Control-Max-Age"));
}

#[test]
fn test_annotation_preserves_upstream_vary() {
    let cors = service(CorsOptions::new().allowed_origins(&[
        "https://app.example.com",
        "https://admin.example.com",
    ]));
    let mut response = Response::builder()
        .header("Vary", "Accept-Encoding")
        .body(())
        .expect("response should build");
    cors.add_actual_request_headers(
        &mut response,
        &request_with_origin("https://app.example.com"),
    );
    assert_eq!(
        response.headers().get("Vary").expect("vary should be set"),
        "Accept-Encoding, Origin"
    );
}
