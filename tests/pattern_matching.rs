mod common;

use std::time::{Duration, Instant};

use common::{http_path, init_logger, pattern, route};
use nvo_patterns::error::PatternMessage;
use nvo_patterns::path::PathOptions;
use nvo_patterns::pattern::{PathPattern, PathPatternParser};

#[test]
fn test_captures_bind_decoded_segment_text() {
    init_logger();
    let cases = [
        ("/hotels/{hotel}", "/hotels/ritz", "hotel", "ritz"),
        ("/hotels/{hotel}", "/hotels/the%20ritz", "hotel", "the ritz"),
        ("/files/{name}", "/files/a%2Fb", "name", "a/b"),
        ("/{id:\\d+}", "/42", "id", "42"),
    ];
    for (p, path, name, expected) in cases {
        let pattern = pattern(p);
        let path = http_path(path);
        assert!(pattern.matches(&path), "{} should match {}", p, path);
        let info = pattern.match_and_extract(&path).unwrap();
        assert_eq!(info.get(name), Some(expected));
    }
}

#[test]
fn test_encoded_separator_is_segment_content() {
    let parser = PathPatternParser::new().with_path_options(PathOptions::MESSAGE_ROUTE);
    let pattern = parser.parse("projects.{project}").unwrap();

    let info = pattern.match_and_extract(&route("projects.spring%2Eframework")).unwrap();
    assert_eq!(info.get("project"), Some("spring.framework"));
    assert!(!pattern.matches(&route("projects.spring.framework")));
}

#[test]
fn test_capture_the_rest_must_be_last() {
    let err = PathPatternParser::new().parse("/foo/{*rest}/bar").unwrap_err();
    assert_eq!(err.message, PatternMessage::NoMoreDataExpectedAfterCaptureTheRest);
    assert!(err.to_detailed_string().starts_with("/foo/{*rest}/bar\n            ^"));

    let info = pattern("/foo/{*rest}").match_and_extract(&http_path("/foo/a/b")).unwrap();
    assert_eq!(info.get("rest"), Some("/a/b"));
}

#[test]
fn test_specificity_ordering() {
    let literal = pattern("/foo/bar");
    let capture = pattern("/foo/{id}");
    let wildcard = pattern("/foo/*");
    let path = http_path("/foo/bar");
    assert!([&literal, &capture, &wildcard].iter().all(|p| p.matches(&path)));

    let mut sorted = vec![wildcard.clone(), literal.clone(), capture.clone()];
    sorted.sort_by(PathPattern::specificity_cmp);
    assert_eq!(sorted, vec![literal, capture, wildcard]);
}

#[test]
fn test_empty_pattern_and_catch_all() {
    assert!(pattern("").matches(&http_path("")));
    assert!(!pattern("").matches(&http_path("/foo")));

    let catch_all = pattern("/**");
    for path in ["/", "/a", "/a/b/c", "//x", "/a%20b/;c=d"] {
        assert!(catch_all.matches(&http_path(path)), "/** should match {}", path);
    }
    assert!(catch_all.matches(&http_path("")));
}

#[test]
fn test_parsing_is_idempotent() {
    for text in ["/hotels/{hotel}/**", "/{name}-{version}.jar", "/a/**/b", "/f?o/{*rest}", ""] {
        let first = pattern(text);
        let second = pattern(text);
        assert_eq!(first, second);
        assert_eq!(first.head(), second.head());
        assert_eq!(first.to_chain_string(), second.to_chain_string());
    }
}

#[test]
fn test_full_sub_path_is_same_container() {
    let path = http_path("/a/b;x=1/c");
    let full = path.sub_path(0, path.len()).unwrap();
    assert_eq!(full, path);
    assert!(full.shares_elements_with(&path));
}

#[test]
fn test_multi_segment_wildcard_backtracks() {
    let p = pattern("/a/**/b/c");
    assert!(p.matches(&http_path("/a/x/b/y/b/c")));
    assert!(p.matches(&http_path("/a/b/c")));
    assert!(!p.matches(&http_path("/a/x/b/y")));

    let p = pattern("/a/**/b");
    assert!(p.matches(&http_path("/a/b")));
    assert!(p.matches(&http_path("/a/x/y/b")));
    assert!(!p.matches(&http_path("/a/x/c")));
}

#[test]
fn test_repeated_multi_segment_wildcards_on_long_paths() {
    let p = pattern("/**/a/**/a/**/a/**/b");
    let long = "/a".repeat(400);

    let started = Instant::now();
    assert!(!p.matches(&http_path(&long)));
    assert!(p.matches(&http_path(&format!("{}/b", long))));
    assert!(started.elapsed() < Duration::from_secs(5), "took {:?}", started.elapsed());
}

#[test]
fn test_failed_alternatives_leave_no_bindings() {
    let info = pattern("/**/{name}/end").match_and_extract(&http_path("/a/b/end")).unwrap();
    assert_eq!(info.uri_variables.len(), 1);
    assert_eq!(info.get("name"), Some("b"));
}

#[test]
fn test_regex_segments() {
    let info = pattern("/{name}-{version}.jar")
        .match_and_extract(&http_path("/spring-web-5.3.jar"))
        .unwrap();
    assert_eq!(info.get("name"), Some("spring-web"));
    assert_eq!(info.get("version"), Some("5.3"));

    assert!(pattern("/*.html").matches(&http_path("/index.html")));
    assert!(!pattern("/*.html").matches(&http_path("/index.htm")));
    assert!(!pattern("/{id:\\d+}").matches(&http_path("/abc")));
}

#[test]
fn test_single_char_wildcard() {
    let p = pattern("/f?o");
    assert!(p.matches(&http_path("/foo")));
    assert!(p.matches(&http_path("/fxo")));
    assert!(!p.matches(&http_path("/fooo")));
}

#[test]
fn test_case_insensitive_literals() {
    let p = PathPatternParser::new().with_case_sensitive(false).parse("/Hotels/{hotel}").unwrap();
    assert!(p.matches(&http_path("/hotels/ritz")));
    assert!(p.matches(&http_path("/HOTELS/ritz")));
    assert!(!pattern("/Hotels").matches(&http_path("/hotels")));
}

#[test]
fn test_optional_trailing_separator() {
    let lenient = PathPatternParser::new()
        .with_match_optional_trailing_separator(true)
        .parse("/foo/{id}")
        .unwrap();
    assert!(lenient.matches(&http_path("/foo/1/")));
    assert!(!lenient.matches(&http_path("/foo/1//")));
    assert!(!pattern("/foo/{id}").matches(&http_path("/foo/1/")));
}

#[test]
fn test_matrix_variables() {
    let info = pattern("/cars/{car}")
        .match_and_extract(&http_path("/cars/bmw;color=red,blue;year=2012"))
        .unwrap();
    assert_eq!(info.get("car"), Some("bmw"));

    let matrix = &info.matrix_variables["car"];
    assert_eq!(matrix["color"], vec!["red".to_string(), "blue".to_string()]);
    assert_eq!(matrix["year"], vec!["2012".to_string()]);
}

#[test]
fn test_match_info_serializes() {
    let info = pattern("/hotels/{hotel}").match_and_extract(&http_path("/hotels/ritz")).unwrap();
    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["uri_variables"]["hotel"], serde_json::json!("ritz"));
}

#[test]
fn test_match_start_of_path() {
    let info = pattern("/api/{version}")
        .match_start_of_path(&http_path("/api/v1/hotels/ritz"))
        .unwrap();
    assert_eq!(info.path_matched.value(), "/api/v1");
    assert_eq!(info.path_remaining.value(), "/hotels/ritz");
    assert_eq!(info.match_info.get("version"), Some("v1"));

    let rest = pattern("/hotels/{hotel}").match_start_of_path(&info.path_remaining).unwrap();
    assert!(rest.path_remaining.is_empty());
}

#[test]
fn test_decode_errors_are_client_errors() {
    let err = nvo_patterns::path::PathContainer::parse_http_path("/foo%zz").unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert!(err.is_client_error());
}
