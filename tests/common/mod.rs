use nvo_patterns::path::{PathContainer, PathOptions};
use nvo_patterns::pattern::{PathPattern, PathPatternParser};

#[allow(dead_code)]
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[allow(dead_code)]
pub fn pattern(text: &str) -> PathPattern {
    PathPatternParser::new().parse(text).unwrap()
}

#[allow(dead_code)]
pub fn http_path(text: &str) -> PathContainer {
    PathContainer::parse_http_path(text).unwrap()
}

#[allow(dead_code)]
pub fn route(text: &str) -> PathContainer {
    PathContainer::parse_path(text, PathOptions::MESSAGE_ROUTE).unwrap()
}
