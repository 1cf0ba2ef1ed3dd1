//! Path pattern parsing and matching for request paths and message routes.
//!
//! ```
//! use nvo_patterns::route::table::RouteTable;
//!
//! let mut table = RouteTable::new();
//! table.add_route("/hotels/{hotel}", "hotel").unwrap();
//! table.add_route("/hotels/**", "hotel_resources").unwrap();
//!
//! let found = table.find_match("/hotels/ritz").unwrap().unwrap();
//! assert_eq!(*found.handler, "hotel");
//! assert_eq!(found.info.get("hotel"), Some("ritz"));
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod path;
pub mod pattern;
pub mod route;

pub use cache::PatternCache;
pub use config::PatternConfig;
pub use error::{PathError, PathResult, PatternMessage, PatternParseError};
pub use path::{PathContainer, PathOptions};
pub use pattern::{PathMatchInfo, PathPattern, PathPatternParser, PathRemainingMatchInfo};
pub use route::table::{RouteMatch, RouteTable};
pub use route::{PathPatternRouteMatcher, RouteMatcher};
