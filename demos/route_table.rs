use env_logger::Env;
use log::{info, warn};
use nvo_patterns::route::table::RouteTable;
use serde_json::json;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut table = RouteTable::new();
    for (pattern, handler) in [
        ("/hotels", "list_hotels"),
        ("/hotels/{hotel}", "get_hotel"),
        ("/hotels/{hotel}/rooms/{room:\\d+}", "get_room"),
        ("/static/{*file}", "static_files"),
        ("/**", "not_found"),
    ] {
        if let Err(e) = table.add_route(pattern, handler) {
            warn!("Skipping route {pattern}: {e}");
        }
    }

    for path in ["/hotels/ritz", "/hotels/ritz/rooms/12", "/static/css/site.css", "/bad%zz", "/nowhere"] {
        match table.find_match(path) {
            Ok(Some(found)) => info!(
                "{path} -> {}",
                json!({"handler": found.handler, "pattern": found.pattern.pattern_string(), "info": found.info})
            ),
            Ok(None) => info!("{path} -> no route"),
            Err(e) => warn!("{path} -> {} {e}", e.status_code()),
        }
    }
}
