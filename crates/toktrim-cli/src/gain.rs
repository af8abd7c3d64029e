use std::path::Path;

use toktrim::config;
use toktrim::metrics;
use toktrim::output;
use toktrim::summary::{self, SessionSummary};

pub fn cmd_gain(
    session: Option<&str>,
    by_session: bool,
    json: bool,
    config_path: Option<&Path>,
) -> i32 {
    let cfg = config::load(config_path);
    let Some(path) = metrics::resolve_path(&cfg.metrics) else {
        eprintln!("[toktrim] error: cannot determine metrics path");
        return 1;
    };
    let mut records = match metrics::read_records(&path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("[toktrim] error: {e:#}");
            return 1;
        }
    };
    if let Some(id) = session {
        records.retain(|r| r.session_id == id);
    }

    if by_session {
        let summaries = summary::by_session(&records);
        if json {
            output::print_json(&summaries);
        } else if summaries.is_empty() {
            println!("toktrim: no savings recorded yet");
        } else {
            let rendered: Vec<String> = summaries
                .iter()
                .map(SessionSummary::render_verbose)
                .collect();
            println!("{}", rendered.join("\n\n"));
        }
        return 0;
    }

    let total = SessionSummary::from_records(session, &records);
    if json {
        output::print_json(&total);
    } else {
        println!("{}", total.render_verbose());
    }
    0
}
