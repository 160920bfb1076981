//! Result rendering.

use console::style;

use pwcscrape::RankedResult;

/// One `[stars, "title", "link"]` row per paper.
pub fn print_rows(result: &RankedResult) {
    for paper in &result.papers {
        println!("[{}, {:?}, {:?}]", paper.stars, paper.title, paper.link);
    }
}

pub fn print_json(result: &RankedResult) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&result.papers)?);
    Ok(())
}

/// Tell the user on stderr when fewer papers than requested came back.
pub fn report_partial(result: &RankedResult) {
    if !result.is_partial() {
        return;
    }
    let stop = result
        .stop
        .map(|s| s.to_string())
        .unwrap_or_else(|| "n/a".to_string());
    eprintln!(
        "{} only {} of {} requested papers qualified ({} candidates, scrolling stopped: {})",
        style("!").yellow(),
        result.len(),
        result.requested,
        result.candidates,
        stop
    );
}
