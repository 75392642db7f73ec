//! Capture command - run one insight capture from the terminal.

use crate::cli::Output;
use crate::config::Settings;
use crate::episode::EpisodeReference;
use crate::notion::format_timestamp;
use crate::pipeline::Pipeline;

/// Run a single capture and print the result.
pub async fn run_capture(
    title: &str,
    show: Option<String>,
    at: u32,
    url: Option<String>,
    settings: Settings,
) -> anyhow::Result<()> {
    let reference =
        EpisodeReference::normalize(Some(title.to_string()), show, Some(at), url)?;
    let pipeline = Pipeline::from_settings(&settings)?;

    let spinner = Output::spinner(&format!(
        "Capturing insight at {}...",
        format_timestamp(reference.timestamp_seconds)
    ));
    let result = pipeline.capture(&reference).await;
    spinner.finish_and_clear();

    let insight = result?;

    if insight.manual_mode {
        Output::warning(&format!(
            "No catalog match for '{}'. Save your own notes for this one.",
            insight.episode_title
        ));
        return Ok(());
    }

    Output::header(&insight.episode_title);
    if let Some(show) = &insight.show_name {
        Output::kv("Show", show);
    }
    Output::kv("Position", &format_timestamp(insight.timestamp_seconds));
    println!();

    for bullet in insight.summary.as_deref().unwrap_or_default() {
        Output::takeaway(bullet);
    }

    if let Some(transcript) = &insight.transcript {
        println!();
        Output::transcript_preview(transcript, 300);
    }

    Ok(())
}

/// Parse a playback position given as plain seconds or MM:SS / H:MM:SS.
pub fn parse_position(value: &str) -> Result<u32, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("position is empty".to_string());
    }

    if !value.contains(':') {
        return value
            .parse::<u32>()
            .map_err(|_| format!("invalid position: {value}"));
    }

    let parts: Vec<&str> = value.split(':').collect();
    if parts.len() > 3 {
        return Err(format!("invalid position: {value}"));
    }

    let mut seconds = 0u32;
    for part in &parts {
        let n = part
            .parse::<u32>()
            .map_err(|_| format!("invalid position: {value}"))?;
        seconds = seconds * 60 + n;
    }
    Ok(seconds)
}
