use crate::domain::Segment;

/// Render seconds as an `HH:MM:SS,mmm` subtitle timestamp.
pub fn format_timestamp(seconds: f64) -> String {
    let total_millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let millis = total_millis % 1000;
    let total_secs = total_millis / 1000;
    let secs = total_secs % 60;
    let minutes = (total_secs / 60) % 60;
    let hours = total_secs / 3600;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Numbered subtitle blocks separated by a blank line.
pub fn to_srt(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            segment.index,
            format_timestamp(segment.start),
            format_timestamp(segment.end),
            segment.text
        ));
    }
    out
}

/// All segment texts joined by single spaces.
pub fn to_plaintext(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
