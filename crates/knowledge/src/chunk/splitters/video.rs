//! Chapter-aware splitting of video descriptions.

use super::{text::split_text, Segment};
use crate::chunk::{KEY_CHAPTER_START_TIME, KEY_CHAPTER_TITLE, KEY_EMBED_URL, KEY_SOURCE};
use crate::config::SplitterSettings;
use magnet_core::AppResult;
use once_cell::sync::Lazy;
use regex::Regex;

static CHAPTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^##[ \t]+\[(\d{2}):(\d{2}):(\d{2})\][ \t]+(.+?)[ \t]*$").unwrap()
});

/// One timestamped chapter of a video description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub title: String,
    /// Offset from the start of the video, in seconds
    pub start_time: u64,
    /// Chapter text including its marker line
    pub content: String,
}

/// Parse `## [HH:MM:SS] Title` chapter markers.
pub fn parse_chapters(description: &str) -> Vec<Chapter> {
    let markers: Vec<_> = CHAPTER_RE.captures_iter(description).collect();

    markers
        .iter()
        .enumerate()
        .filter_map(|(index, caps)| {
            let marker = caps.get(0)?;
            let end = markers
                .get(index + 1)
                .and_then(|next| next.get(0))
                .map(|m| m.start())
                .unwrap_or(description.len());

            let hours: u64 = caps[1].parse().ok()?;
            let minutes: u64 = caps[2].parse().ok()?;
            let seconds: u64 = caps[3].parse().ok()?;

            Some(Chapter {
                title: caps[4].to_string(),
                start_time: hours * 3600 + minutes * 60 + seconds,
                content: description[marker.start()..end].trim().to_string(),
            })
        })
        .collect()
}

/// Split a video description into chapter segments.
///
/// `url_builder` receives the chapter start in seconds, or `None` for text
/// not tied to a chapter. Without chapters the whole description is split
/// with the text splitter and every segment gets `url_builder(None)`.
pub fn split_video(
    description: &str,
    settings: &SplitterSettings,
    url_builder: &dyn Fn(Option<u64>) -> String,
) -> AppResult<Vec<Segment>> {
    let chapters = parse_chapters(description);

    if chapters.is_empty() {
        let url = url_builder(None);
        return Ok(split_text(description, settings)?
            .into_iter()
            .map(|segment| segment.with(KEY_EMBED_URL, url.clone()).with(KEY_SOURCE, url.clone()))
            .collect());
    }

    let mut segments = Vec::with_capacity(chapters.len() + 1);

    let intro_end = CHAPTER_RE
        .find(description)
        .map(|m| m.start())
        .unwrap_or_default();
    let intro = description[..intro_end].trim();
    if !intro.is_empty() {
        let url = url_builder(None);
        segments.push(
            Segment::new(intro)
                .with(KEY_EMBED_URL, url.clone())
                .with(KEY_SOURCE, url),
        );
    }

    for chapter in chapters {
        let url = url_builder(Some(chapter.start_time));
        segments.push(
            Segment::new(chapter.content)
                .with(KEY_CHAPTER_START_TIME, chapter.start_time)
                .with(KEY_CHAPTER_TITLE, chapter.title)
                .with(KEY_EMBED_URL, url.clone())
                .with(KEY_SOURCE, url),
        );
    }

    tracing::debug!(segments = segments.len(), "Split video description by chapter");
    Ok(segments)
}

/// Build a chapter URL builder for a video link.
///
/// YouTube and Vimeo links become player embeds that seek with their own
/// parameters; other links get a `#t=` media fragment.
pub fn embed_url_builder(video_url: &str) -> Box<dyn Fn(Option<u64>) -> String + Send + Sync> {
    let parsed = url::Url::parse(video_url).ok();
    let host = parsed
        .as_ref()
        .and_then(|u| u.host_str())
        .map(|h| h.trim_start_matches("www.").trim_start_matches("m.").to_string())
        .unwrap_or_default();

    let youtube_id = parsed.as_ref().and_then(|u| match host.as_str() {
        "youtube.com" => u
            .query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.into_owned())
            .or_else(|| last_segment_after(u, "embed")),
        "youtu.be" => u.path_segments()?.next().map(str::to_string),
        _ => None,
    });

    if let Some(id) = youtube_id.filter(|id| !id.is_empty()) {
        let base = format!("https://www.youtube.com/embed/{}", id);
        return Box::new(move |start| match start {
            Some(seconds) => format!("{}?start={}", base, seconds),
            None => base.clone(),
        });
    }

    let vimeo_id = parsed.as_ref().and_then(|u| match host.as_str() {
        "vimeo.com" => u
            .path_segments()?
            .rev()
            .find(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
            .map(str::to_string),
        _ => None,
    });

    if let Some(id) = vimeo_id {
        let base = format!("https://player.vimeo.com/video/{}", id);
        return Box::new(move |start| match start {
            Some(seconds) => format!("{}#t={}s", base, seconds),
            None => base.clone(),
        });
    }

    let base = video_url.split('#').next().unwrap_or(video_url).to_string();
    Box::new(move |start| match start {
        Some(seconds) => format!("{}#t={}", base, seconds),
        None => base.clone(),
    })
}

fn last_segment_after(url: &url::Url, marker: &str) -> Option<String> {
    let mut segments = url.path_segments()?;
    segments.find(|s| *s == marker)?;
    segments.next().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTION: &str = "Welcome to the walkthrough.\n\n\
        ## [00:00:00] Introduction\nWhat we will cover.\n\n\
        ## [00:01:30] Installing\nRun the installer.\n\n\
        ## [01:02:03] Wrap up\nThanks for watching.\n";

    fn builder(start: Option<u64>) -> String {
        match start {
            Some(s) => format!("https://v/embed?t={}", s),
            None => "https://v/embed".to_string(),
        }
    }

    #[test]
    fn test_parse_chapters() {
        let chapters = parse_chapters(DESCRIPTION);

        assert_eq!(chapters.len(), 3);
        assert_eq!(chapters[0].title, "Introduction");
        assert_eq!(chapters[0].start_time, 0);
        assert_eq!(chapters[1].start_time, 90);
        assert_eq!(chapters[2].start_time, 3723);
        assert_eq!(
            chapters[1].content,
            "## [00:01:30] Installing\nRun the installer."
        );
    }

    #[test]
    fn test_split_by_chapter_with_intro() {
        let segments = split_video(DESCRIPTION, &SplitterSettings::default(), &builder).unwrap();

        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0].content, "Welcome to the walkthrough.");
        assert_eq!(segments[0].extra["embed_url"], "https://v/embed");
        assert!(segments[0].extra.get("chapter_start_time").is_none());

        assert_eq!(segments[2].extra["chapter_start_time"], 90);
        assert_eq!(segments[2].extra["chapter_title"], "Installing");
        assert_eq!(segments[2].extra["embed_url"], "https://v/embed?t=90");
        assert_eq!(segments[2].extra["source"], "https://v/embed?t=90");
    }

    #[test]
    fn test_blank_intro_is_dropped() {
        let description = "\n  \n## [00:00:05] Only\nBody";
        let segments = split_video(description, &SplitterSettings::default(), &builder).unwrap();

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].extra["chapter_start_time"], 5);
    }

    #[test]
    fn test_no_chapters_falls_back() {
        let description = "A short video about setup. No chapters here.";
        let segments = split_video(description, &SplitterSettings::default(), &builder).unwrap();

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].content, description);
        assert_eq!(segments[0].extra["embed_url"], "https://v/embed");
    }

    #[test]
    fn test_malformed_markers_are_text() {
        let description = "## [1:30] Not a chapter\n## 00:01:30 Neither";
        assert!(parse_chapters(description).is_empty());
    }

    #[test]
    fn test_youtube_builder() {
        let build = embed_url_builder("https://www.youtube.com/watch?v=abc123&list=x");
        assert_eq!(build(None), "https://www.youtube.com/embed/abc123");
        assert_eq!(build(Some(90)), "https://www.youtube.com/embed/abc123?start=90");

        let build = embed_url_builder("https://youtu.be/xyz");
        assert_eq!(build(Some(5)), "https://www.youtube.com/embed/xyz?start=5");
    }

    #[test]
    fn test_vimeo_and_generic_builders() {
        let build = embed_url_builder("https://vimeo.com/12345");
        assert_eq!(build(Some(60)), "https://player.vimeo.com/video/12345#t=60s");

        let build = embed_url_builder("https://cdn.example.com/videos/intro.mp4");
        assert_eq!(build(None), "https://cdn.example.com/videos/intro.mp4");
        assert_eq!(build(Some(12)), "https://cdn.example.com/videos/intro.mp4#t=12");
    }
}
