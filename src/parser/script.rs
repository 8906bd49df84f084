//! Parsing of free-text comic scripts.
//!
//! Scripts come back from a language model, so nothing about their layout is
//! guaranteed. Everything here tolerates missing sections and returns the best
//! partial result instead of failing.

use regex::Regex;
use std::sync::OnceLock;

use crate::domain::{PANEL_COUNT, PanelFields, PanelSummaries, PLACEHOLDER_SUMMARY};

const SUMMARY_MARKER: &str = "Summary:";

fn panel_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^[\s*#>\-]*panel\s+(\d+)\s*\**\s*:\s*\**\s*(.*)$").expect("Invalid regex")
    })
}

/// Splits a raw script into the panel section and the summary section.
///
/// The summary starts at the literal `Summary:` marker. Without a marker the
/// whole text is both script and summary.
#[must_use]
pub fn split_summary(raw: &str) -> (&str, &str) {
    raw.find(SUMMARY_MARKER)
        .map_or((raw, raw), |idx| (&raw[..idx], &raw[idx..]))
}

/// Extracts exactly [`PANEL_COUNT`] captions from a script.
///
/// Captions are collected in the order they appear. The numeric panel index
/// is not used for ordering: a script listing "Panel 2" before "Panel 1" keeps
/// that order.
#[must_use]
pub fn parse_summaries(raw: &str) -> PanelSummaries {
    let (_, region) = split_summary(raw);

    let mut captions: Vec<String> = Vec::new();
    let mut current: Option<String> = None;

    for line in region.lines() {
        if let Some(caps) = panel_header().captures(line) {
            if let Some(done) = current.take() {
                captions.push(done);
            }
            let rest = caps.get(2).map_or("", |m| m.as_str());
            current = Some(clean_caption(rest));
            continue;
        }

        let Some(caption) = current.as_mut() else {
            continue;
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !caption.is_empty() {
                captions.push(std::mem::take(caption));
                current = None;
            }
            continue;
        }

        if !caption.is_empty() {
            caption.push(' ');
        }
        caption.push_str(&clean_caption(trimmed));
    }

    if let Some(done) = current {
        captions.push(done);
    }

    PanelSummaries::from_captions(captions.into_iter().map(|c| {
        if c.is_empty() {
            PLACEHOLDER_SUMMARY.to_string()
        } else {
            c
        }
    }))
}

fn clean_caption(text: &str) -> String {
    text.trim().trim_matches('*').trim().to_string()
}

/// Extracts the visual fields of the first [`PANEL_COUNT`] panel blocks.
///
/// Only the part before the summary section is searched. Returns fewer than
/// [`PANEL_COUNT`] entries when the script has fewer panel headers.
#[must_use]
pub fn parse_panels(raw: &str) -> Vec<PanelFields> {
    let (script, _) = split_summary(raw);

    let mut blocks: Vec<String> = Vec::new();
    for line in script.lines() {
        if let Some(caps) = panel_header().captures(line) {
            if blocks.len() == PANEL_COUNT {
                break;
            }
            let mut block = String::new();
            if let Some(rest) = caps.get(2) {
                block.push_str(rest.as_str());
                block.push('\n');
            }
            blocks.push(block);
        } else if let Some(block) = blocks.last_mut() {
            block.push_str(line);
            block.push('\n');
        }
    }

    blocks.iter().map(|b| parse_fields(b)).collect()
}

fn field_patterns() -> &'static [Regex; 5] {
    static RE: OnceLock<[Regex; 5]> = OnceLock::new();
    RE.get_or_init(|| {
        let build = |names: &str| {
            Regex::new(&format!(
                r"(?im)^[\s*#>\-]*(?:{names})\s*\**\s*:\s*\**\s*(.+)$"
            ))
            .expect("Invalid regex")
        };
        [
            build(r"frame|framing|shot|panel description"),
            build(r"setting|scene|background"),
            build(r"characters?"),
            build(r"action|actions|actions and poses|poses?"),
            build(r"dialogue|dialog|speech"),
        ]
    })
}

fn parse_fields(block: &str) -> PanelFields {
    let [frame, setting, characters, action, dialogue] = field_patterns();
    let find = |re: &Regex| {
        re.captures(block)
            .and_then(|c| c.get(1))
            .map(|m| clean_caption(m.as_str()))
            .filter(|s| !s.is_empty())
    };

    PanelFields {
        frame: find(frame),
        setting: find(setting),
        characters: find(characters),
        action: find(action),
        dialogue: find(dialogue),
    }
}

/// Strips markdown emphasis and blank lines from a script before it is shown
/// or used as a prompt.
#[must_use]
pub fn format_script(text: &str) -> String {
    text.replace(['+', '*'], "")
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "\
Panel 1:
Frame: Wide shot of Main Street.
Setting: Downtown Lillooet at dawn.
Characters: A black bear, a startled baker.
Action: The bear sniffs a bakery door.
Dialogue: Baker: \"Not the croissants!\"

Panel 2:
Frame: Close-up.
Action: The bear grabs a bun.

Panel 3:
Setting: Riverside park.
Dialogue: Officer: \"Back to the woods, buddy.\"

Summary:
Panel 1: A bear wanders down Main Street at dawn.
Panel 2: The bear raids the bakery.
Panel 3: Conservation officers guide it home.
";

    fn script_with_panels(n: usize) -> String {
        let mut text = String::from("Summary:\n");
        for i in 1..=n {
            text.push_str(&format!("Panel {i}: caption {i}\n"));
        }
        text
    }

    #[test]
    fn parses_three_summaries() {
        let summaries = parse_summaries(WELL_FORMED);
        assert_eq!(
            summaries.as_slice(),
            [
                "A bear wanders down Main Street at dawn.",
                "The bear raids the bakery.",
                "Conservation officers guide it home."
            ]
        );
    }

    #[test]
    fn always_returns_three_summaries() {
        for n in [0, 1, 3, 7] {
            let summaries = parse_summaries(&script_with_panels(n));
            assert_eq!(summaries.len(), 3, "input with {n} panels");
        }

        assert_eq!(parse_summaries("").len(), 3);
        assert_eq!(parse_summaries("garbage with no structure").len(), 3);
    }

    #[test]
    fn pads_with_placeholder() {
        let summaries = parse_summaries(&script_with_panels(1));
        assert_eq!(
            summaries.as_slice(),
            ["caption 1", PLACEHOLDER_SUMMARY, PLACEHOLDER_SUMMARY]
        );
    }

    #[test]
    fn keeps_first_three_of_seven() {
        let summaries = parse_summaries(&script_with_panels(7));
        assert_eq!(
            summaries.as_slice(),
            ["caption 1", "caption 2", "caption 3"]
        );
    }

    #[test]
    fn keeps_first_seen_order() {
        let text = "Summary:\nPanel 2: second\nPanel 1: first\nPanel 3: third\n";
        assert_eq!(
            parse_summaries(text).as_slice(),
            ["second", "first", "third"]
        );
    }

    #[test]
    fn legacy_format_without_marker() {
        let text = "Panel 1: Bear appears\nPanel 2: Bear eats\n";
        assert_eq!(
            parse_summaries(text).as_slice(),
            ["Bear appears", "Bear eats", PLACEHOLDER_SUMMARY]
        );
    }

    #[test]
    fn caption_on_following_line() {
        let text = "Summary:\n**Panel 1:**\nThe bear arrives\nin town.\n\nPanel 2: It leaves.";
        assert_eq!(
            parse_summaries(text).as_slice(),
            ["The bear arrives in town.", "It leaves.", PLACEHOLDER_SUMMARY]
        );
    }

    #[test]
    fn parses_panel_fields() {
        let panels = parse_panels(WELL_FORMED);
        assert_eq!(panels.len(), 3);
        assert_eq!(panels[0].frame.as_deref(), Some("Wide shot of Main Street."));
        assert_eq!(
            panels[0].characters.as_deref(),
            Some("A black bear, a startled baker.")
        );
        assert_eq!(panels[1].setting, None);
        assert_eq!(panels[1].action.as_deref(), Some("The bear grabs a bun."));
        assert_eq!(panels[2].frame, None);
        assert_eq!(
            panels[2].dialogue.as_deref(),
            Some("Officer: \"Back to the woods, buddy.\"")
        );
    }

    #[test]
    fn parse_panels_ignores_summary_and_extra_panels() {
        let mut text = String::new();
        for i in 1..=5 {
            text.push_str(&format!("Panel {i}:\nAction: act {i}\n"));
        }
        text.push_str("Summary:\nPanel 1: nope\n");
        let panels = parse_panels(&text);
        assert_eq!(panels.len(), 3);
        assert_eq!(panels[2].action.as_deref(), Some("act 3"));
    }

    #[test]
    fn parse_panels_without_headers() {
        assert!(parse_panels("Just a paragraph about a bear.").is_empty());
    }

    #[test]
    fn split_summary_marker() {
        let (script, summary) = split_summary("Panel 1: x\nSummary: short");
        assert_eq!(script, "Panel 1: x\n");
        assert_eq!(summary, "Summary: short");

        let (script, summary) = split_summary("no marker");
        assert_eq!(script, "no marker");
        assert_eq!(summary, "no marker");
    }

    #[test]
    fn format_script_strips_markup() {
        let text = "**Panel 1:**  \n\n  + Frame: wide  \n*Action*: run\n";
        assert_eq!(format_script(text), "Panel 1:\nFrame: wide\nAction: run");
    }
}
