//! Prompt templates for the two drafting calls.

/// How many title ideas the model is asked for
pub const TITLE_SUGGESTIONS: usize = 20;

/// A system instruction plus the user message sent with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Remove line breaks and ASCII spaces from a pasted transcript.
/// Other whitespace is kept.
pub fn compact_transcript(transcript: &str) -> String {
    transcript
        .chars()
        .filter(|c| !matches!(c, '\n' | '\r' | ' '))
        .collect()
}

/// Render past titles as a `- title` bullet list, one per line
pub fn format_title_list(titles: &[String]) -> String {
    titles
        .iter()
        .map(|t| format!("- {}", t))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn description_prompt(transcript: &str, exemplar: &str) -> Prompt {
    let exemplar = if exemplar.trim().is_empty() {
        "(no reference description was given; use a clean, conventional layout)"
    } else {
        exemplar
    };

    Prompt {
        system: "Your task is to write the description box of a YouTube video \
                 from the transcript of that video."
            .to_string(),
        user: format!(
            "Write the description box for the YouTube video whose transcript is below.\n\
             Base it on what the video is about, but follow the format used in the \
             past description shown below. Answer in the language of the transcript.\n\
             \n\
             ## Transcript of the video\n\
             \n\
             {transcript}\n\
             \n\
             \n\
             ## Format used in a past description\n\
             \n\
             {exemplar}\n"
        ),
    }
}

pub fn titles_prompt(description: &str, past_titles: &[String]) -> Prompt {
    Prompt {
        system: "Your task is to suggest suitable YouTube video titles \
                 from the content of a video."
            .to_string(),
        user: format!(
            "We are about to publish a YouTube video with the content below. What titles \
             would fit it? Keeping an eye on the funniest lines in the video, suggest about \
             {TITLE_SUGGESTIONS} titles that make people want to click.\n\
             Use the list of past titles below as a reference for wording and format. \
             Answer in the language of the content.\n\
             \n\
             ## Content of the video\n\
             {description}\n\
             \n\
             ## Past titles on this channel\n\
             {}\n",
            format_title_list(past_titles)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compaction_drops_breaks_and_spaces() {
        assert_eq!(
            compact_transcript("hello there\r\nhow are\nyou "),
            "hellotherehowareyou"
        );
        // full-width spaces and tabs are content, not layout
        assert_eq!(compact_transcript("a\u{3000}b\tc"), "a\u{3000}b\tc");
        assert_eq!(compact_transcript(""), "");
    }

    #[test]
    fn title_list_is_bulleted() {
        let titles = vec!["First".to_string(), "Second one".to_string()];
        assert_eq!(format_title_list(&titles), "- First\n- Second one");
        assert_eq!(format_title_list(&[]), "");
    }

    #[test]
    fn description_prompt_embeds_transcript_and_exemplar() {
        let prompt = description_prompt("theTranscript", "Links:\n- shop");
        assert!(prompt.user.contains("## Transcript of the video\n\ntheTranscript\n"));
        assert!(prompt.user.contains("Links:\n- shop"));
    }

    #[test]
    fn description_prompt_without_exemplar() {
        let prompt = description_prompt("t", "  ");
        assert!(prompt.user.contains("no reference description was given"));
    }

    #[test]
    fn titles_prompt_lists_past_titles() {
        let prompt = titles_prompt("A video about cats", &["Cats 1".to_string()]);
        assert!(prompt.user.contains("A video about cats"));
        assert!(prompt.user.contains("## Past titles on this channel\n- Cats 1\n"));
        assert!(prompt.user.contains("about 20 titles"));
    }
}
