//! Prompt text for the summarize and verify calls.

use crate::config::PromptConfig;

/// Instructions for the first call, which receives the video itself.
pub fn summarize_prompt(config: &PromptConfig, title: &str) -> String {
    format!(
        r#"You are an expert in {topic}.

You are given a YouTube video from a {topic} course recorded with {recorded_with}.

Summarize the video as follows:
1. Split the content into chapters by topic.
2. For each chapter, list the key concepts and recommended practices as short bullet points.
   - Include relevant code snippets.
   - Do not mention timestamps or specific moments in the video.
3. Reply with Markdown only, in exactly this structure and with nothing else:

# {title}

## Summary
(A short overview of the video.)

## Key Points
(The chapters with their bullet points and code snippets.)
"#,
        topic = config.topic,
        recorded_with = config.recorded_with,
        title = title,
    )
}

/// Instructions for the second call, which checks the summary against the
/// reference documents.
pub fn verify_prompt(config: &PromptConfig, title: &str, summary: &str) -> String {
    format!(
        r#"You are a technical editor and an expert in {topic}.

Below is a Markdown summary of a {topic} course recorded with {recorded_with}. The attached documents are the {reference_label}, each introduced by a numbered label such as [1].

Check every factual key point under "Key Points" against the attached documents:
1. Decide whether the point is still accurate as of {latest_version}.
   - Only use the sections of the documents that cover language changes, tooling and the standard library.
   - Skip opinions, philosophy and general design advice.
2. For each point that is no longer accurate:
   - Explain briefly what changed.
   - Cite the first version that introduced the change with a numbered marker like [1]. Cite one version per change.
   - Give updated code when the original code is outdated.
3. Use only the attached documents, not prior knowledge.
4. Reply with Markdown only, in exactly this structure and with nothing else:

# {title}

## Summary
(The summary given below, unchanged.)

## Key Points
(The key points given below, unchanged.)

## What's New
(The changes found, each cited with a numbered marker.)

## Updated Code Snippets
(Updated versions of outdated snippets. Leave this section out if none are needed.)

## Citations
(The cited documents, e.g. "- [1] {reference_label} for ...".)

Summary to check:

{summary}
"#,
        topic = config.topic,
        recorded_with = config.recorded_with,
        reference_label = config.reference_label,
        latest_version = config.latest_version,
        title = title,
        summary = summary,
    )
}
