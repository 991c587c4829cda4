//! Instruction templates for the planner and the synthesis stage
//!
//! Templates are rendered with `tera`. Every template takes the user's
//! prompt as `prompt`; the others add `summary`, `evidence` and `datetime`.

use crate::error::PipelineResult;
use tera::{Context, Tera};

pub const DECOMPOSE_TEMPLATE: &str = "decompose";
pub const PLAN_TEMPLATE: &str = "plan";
pub const EXPAND_TEMPLATE: &str = "expand";
pub const SUMMARIZE_TEMPLATE: &str = "summarize";

/// Separator between task prompts in a decomposition
pub const TASK_SEPARATOR: &str = "&&";

/// Format of the `datetime` variable handed to the summarize template
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DECOMPOSE: &str = r#"You are a search task decomposition assistant. Your job is to split a user prompt that may contain several search requests into independent search task prompts.

Task
The user prompt is: "{{ prompt }}"
It may contain one or more search requests, each about a different subject (a person, a group, a thing, ...). Identify every independent subject and write one search task prompt for each. When the user asks for several aspects of the same subject (introduction, members, albums, ...), merge those aspects into that subject's single task prompt.

Output format
- Each task prompt reads: "Search for [specific scope] of [subject]".
- When the user gives no specific scope, use "information" as the scope.
- When there are several tasks, join the task prompts with "&&".
- When there is only one task, output that task prompt without "&&".
- Output nothing but the formatted task prompt string, with no explanation.
- Write the output in the language of the user prompt.

Examples
User: Search for information about the KPOP group IVE, their introduction, members, albums and songs. Also search for the KPOP group ATEEZ, their members, albums and songs.
Output: Search for the introduction, members, albums and songs of the KPOP group IVE&&Search for the members, albums and songs of the KPOP group ATEEZ

User: Search for information about the KPOP group IVE
Output: Search for information of the KPOP group IVE

Notes
- Read the prompt carefully and find every distinct subject.
- One subject yields exactly one task, however many times it is described.
- Keep the user's own wording where possible.
- Follow the "&&" separator format strictly."#;

const PLAN: &str = r#"You are a search keyword assistant. You analyse the intent of a query and extract precise web search keywords.

Task
From the user prompt "{{ prompt }}", determine the core subject the user wants to search for and list web search keywords.

Keyword rules
- Main keyword: the core concept of the search subject. Always present.
- Auxiliary keywords: specific content the user explicitly asks about around the main keyword (definitions, types, uses, principles, history, formulas, procedures, ...).
- If the user only names the core subject without asking for specific content, output the main keyword only.
- If the user explicitly asks for specific content, output the main keyword followed by at most 3 auxiliary keywords.
- Write keywords in the language of the user prompt.

Output format
- Output only the keywords, with no explanation or extra text.
- Separate keywords with a single space " ".
- Join the words of a multi-word keyword with "+" (for example artificial+intelligence) so it is searched as one unit.
- The first keyword is always the main keyword; auxiliary keywords follow it (at most 3).

Examples
User: What is trigonometry? (no specific content requested)
Output: trigonometric+functions
User: I want to learn about the definitions and formulas of trigonometry (specific content requested)
Output: trigonometric+functions definitions formulas

Follow this format strictly."#;

const EXPAND: &str = r#"You are a search assistant that analyses search intent and generates additional auxiliary search keywords.

Task
Given the user prompt "{{ prompt }}" and this summary of search results for related keywords:
"{{ summary }}"
first decide the core type of what the user is looking for (a definition, tool usage, historical background, technical principle, ...), then derive further auxiliary keywords of that type that help the user search more precisely and in more depth.

Output format
- Output between 1 and 3 auxiliary keywords.
- Output only the keywords, with no other text or explanation.
- Separate keywords with a single space " ".
- Join the words of a multi-word keyword with "+", never with spaces or other separators.
- Write keywords in the language of the user prompt.

Example
prompt: What is trigonometry?
summary: Trigonometric functions relate the angles of a right triangle to ratios of its side lengths. They are basic tools for studying triangles, circles, waves and periodic phenomena.
Output: definitions purposes general+formulas

Follow this format strictly."#;

const SUMMARIZE: &str = r#"You are a research assistant. Using the user prompt "{{ prompt }}", the material gathered from web searches below, and the current date and time "{{ datetime }}", answer the prompt accurately and concisely.

Material:
"{{ evidence }}"

Instructions
- Understand the intent: decide whether the user wants a short list of key points, a detailed analysis, the answer to a specific question, or a particular format such as a table or a list.
- Stay strictly within the material: every statement must come from the material above. Do not add personal knowledge, guesses or outside information. When the material is insufficient, say so and give the partial answer it supports.
- Follow the requested style, length and format. When none is requested, organise the answer as clear bullet points.
- Answer the user directly. Do not add phrases such as "according to the search results".
- Include related information from the material that goes beyond the literal question when it concerns the same subject; leave out anything unrelated. Be clear and detailed, but never invent content.
- Answer in the language of the user prompt.
- Stay objective: state facts without opinions.

Start now."#;

/// Registry of the rendered instruction templates
pub struct PromptLibrary {
    tera: Tera,
}

impl PromptLibrary {
    pub fn new() -> PipelineResult<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (DECOMPOSE_TEMPLATE, DECOMPOSE),
            (PLAN_TEMPLATE, PLAN),
            (EXPAND_TEMPLATE, EXPAND),
            (SUMMARIZE_TEMPLATE, SUMMARIZE),
        ])?;
        Ok(Self { tera })
    }

    pub fn decompose(&self, prompt: &str) -> PipelineResult<String> {
        let mut context = Context::new();
        context.insert("prompt", prompt);
        Ok(self.tera.render(DECOMPOSE_TEMPLATE, &context)?)
    }

    pub fn plan(&self, prompt: &str) -> PipelineResult<String> {
        let mut context = Context::new();
        context.insert("prompt", prompt);
        Ok(self.tera.render(PLAN_TEMPLATE, &context)?)
    }

    pub fn expand(&self, prompt: &str, summary: &str) -> PipelineResult<String> {
        let mut context = Context::new();
        context.insert("prompt", prompt);
        context.insert("summary", summary);
        Ok(self.tera.render(EXPAND_TEMPLATE, &context)?)
    }

    pub fn summarize(&self, prompt: &str, evidence: &str, datetime: &str) -> PipelineResult<String> {
        let mut context = Context::new();
        context.insert("prompt", prompt);
        context.insert("evidence", evidence);
        context.insert("datetime", datetime);
        Ok(self.tera.render(SUMMARIZE_TEMPLATE, &context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_render_variables() {
        let prompts = PromptLibrary::new().unwrap();

        let plan = prompts.plan("What is trigonometry?").unwrap();
        assert!(plan.contains("\"What is trigonometry?\""));

        let expand = prompts.expand("Rust", "A systems language").unwrap();
        assert!(expand.contains("\"Rust\""));
        assert!(expand.contains("A systems language"));

        let summary = prompts
            .summarize("Who won?", "Team A won 3-1", "2026-01-02 03:04:05")
            .unwrap();
        assert!(summary.contains("Team A won 3-1"));
        assert!(summary.contains("2026-01-02 03:04:05"));
    }

    #[test]
    fn test_prompt_is_not_html_escaped() {
        let prompts = PromptLibrary::new().unwrap();
        let rendered = prompts.decompose("IVE & ATEEZ <albums>").unwrap();
        assert!(rendered.contains("IVE & ATEEZ <albums>"));
    }
}
