//! Terminal rendering for the markdown the models reply with.

use console::Style;
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag};

/// Walks pulldown-cmark events and emits styled terminal text.
pub struct MarkdownRenderer {
    color: bool,
}

#[derive(Default)]
struct RenderState {
    out: String,
    strong: usize,
    emphasis: usize,
    heading: Option<HeadingLevel>,
    code_block: bool,
    /// One entry per open list: next number for ordered lists, `None` for bullets.
    lists: Vec<Option<u64>>,
}

impl MarkdownRenderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Follow the terminal's color support.
    pub fn for_terminal() -> Self {
        Self::new(console::colors_enabled())
    }

    pub fn render(&self, markdown: &str) -> String {
        let mut state = RenderState::default();

        for event in Parser::new(markdown) {
            match event {
                Event::Start(tag) => self.start(&mut state, tag),
                Event::End(tag) => end(&mut state, tag),
                Event::Text(text) => {
                    let styled = self.text_style(&state).apply_to(&*text).to_string();
                    state.out.push_str(&styled);
                }
                Event::Code(code) => {
                    let styled = self.base().yellow().apply_to(&*code).to_string();
                    state.out.push_str(&styled);
                }
                Event::Html(html) => state.out.push_str(&html),
                Event::SoftBreak | Event::HardBreak => state.out.push('\n'),
                Event::Rule => state.out.push_str("────────────────\n\n"),
                Event::TaskListMarker(done) => state.out.push_str(if done { "[x] " } else { "[ ] " }),
                Event::FootnoteReference(name) => state.out.push_str(&format!("[{name}]")),
            }
        }

        state.out.trim_end().to_string()
    }

    fn start(&self, state: &mut RenderState, tag: Tag<'_>) {
        match tag {
            Tag::Heading(level, _, _) => state.heading = Some(level),
            Tag::Strong => state.strong += 1,
            Tag::Emphasis => state.emphasis += 1,
            Tag::CodeBlock(_) => state.code_block = true,
            Tag::List(start) => {
                if !state.lists.is_empty() && !state.out.ends_with('\n') {
                    state.out.push('\n');
                }
                state.lists.push(start);
            }
            Tag::Item => {
                let depth = state.lists.len().saturating_sub(1);
                state.out.push_str(&"  ".repeat(depth));
                let marker = match state.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                let styled = self.base().bold().apply_to(marker).to_string();
                state.out.push_str(&styled);
            }
            _ => {}
        }
    }

    fn base(&self) -> Style {
        Style::new().force_styling(self.color)
    }

    fn text_style(&self, state: &RenderState) -> Style {
        let mut style = self.base();
        if let Some(level) = state.heading {
            style = style.bold().cyan();
            if level == HeadingLevel::H1 {
                style = style.underlined();
            }
        }
        if state.strong > 0 {
            style = style.bold();
        }
        if state.emphasis > 0 {
            style = style.italic();
        }
        if state.code_block {
            style = style.yellow();
        }
        style
    }
}

fn end(state: &mut RenderState, tag: Tag<'_>) {
    match tag {
        Tag::Heading(..) => {
            state.heading = None;
            state.out.push_str("\n\n");
        }
        Tag::Strong => state.strong = state.strong.saturating_sub(1),
        Tag::Emphasis => state.emphasis = state.emphasis.saturating_sub(1),
        Tag::CodeBlock(_) => {
            state.code_block = false;
            state.out.push('\n');
        }
        Tag::Paragraph => {
            state.out.push('\n');
            if state.lists.is_empty() {
                state.out.push('\n');
            }
        }
        Tag::Item => {
            if !state.out.ends_with('\n') {
                state.out.push('\n');
            }
        }
        Tag::List(_) => {
            state.lists.pop();
            if state.lists.is_empty() {
                state.out.push('\n');
            }
        }
        _ => {}
    }
}
