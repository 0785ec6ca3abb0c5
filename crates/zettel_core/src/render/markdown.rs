//! pulldown-cmark based renderer with hook overrides.

use crate::text::{prepare_for_render, NOTE_REF_SCHEME};
use once_cell::sync::Lazy;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

static DEFAULT_RENDERER: Lazy<MarkdownRenderer> = Lazy::new(MarkdownRenderer::default);

/// Rendering overrides applied on top of plain CommonMark output.
#[derive(Debug, Clone, Copy)]
pub struct RenderHooks {
    /// HTML emitted in place of a `[ ]` / `[x]` list item marker.
    pub task_item: fn(checked: bool) -> String,
    /// Opening tag for every table.
    pub table_open: fn() -> String,
    /// Maps a referenced note id to the link target.
    pub note_link: fn(note_id: &str) -> String,
}

impl Default for RenderHooks {
    fn default() -> Self {
        Self {
            task_item: disabled_checkbox,
            table_open: styled_table_open,
            note_link: note_index_url,
        }
    }
}

fn disabled_checkbox(checked: bool) -> String {
    if checked {
        "<input type=\"checkbox\" disabled checked> ".to_string()
    } else {
        "<input type=\"checkbox\" disabled> ".to_string()
    }
}

fn styled_table_open() -> String {
    "<table class=\"table\">".to_string()
}

fn note_index_url(note_id: &str) -> String {
    format!("/index?id={note_id}")
}

/// Markdown renderer for the note dialect (tables, task lists, strikethrough).
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: Options,
    hooks: RenderHooks,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new(RenderHooks::default())
    }
}

impl MarkdownRenderer {
    pub fn new(hooks: RenderHooks) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        Self { options, hooks }
    }

    pub fn hooks(&self) -> &RenderHooks {
        &self.hooks
    }

    /// Renders markdown `text` to an HTML fragment.
    pub fn render(&self, text: &str) -> String {
        let mut events: Vec<Event<'_>> = Vec::new();
        let mut table: Vec<Event<'_>> = Vec::new();
        let mut in_table = false;

        for event in Parser::new_ext(text, self.options) {
            let event = self.apply_inline_hooks(event);
            if matches!(event, Event::Start(Tag::Table(_))) {
                in_table = true;
                table.push(event);
            } else if matches!(event, Event::End(TagEnd::Table)) {
                table.push(event);
                in_table = false;
                let rendered = self.render_table(std::mem::take(&mut table));
                events.push(Event::Html(CowStr::from(rendered)));
            } else if in_table {
                table.push(event);
            } else {
                events.push(event);
            }
        }

        let mut output = String::with_capacity(text.len() + text.len() / 2);
        html::push_html(&mut output, events.into_iter());
        output
    }

    fn apply_inline_hooks<'a>(&self, event: Event<'a>) -> Event<'a> {
        match event {
            Event::TaskListMarker(checked) => {
                Event::InlineHtml(CowStr::from((self.hooks.task_item)(checked)))
            }
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => {
                let dest_url = match dest_url.strip_prefix(NOTE_REF_SCHEME) {
                    Some(note_id) => CowStr::from((self.hooks.note_link)(note_id)),
                    None => dest_url,
                };
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                })
            }
            other => other,
        }
    }

    // Tables are rendered in isolation so the default `<table>` opener can be
    // swapped without losing column alignment handling.
    fn render_table(&self, events: Vec<Event<'_>>) -> String {
        let mut rendered = String::new();
        html::push_html(&mut rendered, events.into_iter());
        rendered.replacen("<table>", &(self.hooks.table_open)(), 1)
    }
}

/// Renders already prepared text with the default hooks.
pub fn render(plain_body: &str) -> String {
    DEFAULT_RENDERER.render(plain_body)
}

/// Renders a raw note body: tag line stripped, cross-references linked.
pub fn render_note(body: &str) -> String {
    render(&prepare_for_render(body))
}

#[cfg(test)]
mod tests {
    use super::{render, render_note, MarkdownRenderer, RenderHooks};

    #[test]
    fn task_items_render_as_disabled_checkboxes() {
        let html = render("- [ ] open\n- [x] done\n- plain");
        assert!(html.contains("<li><input type=\"checkbox\" disabled> open</li>"));
        assert!(html.contains("<li><input type=\"checkbox\" disabled checked> done</li>"));
        assert!(html.contains("<li>plain</li>"));
    }

    #[test]
    fn tables_get_presentational_class() {
        let html = render("| a | b |\n|---|--:|\n| 1 | 2 |");
        assert!(html.starts_with("<table class=\"table\">"));
        assert!(html.contains("<th>a</th>"));
        assert!(html.contains("<td style=\"text-align: right\">2</td>"));
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn note_references_link_to_index() {
        let html = render_note("see #42 for details\n#tag");
        assert!(html.contains("<a href=\"/index?id=42\">42</a>"));
        assert!(!html.contains("tag"));
    }

    #[test]
    fn final_line_references_stay_plain_text() {
        let html = render_note("see #42\nrelated #7");
        assert!(html.contains("<a href=\"/index?id=42\">42</a>"));
        assert!(html.contains("related #7"));
        assert!(!html.contains("/index?id=7"));
    }

    #[test]
    fn custom_hooks_are_applied() {
        let renderer = MarkdownRenderer::new(RenderHooks {
            task_item: |checked| if checked { "[done] ".into() } else { "[todo] ".into() },
            table_open: || "<table class=\"grid\">".into(),
            note_link: |id| format!("/notes/{id}"),
        });
        let html = renderer.render("- [x] a\n\n[1](note-ref:1)\n\n|h|\n|-|\n|c|");
        assert!(html.contains("[done] a"));
        assert!(html.contains("href=\"/notes/1\""));
        assert!(html.contains("<table class=\"grid\">"));
    }

    #[test]
    fn malformed_markdown_degrades_to_text() {
        let html = render("**unclosed [link](\n<p");
        assert!(html.contains("unclosed"));
        assert_eq!(render(""), "");
    }
}
