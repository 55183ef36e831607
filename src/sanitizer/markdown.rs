use regex::Regex;
use scraper::{ElementRef, Html, node::Node};
use std::sync::LazyLock;

static BLANK_LINES_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static INLINE_SPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Structural HTML to Markdown conversion: headings, emphasis, links,
/// images, nested lists, blockquotes and fenced code blocks.
pub fn to_markdown(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut renderer = Renderer::default();
    renderer.render_children(fragment.root_element());

    let trimmed_lines: Vec<&str> = renderer.out.lines().map(str::trim_end).collect();
    BLANK_LINES_REGEX
        .replace_all(&trimmed_lines.join("\n"), "\n\n")
        .trim()
        .to_string()
}

#[derive(Default)]
struct Renderer {
    out: String,
    // None = bullet list, Some(n) = ordered list at item n
    lists: Vec<Option<usize>>,
}

impl Renderer {
    fn render_children(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.push_text(text),
                Node::Element(_) => {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        self.render_element(child_el);
                    }
                }
                _ => {}
            }
        }
    }

    fn render_element(&mut self, element: ElementRef<'_>) {
        let name = element.value().name();
        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse::<usize>().unwrap_or(1);
                let inner = self.render_nested(element);
                self.block_break();
                self.out.push_str(&"#".repeat(level));
                self.out.push(' ');
                self.out.push_str(inner.trim());
                self.block_break();
            }
            "p" | "div" | "section" | "article" | "figure" | "figcaption" | "table" => {
                if self.lists.is_empty() {
                    self.block_break();
                    self.render_children(element);
                    self.block_break();
                } else {
                    self.render_children(element);
                }
            }
            "tr" => {
                self.line_break();
                self.render_children(element);
            }
            "th" | "td" => {
                self.out.push_str("| ");
                self.render_children(element);
                self.out.push(' ');
            }
            "br" => self.line_break(),
            "hr" => {
                self.block_break();
                self.out.push_str("---");
                self.block_break();
            }
            "strong" | "b" => self.wrap_inline(element, "**"),
            "em" | "i" => self.wrap_inline(element, "_"),
            "code" => self.wrap_inline(element, "`"),
            "pre" => {
                let code: String = element.text().collect();
                self.block_break();
                self.out.push_str("```\n");
                self.out.push_str(code.trim_matches('\n'));
                self.out.push_str("\n```");
                self.block_break();
            }
            "a" => {
                let inner = self.render_nested(element);
                match element.value().attr("href") {
                    Some(href) => {
                        self.out.push_str(&format!("[{}]({})", inner.trim(), href));
                    }
                    None => self.out.push_str(&inner),
                }
            }
            "img" => {
                if let Some(src) = element.value().attr("src") {
                    let alt = element.value().attr("alt").unwrap_or_default();
                    self.out.push_str(&format!("![{alt}]({src})"));
                }
            }
            "ul" | "ol" => {
                let nested = !self.lists.is_empty();
                if nested {
                    self.line_break();
                } else {
                    self.block_break();
                }
                self.lists.push((name == "ol").then_some(1));
                self.render_children(element);
                self.lists.pop();
                if !nested {
                    self.block_break();
                }
            }
            "li" => self.render_list_item(element),
            "blockquote" => {
                let inner = self.render_nested(element);
                self.block_break();
                let quoted: Vec<String> = inner
                    .trim()
                    .lines()
                    .map(|line| format!("> {}", line.trim()).trim_end().to_string())
                    .collect();
                self.out.push_str(&quoted.join("\n"));
                self.block_break();
            }
            "script" | "style" | "noscript" | "template" => {}
            _ => self.render_children(element),
        }
    }

    fn render_list_item(&mut self, element: ElementRef<'_>) {
        self.line_break();
        let depth = self.lists.len().saturating_sub(1);
        self.out.push_str(&"  ".repeat(depth));
        let marker = match self.lists.last_mut() {
            Some(Some(n)) => {
                let marker = format!("{n}. ");
                *n += 1;
                marker
            }
            _ => "- ".to_string(),
        };
        self.out.push_str(&marker);
        self.render_children(element);
    }

    fn wrap_inline(&mut self, element: ElementRef<'_>, marker: &str) {
        let inner = self.render_nested(element);
        let inner = inner.trim();
        if inner.is_empty() {
            return;
        }
        self.out.push_str(marker);
        self.out.push_str(inner);
        self.out.push_str(marker);
    }

    // Render into a scratch buffer and hand the text back.
    fn render_nested(&mut self, element: ElementRef<'_>) -> String {
        let saved = std::mem::take(&mut self.out);
        self.render_children(element);
        std::mem::replace(&mut self.out, saved)
    }

    fn push_text(&mut self, text: &str) {
        let collapsed = INLINE_SPACE_REGEX.replace_all(text, " ");
        if self.out.is_empty() || self.out.ends_with(char::is_whitespace) {
            self.out.push_str(collapsed.trim_start());
        } else {
            self.out.push_str(&collapsed);
        }
    }

    fn line_break(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn block_break(&mut self) {
        if self.out.is_empty() {
            return;
        }
        while !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }
}
