use colored::*;
use sprig::api::{CmdMessage, MessageLevel};
use sprig::commands::helpers::title;
use sprig::config::SprigConfig;
use sprig::error::Result;
use sprig::hierarchy::TreeNode;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const INDENT: &str = "  ";

pub fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
        }
    }
}

pub fn print_json(nodes: &[TreeNode]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(nodes)?);
    Ok(())
}

pub fn print_tree(nodes: &[TreeNode], config: &SprigConfig) {
    if nodes.is_empty() {
        println!("No records yet. Add one with `sprig add <title>`.");
        return;
    }
    for node in nodes {
        print_node(node, config);
    }
}

fn print_node(node: &TreeNode, config: &SprigConfig) {
    let row = Row::new(node, config);
    let (left, padding) = row.layout(LINE_WIDTH);

    let label = row.label.yellow();
    let rest = &left[row.indent.len() + row.label.len()..];
    println!(
        "{}{}{}{}{}",
        row.indent,
        label,
        rest,
        " ".repeat(padding),
        row.id.dimmed()
    );

    for child in &node.children {
        print_node(child, config);
    }
}

/// The plain-text parts of one tree line.
struct Row {
    indent: String,
    label: String,
    title: String,
    id: String,
}

impl Row {
    fn new(node: &TreeNode, config: &SprigConfig) -> Self {
        let label = node
            .record
            .label(&config.order_field)
            .map(|label| format!("{}. ", label))
            .unwrap_or_default();
        Self {
            indent: INDENT.repeat(node.depth),
            label,
            title: title(&node.record, config),
            id: format!("#{}", node.record.id),
        }
    }

    /// Left part (indent, label and title, truncated) and the padding that
    /// right-aligns the id within `width`.
    fn layout(&self, width: usize) -> (String, usize) {
        let fixed = self.indent.width() + self.label.width() + self.id.width() + 1;
        let available = width.saturating_sub(fixed);
        let title = truncate_to_width(&self.title, available);
        let left = format!("{}{}{}", self.indent, self.label, title);
        let padding = width.saturating_sub(left.width() + self.id.width()).max(1);
        (left, padding)
    }
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    result.push('…');
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig::config::DeletePolicy;
    use sprig::hierarchy::Affordances;
    use sprig::model::{Record, RecordId};

    fn node(id: u64, depth: usize, name: &str, position: Option<&str>) -> TreeNode {
        let mut record = Record::new(RecordId(id), None).with_field("name", name);
        record.set_label("position", position.map(str::to_string));
        TreeNode {
            record,
            depth,
            actions: Affordances::default(),
            children: Vec::new(),
        }
    }

    #[test]
    fn truncates_wide_titles() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");
        assert_eq!(truncate_to_width("日本語テキスト", 6), "日本…");
    }

    #[test]
    fn row_aligns_id_to_the_right() {
        let config = SprigConfig {
            delete_policy: DeletePolicy::Reject,
            ..Default::default()
        };
        let row = Row::new(&node(12, 2, "Outline", Some("1.2")), &config);
        let (left, padding) = row.layout(40);

        assert_eq!(left, "    1.2. Outline");
        assert_eq!(left.width() + padding + row.id.width(), 40);
    }

    #[test]
    fn roots_have_no_label() {
        let row = Row::new(&node(1, 0, "Plan", None), &SprigConfig::default());
        let (left, _) = row.layout(40);
        assert_eq!(left, "Plan");
        assert_eq!(row.id, "#1");
    }

    #[test]
    fn long_title_keeps_the_id_visible() {
        let long = "x".repeat(200);
        let row = Row::new(&node(7, 1, &long, Some("3")), &SprigConfig::default());
        let (left, padding) = row.layout(LINE_WIDTH);
        assert!(left.ends_with('…'));
        assert!(left.width() + padding + row.id.width() <= LINE_WIDTH);
    }
}
