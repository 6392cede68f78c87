use super::outcome::{Outcome, Step};
use crate::util::cli::{colors, TextWrapper};
use colored::Colorize as _;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Label {
    Victory,
    Warning,
}

impl Label {
    fn title_symbol(self) -> &'static str {
        match self {
            Self::Victory => "✔",
            Self::Warning => "!",
        }
    }

    fn item_symbol(self) -> &'static str {
        match self {
            Self::Victory => "•",
            Self::Warning => "✗",
        }
    }

    fn color(self) -> colored::Color {
        match self {
            Self::Victory => colors::VICTORY,
            Self::Warning => colors::WARNING,
        }
    }

    fn format_title(self, title: &str) -> colored::ColoredString {
        format!("[{}] {}", self.title_symbol(), title)
            .color(self.color())
            .bold()
    }

    fn format_item(self, msg: &str) -> colored::ColoredString {
        let item = format!("{} {}", self.item_symbol(), msg);
        match self {
            Self::Victory => item.normal(),
            Self::Warning => item.color(self.color()).bold(),
        }
    }
}

#[derive(Debug)]
struct Item {
    label: Label,
    msg: String,
}

impl Item {
    fn new(step: Step, outcome: &Outcome) -> Self {
        let label = if outcome.needs_attention() {
            Label::Warning
        } else {
            Label::Victory
        };
        Self {
            label,
            msg: format!("{}: {}", step, outcome),
        }
    }
}

/// What a run did, one item per step.
#[derive(Debug)]
pub struct Summary {
    title: String,
    items: Vec<Item>,
}

impl Summary {
    pub fn new<'a>(
        title: impl ToString,
        steps: impl IntoIterator<Item = &'a (Step, Outcome)>,
    ) -> Self {
        Self {
            title: title.to_string(),
            items: steps
                .into_iter()
                .map(|(step, outcome)| Item::new(*step, outcome))
                .collect(),
        }
    }

    fn label(&self) -> Label {
        if self.items.iter().any(|item| item.label == Label::Warning) {
            Label::Warning
        } else {
            Label::Victory
        }
    }

    pub fn print(&self, wrapper: &TextWrapper) {
        static BULLET_INDENT: &str = "    ";
        static HANGING_INDENT: &str = "      ";
        let bullet_wrapper = wrapper
            .clone()
            .initial_indent(BULLET_INDENT)
            .subsequent_indent(HANGING_INDENT);
        // `to_string` keeps the color; otherwise `fill` only sees the `str`.
        println!(
            "\n{}",
            wrapper.fill(&self.label().format_title(&self.title).to_string())
        );
        for item in &self.items {
            println!(
                "{}",
                bullet_wrapper.fill(&item.label.format_item(&item.msg).to_string())
            );
        }
    }
}
