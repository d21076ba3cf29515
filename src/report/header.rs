use crate::report::Palette;
use crate::validator::Outcome;

const MAX_LINE_LENGTH: usize = 80;

/// The boxed location / title / command block above a failure
pub(crate) fn render_header(outcome: &Outcome<'_>, palette: Palette) -> String {
    let testcase = outcome.testcase;
    let location = match outcome.location {
        Some(location) => format!("{location}:{}", testcase.line_number),
        None => format!("Line {}", testcase.line_number),
    };

    let mut sections = vec![section("@", &location, |line| {
        palette.info(line).to_string()
    })];
    if !testcase.title.is_empty() {
        sections.push(section("#", &testcase.title, |line| {
            palette.info(line).to_string()
        }));
    }
    sections.push(section("$", &testcase.shell_expression, |line| {
        palette.command(line).to_string()
    }));

    let outer = palette
        .hint(format!("// {}", "=".repeat(MAX_LINE_LENGTH - 3)))
        .to_string()
        + "\n";
    let inner = palette
        .hint(format!("// {}", "-".repeat(MAX_LINE_LENGTH - 3)))
        .to_string()
        + "\n";

    let mut header = outer.clone();
    header.push_str(&sections.join(&inner));
    header.push_str(&outer);
    header.push('\n');
    header
}

fn section(marker: &str, text: &str, style: impl Fn(&str) -> String) -> String {
    text.split('\n')
        .enumerate()
        .map(|(idx, line)| {
            let marker = if idx == 0 { marker } else { " " };
            format!("// {marker} {}\n", style(line))
        })
        .collect()
}
