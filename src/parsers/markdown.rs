use std::sync::OnceLock;

use crate::config::DocumentConfig;
use crate::config::TestCaseConfig;
use crate::debug;
use crate::expectation::ExpectationMaker;
use crate::parsers::line::is_comment;
use crate::parsers::line::LineParser;
use crate::parsers::Parser;
use crate::testcase::TestCase;
use crate::Error;

/// Languages of fenced code blocks that are test cases
pub const DEFAULT_MARKDOWN_LANGUAGES: &[&str] = &["scrut", "cramdown"];

/// Opening and closing line of a front matter block
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FrontMatter {
    /// `+++`
    Toml,
    /// `---`
    Yaml,
}

impl FrontMatter {
    fn from_delimiter(line: &str) -> Option<Self> {
        match line {
            "+++" => Some(Self::Toml),
            "---" => Some(Self::Yaml),
            _ => None,
        }
    }

    fn delimiter(self) -> &'static str {
        match self {
            Self::Toml => "+++",
            Self::Yaml => "---",
        }
    }

    fn parse(self, raw: &str) -> crate::Result<DocumentConfig> {
        match self {
            Self::Toml => DocumentConfig::from_toml(raw),
            Self::Yaml => DocumentConfig::from_yaml(raw),
        }
    }
}

/// Parser of test cases in fenced code blocks of a Markdown document
///
/// ````markdown
/// # Greeting
///
/// ```scrut {timeout = "3s"}
/// $ echo Hello
/// Hello
/// ```
/// ````
///
/// Code blocks with any other language are skipped.
#[derive(Clone, Debug)]
pub struct MarkdownParser {
    languages: Vec<String>,
}

impl MarkdownParser {
    pub fn new<S: AsRef<str>>(languages: &[S]) -> Self {
        Self {
            languages: languages
                .iter()
                .map(|language| language.as_ref().to_owned())
                .collect(),
        }
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    fn is_test_language(&self, language: &str) -> bool {
        self.languages.iter().any(|accepted| accepted == language)
    }

    fn missing_language(&self, start: usize) -> Error {
        let example = self
            .languages
            .first()
            .map_or(DEFAULT_MARKDOWN_LANGUAGES[0], String::as_str);
        Error::new(format!(
            "Code block starting at line {} is missing language specifier. Use ```{example} to make this block a test, or any other language to skip it.",
            start + 1
        ))
    }
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new(DEFAULT_MARKDOWN_LANGUAGES)
    }
}

impl Parser for MarkdownParser {
    fn parse(&self, text: &str) -> crate::Result<(DocumentConfig, Vec<TestCase>)> {
        debug!(
            "parsing markdown, test languages `{}`",
            self.languages.join("` or `")
        );
        let text = normalize_line_endings::normalized(text.chars()).collect::<String>();
        let mut engine = LineParser::new(ExpectationMaker::new(), false);
        let mut document = DocumentConfig::default();
        let mut paragraph: Vec<&str> = Vec::new();

        for token in Tokens::new(self, &text) {
            match token? {
                Token::FrontMatter {
                    start,
                    format,
                    lines,
                } => {
                    document = format
                        .parse(&lines.join("\n"))
                        .map_err(|err| err.context(format!("line {}", start + 1)))?;
                }
                Token::Line(line) => match extract_title(line) {
                    Some(title) => {
                        paragraph.push(title);
                        engine.set_title(&paragraph.join("\n"));
                    }
                    None => paragraph.clear(),
                },
                Token::Verbatim => {}
                Token::Test {
                    start,
                    config,
                    code,
                } => {
                    let config = match config {
                        Some(raw) => TestCaseConfig::from_inline_table(raw)
                            .map_err(|err| err.context(format!("line {}", start + 1)))?,
                        None => TestCaseConfig::default(),
                    };
                    engine.set_config(
                        config
                            .with_defaults_from(&document.defaults)
                            .with_defaults_from(&TestCaseConfig::default_markdown()),
                    );
                    for (index, line) in &code {
                        engine.add_body(line, *index)?;
                    }
                    engine.end_testcase(code.last().map_or(start, |(index, _)| *index))?;
                    paragraph.clear();
                }
            }
        }

        debug!("found {} test case(s) in markdown", engine.testcases.len());
        Ok((document, engine.testcases))
    }
}

/// Structural pieces of a Markdown document; indices are 0-based
#[derive(Debug, PartialEq, Eq)]
enum Token<'t> {
    FrontMatter {
        start: usize,
        format: FrontMatter,
        lines: Vec<&'t str>,
    },
    Line(&'t str),
    /// Code block of a language that is not tested
    Verbatim,
    Test {
        start: usize,
        config: Option<&'t str>,
        code: Vec<(usize, &'t str)>,
    },
}

struct Tokens<'p, 't> {
    parser: &'p MarkdownParser,
    lines: std::iter::Enumerate<std::str::Lines<'t>>,
    content_started: bool,
}

impl<'p, 't> Tokens<'p, 't> {
    fn new(parser: &'p MarkdownParser, text: &'t str) -> Self {
        Self {
            parser,
            lines: text.lines().enumerate(),
            content_started: false,
        }
    }

    fn front_matter(&mut self, start: usize, format: FrontMatter) -> crate::Result<Token<'t>> {
        let mut lines = Vec::new();
        for (_, line) in self.lines.by_ref() {
            if line == format.delimiter() {
                return Ok(Token::FrontMatter {
                    start,
                    format,
                    lines,
                });
            }
            lines.push(line);
        }
        Err(Error::new(format!(
            "line {}: front matter is not terminated",
            start + 1
        )))
    }

    /// Consume the lines of a block up to and including the closing fence
    fn block(&mut self, start: usize, fence: &str) -> crate::Result<Vec<(usize, &'t str)>> {
        let mut lines = Vec::new();
        for (index, line) in self.lines.by_ref() {
            if line.starts_with(fence) {
                return Ok(lines);
            }
            lines.push((index, line));
        }
        Err(Error::new(format!(
            "line {}: code block is not terminated",
            start + 1
        )))
    }
}

impl<'t> Iterator for Tokens<'_, 't> {
    type Item = crate::Result<Token<'t>>;

    fn next(&mut self) -> Option<Self::Item> {
        let (index, line) = self.lines.next()?;

        if !self.content_started {
            if let Some(format) = FrontMatter::from_delimiter(line) {
                self.content_started = true;
                return Some(self.front_matter(index, format));
            }
        }

        let Some((fence, language, config)) = code_block_start(line) else {
            if !line.trim().is_empty() {
                self.content_started = true;
            }
            return Some(Ok(Token::Line(line)));
        };
        self.content_started = true;

        if language.is_empty() {
            return Some(Err(self.parser.missing_language(index)));
        }
        if !self.parser.is_test_language(language) {
            return Some(self.block(index, fence).map(|_| Token::Verbatim));
        }

        let config = config
            .strip_prefix('{')
            .and_then(|config| config.strip_suffix('}'))
            .filter(|inner| !inner.trim().is_empty())
            .map(|_| config);
        let token = self.block(index, fence).map(|lines| Token::Test {
            start: index,
            config,
            code: lines
                .into_iter()
                .skip_while(|(_, line)| is_comment(line))
                .collect(),
        });
        Some(token)
    }
}

/// Split ```` ```lang {config} ```` into the fence, the language and the
/// config
fn code_block_start(line: &str) -> Option<(&str, &str, &str)> {
    let backticks = line.len() - line.trim_start_matches('`').len();
    if backticks < 3 {
        return None;
    }
    let (fence, rest) = line.split_at(backticks);
    let (language, config) = match rest.find('{') {
        Some(brace) => (rest[..brace].trim(), rest[brace..].trim()),
        None => (rest.trim(), ""),
    };
    Some((fence, language, config))
}

/// Text of a heading or of a paragraph line
fn extract_title(line: &str) -> Option<&str> {
    static PARAGRAPH: OnceLock<regex::Regex> = OnceLock::new();
    static HEADING: OnceLock<regex::Regex> = OnceLock::new();
    let paragraph = PARAGRAPH.get_or_init(|| regex::Regex::new(r"^\p{L}+").unwrap());
    let heading = HEADING.get_or_init(|| regex::Regex::new(r"^#+\s+(.+)$").unwrap());

    let line = line.trim();
    if paragraph.is_match(line) {
        return Some(line);
    }
    heading
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|title| title.as_str())
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;
    use crate::config::OutputStreamControl;

    fn parse(text: &str) -> (DocumentConfig, Vec<TestCase>) {
        MarkdownParser::default().parse(text).unwrap()
    }

    #[test]
    fn minimal_testcase() {
        let text = "
This is a title

```scrut
$ echo hello
hello
```
";
        let (config, testcases) = parse(text);
        assert_eq!(DocumentConfig::default(), config);
        assert_eq!(1, testcases.len());
        let testcase = &testcases[0];
        assert_eq!("This is a title", testcase.title);
        assert_eq!("echo hello", testcase.shell_expression);
        assert_eq!(5, testcase.line_number);
        assert!(!testcase.cram_compat);
        assert_eq!(TestCaseConfig::default_markdown(), testcase.config);
        assert_eq!(1, testcase.expectations.len());
    }

    #[test]
    fn line_number_counts_leading_lines() {
        let text = "\n# Header\n\nSome text\n\nMore text\n\n```scrut\n$ echo\n```\n";
        let (_, testcases) = parse(text);
        assert_eq!(9, testcases[0].line_number);
        assert_eq!("More text", testcases[0].title);
    }

    #[test]
    fn heading_and_paragraph_titles() {
        let text = "# The Heading

```scrut
$ one
```

First line
second line

```cramdown
$ two
```

```scrut
$ three
```
";
        let (_, testcases) = parse(text);
        let titles = testcases
            .iter()
            .map(|testcase| testcase.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(vec!["The Heading", "First line\nsecond line", ""], titles);
    }

    #[test]
    fn other_languages_are_skipped() {
        let text = "Title

```bash
$ not a test
```

```scrut
$ a test
```
";
        let (_, testcases) = parse(text);
        assert_eq!(1, testcases.len());
        assert_eq!("a test", testcases[0].shell_expression);
        assert_eq!("Title", testcases[0].title);
    }

    #[test]
    fn longer_fences_contain_shorter_ones() {
        let text = "````markdown
```scrut
$ echo nested
```
````

````scrut
$ echo outer
```
````
";
        let (_, testcases) = parse(text);
        assert_eq!(1, testcases.len());
        assert_eq!("echo outer", testcases[0].shell_expression);
        assert_eq!(1, testcases[0].expectations.len());
        assert_eq!(b"```", testcases[0].expectations[0].pattern());
    }

    #[test]
    fn comments_and_later_commands() {
        let text = "```scrut
# a comment
$ echo one
$ echo two
[1]
```
";
        let (_, testcases) = parse(text);
        assert_eq!(1, testcases.len());
        assert_eq!(3, testcases[0].line_number);
        assert_eq!(Some(1), testcases[0].exit_code);
        assert_eq!(b"$ echo two", testcases[0].expectations[0].pattern());
    }

    #[test]
    fn front_matter_and_block_config() {
        let text = r#"+++
shell = "/bin/zsh"

[defaults]
timeout = "10s"
environment = { A = "document" }
+++

```scrut {timeout = "3s", output_stream = "stderr"}
$ echo
```

```scrut
$ echo
```
"#;
        let (config, testcases) = parse(text);
        assert_eq!(Some(std::path::PathBuf::from("/bin/zsh")), config.shell);
        assert_eq!(2, testcases.len());

        let first = &testcases[0].config;
        assert_eq!(Some(Duration::from_secs(3)), first.timeout);
        assert_eq!(Some(OutputStreamControl::Stderr), first.output_stream);
        assert_eq!("document", first.environment["A"]);

        let second = &testcases[1].config;
        assert_eq!(Some(Duration::from_secs(10)), second.timeout);
        assert_eq!(Some(OutputStreamControl::Stdout), second.output_stream);
    }

    #[test]
    fn yaml_front_matter() {
        let text = "---\nshell: bash\ndefaults:\n  timeout: 4s\n---\n\n```scrut\n$ echo Hello\nHello\n```\n";
        let (config, testcases) = parse(text);
        assert_eq!(Some(std::path::PathBuf::from("bash")), config.shell);
        assert_eq!(1, testcases.len());
        assert_eq!("", testcases[0].title);
        assert_eq!(8, testcases[0].line_number);
        assert_eq!(Some(Duration::from_secs(4)), testcases[0].config.timeout);
    }

    #[test]
    fn invalid_yaml_front_matter() {
        let err = MarkdownParser::default()
            .parse("---\nnot_a_setting: 1\n---\n")
            .unwrap_err();
        assert!(
            err.to_string()
                .starts_with("line 1: invalid document configuration: "),
            "{err}"
        );
        let err = MarkdownParser::default()
            .parse("---\nshell: bash\n")
            .unwrap_err();
        assert_eq!("line 1: front matter is not terminated", err.to_string());
    }

    #[test]
    fn front_matter_only_at_start() {
        let text = "Text\n+++\n```scrut\n$ echo\n```\n";
        let (config, testcases) = parse(text);
        assert_eq!(DocumentConfig::default(), config);
        assert_eq!(1, testcases.len());
    }

    #[test]
    fn crlf_documents() {
        let text = "Title\r\n\r\n```scrut\r\n$ echo\r\nout\r\n```\r\n";
        let (_, testcases) = parse(text);
        assert_eq!("echo", testcases[0].shell_expression);
        assert_eq!(b"out", testcases[0].expectations[0].pattern());
    }

    #[test]
    fn missing_language() {
        let err = MarkdownParser::default()
            .parse("Text\n\n```\nfoo\n```\n")
            .unwrap_err();
        assert!(
            err.to_string()
                .starts_with("Code block starting at line 3 is missing language specifier"),
            "{err}"
        );
    }

    #[test]
    fn unterminated_block() {
        let err = MarkdownParser::default()
            .parse("```scrut\n$ echo\n")
            .unwrap_err();
        assert_eq!("line 1: code block is not terminated", err.to_string());
    }

    #[test]
    fn invalid_block_config() {
        let err = MarkdownParser::default()
            .parse("\n```scrut {bogus = 1}\n$ echo\n```\n")
            .unwrap_err();
        assert!(
            err.to_string()
                .starts_with("line 2: invalid test case configuration"),
            "{err}"
        );
    }

    #[test]
    fn custom_languages() {
        let parser = MarkdownParser::new(&["sh-test"]);
        let (_, testcases) = parser
            .parse("```sh-test\n$ echo\n```\n\n```scrut\n$ skipped\n```\n")
            .unwrap();
        assert_eq!(1, testcases.len());
        assert_eq!(["sh-test".to_owned()], parser.languages());
    }

    #[test]
    fn code_block_starts() {
        assert_eq!(None, code_block_start("``x"));
        assert_eq!(Some(("```", "", "")), code_block_start("```"));
        assert_eq!(Some(("```", "scrut", "")), code_block_start("```scrut"));
        assert_eq!(
            Some(("````", "scrut", "{a = 1}")),
            code_block_start("````scrut {a = 1}")
        );
    }
}
