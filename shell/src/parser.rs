use crate::command::CommandLine;

/// Characters that separate command stages on one line.
const STAGE_SEPARATORS: [char; 2] = ['|', ';'];

/// Splits `input` on every single space character.
///
/// Runs of spaces are not collapsed: each extra space yields an empty token,
/// and a leading or trailing space yields an empty first or last token.
/// Tabs are ordinary characters.
pub fn split_spaces(input: &str) -> Vec<String> {
    input.split(' ').map(str::to_owned).collect()
}

/// Splits a raw input line into command stages on `|` and `;` and tokenizes
/// each stage on its own.
///
/// Stages are trimmed before tokenizing and blank stages are dropped, so an
/// empty line yields no commands at all. Stages run one after another; `|`
/// does not connect their streams.
pub fn parse_line(line: &str) -> Vec<CommandLine> {
    line.split(STAGE_SEPARATORS)
        .map(str::trim)
        .filter(|stage| !stage.is_empty())
        .map(|stage| CommandLine::new(split_spaces(stage)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(line: &CommandLine) -> Vec<&str> {
        line.tokens().iter().map(String::as_str).collect()
    }

    #[test]
    fn test_split_spaces_keeps_empty_tokens() {
        assert_eq!(split_spaces("ls -l /tmp"), ["ls", "-l", "/tmp"]);
        assert_eq!(split_spaces("a  b"), ["a", "", "b"]);
        assert_eq!(split_spaces(" a "), ["", "a", ""]);
        assert_eq!(split_spaces(""), [""]);
    }

    #[test]
    fn test_split_spaces_does_not_split_tabs() {
        assert_eq!(split_spaces("a\tb c"), ["a\tb", "c"]);
    }

    #[test]
    fn test_parse_line_single_command() {
        let stages = parse_line("echo hello world");
        assert_eq!(stages.len(), 1);
        assert_eq!(tokens(&stages[0]), ["echo", "hello", "world"]);
    }

    #[test]
    fn test_parse_line_tokenizes_each_stage_separately() {
        let stages = parse_line("echo one | echo two;cd /tmp");
        assert_eq!(stages.len(), 3);
        assert_eq!(tokens(&stages[0]), ["echo", "one"]);
        assert_eq!(tokens(&stages[1]), ["echo", "two"]);
        assert_eq!(tokens(&stages[2]), ["cd", "/tmp"]);
    }

    #[test]
    fn test_parse_line_drops_blank_stages() {
        assert!(parse_line("").is_empty());
        assert!(parse_line("   ").is_empty());
        assert!(parse_line(" ; | ").is_empty());

        let stages = parse_line("exit;;");
        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].name(), Some("exit"));
    }

    #[test]
    fn test_parse_line_keeps_interior_empty_tokens() {
        let stages = parse_line("cp  a b");
        assert_eq!(tokens(&stages[0]), ["cp", "", "a", "b"]);
    }
}
