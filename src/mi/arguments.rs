//! Command argument utilities.
//!
//! Integer parsing never escapes as an error: a malformed value resolves to
//! the caller's fallback (default value or failed sub-check).

/// Value of a `--name value` pair, or `default` when the flag is absent,
/// dangling, or its value is not an integer.
pub fn int_arg(args: &[String], name: &str, default: i32) -> i32 {
    let Some(pos) = args.iter().position(|arg| arg == name) else {
        return default;
    };
    args.get(pos + 1)
        .and_then(|value| value.parse::<i32>().ok())
        .unwrap_or(default)
}

/// Remove every `--flag value` pair, keeping positional arguments. A lone
/// trailing `--flag` with no value stays.
pub fn strip_flags(args: &mut Vec<String>) {
    let mut i = 0;
    while i < args.len() {
        if args[i].starts_with("--") && i + 1 < args.len() {
            args.drain(i..=i + 1);
        } else {
            i += 1;
        }
    }
}

/// The last two positional arguments as a (low, high) pair.
pub fn indices(args: &[String]) -> Option<(i32, i32)> {
    if args.len() < 2 {
        return None;
    }
    let low = args[args.len() - 2].parse().ok()?;
    let high = args[args.len() - 1].parse().ok()?;
    Some((low, high))
}

/// A `file:line` breakpoint location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointLocation {
    pub file: String,
    pub line: u32,
}

/// Extract the breakpoint location from `break-insert` arguments: flags are
/// stripped, an optional leading `-f` marker is consumed, and the first
/// remaining word must be `file:line` with a line strictly greater than
/// zero. Any other shape is a location-format failure.
pub fn parse_breakpoint(args: &[String]) -> Option<BreakpointLocation> {
    let mut args = args.to_vec();
    strip_flags(&mut args);

    if args.first().map(String::as_str) == Some("-f") {
        args.remove(0);
    }
    let location = args.first()?;

    let (file, line) = location.rsplit_once(':')?;
    let line: u32 = line.parse().ok()?;
    if line == 0 {
        return None;
    }

    Some(BreakpointLocation {
        file: file.to_string(),
        line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_int_arg() {
        assert_eq!(int_arg(&args(&["--thread", "3", "x"]), "--thread", 0), 3);
        // dangling flag yields the default
        assert_eq!(int_arg(&args(&["--thread"]), "--thread", 7), 7);
        assert_eq!(int_arg(&args(&["--frame", "abc"]), "--frame", 2), 2);
        assert_eq!(int_arg(&args(&["x", "y"]), "--thread", 5), 5);
    }

    #[test]
    fn test_strip_flags() {
        struct TestCase {
            input: Vec<String>,
            expected: Vec<String>,
        }
        let cases = vec![
            TestCase {
                input: args(&["--thread", "3", "foo"]),
                expected: args(&["foo"]),
            },
            TestCase {
                input: args(&["a", "--frame", "0", "--thread", "1", "b"]),
                expected: args(&["a", "b"]),
            },
            TestCase {
                input: args(&["a", "--frame"]),
                expected: args(&["a", "--frame"]),
            },
            TestCase {
                input: args(&["--a", "--b", "c"]),
                expected: args(&["c"]),
            },
        ];

        for mut case in cases {
            strip_flags(&mut case.input);
            assert_eq!(case.input, case.expected);
        }
    }

    #[test]
    fn test_indices() {
        assert_eq!(indices(&args(&["0", "10"])), Some((0, 10)));
        assert_eq!(indices(&args(&["var1", "2", "5"])), Some((2, 5)));
        assert_eq!(indices(&args(&["1"])), None);
        assert_eq!(indices(&args(&["1", "x"])), None);
        assert_eq!(indices(&args(&[])), None);
    }

    #[test]
    fn test_parse_breakpoint() {
        struct TestCase {
            input: Vec<String>,
            expected: Option<BreakpointLocation>,
        }
        let cases = vec![
            TestCase {
                input: args(&["a.cs:10"]),
                expected: Some(BreakpointLocation {
                    file: "a.cs".to_string(),
                    line: 10,
                }),
            },
            TestCase {
                input: args(&["-f", "a.cs:10"]),
                expected: Some(BreakpointLocation {
                    file: "a.cs".to_string(),
                    line: 10,
                }),
            },
            TestCase {
                input: args(&["--thread", "1", "b.cs:55"]),
                expected: Some(BreakpointLocation {
                    file: "b.cs".to_string(),
                    line: 55,
                }),
            },
            // the split happens at the last colon
            TestCase {
                input: args(&["c:/proj/a.cs:7"]),
                expected: Some(BreakpointLocation {
                    file: "c:/proj/a.cs".to_string(),
                    line: 7,
                }),
            },
            TestCase {
                input: args(&["a.cs"]),
                expected: None,
            },
            TestCase {
                input: args(&["a.cs:0"]),
                expected: None,
            },
            TestCase {
                input: args(&["a.cs:x"]),
                expected: None,
            },
            TestCase {
                input: args(&["-f"]),
                expected: None,
            },
            TestCase {
                input: args(&[]),
                expected: None,
            },
        ];

        for case in cases {
            assert_eq!(parse_breakpoint(&case.input), case.expected);
        }
    }
}
