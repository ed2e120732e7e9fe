pub mod chunking;
pub mod golden;

pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    use std::fmt::Write;

    fn line(lines: &[String], i: usize) -> &str {
        lines.get(i).map_or("<missing>", String::as_str)
    }

    let max = expected.len().max(actual.len());
    let mismatch = (0..max).find(|&i| line(expected, i) != line(actual, i));

    let mut out = String::new();
    if let Some(i) = mismatch {
        let start = i.saturating_sub(2);
        let end = (i + 3).min(max);
        let _ = writeln!(
            &mut out,
            "first mismatch at line {} (showing {}..={}):",
            i + 1,
            start + 1,
            end
        );
        for idx in start..end {
            let marker = if idx == i { ">" } else { " " };
            let n = idx + 1;
            let _ = writeln!(&mut out, "{marker} {n:>4}  expected: {}", line(expected, idx));
            let _ = writeln!(&mut out, "{marker} {n:>4}    actual: {}", line(actual, idx));
        }
    }
    let _ = writeln!(
        &mut out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}

/// Positive integer from the environment, or `default`.
pub fn env_usize(name: &str, default: usize) -> usize {
    if let Ok(value) = std::env::var(name)
        && let Ok(parsed) = value.parse::<usize>()
        && parsed > 0
    {
        return parsed;
    }
    default
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_points_at_first_mismatch() {
        let expected = vec!["a".to_string(), "b".to_string()];
        let actual = vec!["a".to_string(), "c".to_string(), "d".to_string()];
        let report = diff_lines(&expected, &actual);
        assert!(report.starts_with("first mismatch at line 2"), "{report}");
        assert!(report.contains("expected 2 lines, actual 3 lines"));
    }
}
